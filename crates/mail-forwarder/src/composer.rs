//! Serialization of the rewritten message

use tokio::io::AsyncRead;

use crate::headers::HeaderSet;

/// One complete message in transport form: headers, CRLF, body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage(Vec<u8>);

impl RawMessage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Write `headers` then copy `body` byte for byte
pub async fn compose<B>(headers: &HeaderSet, mut body: B) -> std::io::Result<RawMessage>
where
    B: AsyncRead + Unpin,
{
    let mut message = Vec::new();

    for header in headers {
        message.extend_from_slice(header.name.as_bytes());
        message.extend_from_slice(b": ");
        message.extend_from_slice(&header.value);
        message.extend_from_slice(b"\r\n");
    }
    message.extend_from_slice(b"\r\n");

    tokio::io::copy(&mut body, &mut message).await?;

    Ok(RawMessage(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_headers_then_blank_line_then_body() {
        let mut headers = HeaderSet::new();
        headers.append("Subject", "Hello");
        headers.append("From", "relay@example.com");

        let body: &[u8] = b"Hi there.\r\n";
        let raw = compose(&headers, body).await.unwrap();

        assert_eq!(
            String::from_utf8(raw.into_bytes()).unwrap(),
            "Subject: Hello\r\nFrom: relay@example.com\r\n\r\nHi there.\r\n"
        );
    }

    #[tokio::test]
    async fn test_binary_body_is_copied_unchanged() {
        let headers = HeaderSet::new();
        let body: Vec<u8> = (0u8..=255).collect();

        let raw = compose(&headers, body.as_slice()).await.unwrap();

        assert_eq!(&raw.as_bytes()[..2], b"\r\n");
        assert_eq!(&raw.as_bytes()[2..], body.as_slice());
    }

    #[tokio::test]
    async fn test_empty_header_value_still_emits_line() {
        let mut headers = HeaderSet::new();
        headers.append("Reply-To", "");

        let raw = compose(&headers, tokio::io::empty()).await.unwrap();
        assert!(!raw.is_empty());
        assert_eq!(raw.as_bytes(), b"Reply-To: \r\n\r\n");
    }

    #[tokio::test]
    async fn test_eight_bit_header_bytes_are_written_unchanged() {
        let mut headers = HeaderSet::new();
        headers.append("Subject", b"Caf\xe9 cr\xe8me".to_vec());
        headers.append("Reply-To", b"\"Ren\xe9e\" <renee@x.com>".to_vec());

        let raw = compose(&headers, &b"hi"[..]).await.unwrap();
        assert_eq!(
            raw.as_bytes(),
            b"Subject: Caf\xe9 cr\xe8me\r\nReply-To: \"Ren\xe9e\" <renee@x.com>\r\n\r\nhi"
        );
    }
}
