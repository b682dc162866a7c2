//! Internet message framing
//!
//! Splits a raw message into its header block and body without buffering the
//! body. Only the header block is read into memory; the returned reader is
//! positioned on the first body byte and can be copied straight into the
//! outgoing message.
//!
//! ```text
//! Name: value CRLF
//! Folded-Name: first part CRLF
//!   continued CRLF
//! CRLF                      <- boundary
//! body bytes ...
//! ```

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::headers::HeaderSet;

/// Upper bound on the header block size
pub const MAX_HEADER_BYTES: usize = 1024 * 1024;

/// Split `stream` into headers and a reader over the unconsumed body
pub async fn parse<R>(stream: R) -> Result<(HeaderSet, BufReader<R>), ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let headers = read_headers(&mut reader).await?;
    Ok((headers, reader))
}

/// Read header lines up to and including the blank boundary line
pub async fn read_headers<R>(reader: &mut R) -> Result<HeaderSet, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = HeaderSet::new();
    let mut line = Vec::new();
    let mut total = 0usize;

    loop {
        line.clear();
        let budget = (MAX_HEADER_BYTES - total + 1) as u64;
        let n = (&mut *reader)
            .take(budget)
            .read_until(b'\n', &mut line)
            .await?;
        if n == 0 {
            return Err(ParseError::MissingBoundary);
        }

        total += n;
        if total > MAX_HEADER_BYTES {
            return Err(ParseError::HeadersTooLarge(MAX_HEADER_BYTES));
        }

        let content = strip_line_ending(&line);
        if content.is_empty() {
            if line.ends_with(b"\n") {
                return Ok(headers);
            }
            return Err(ParseError::MissingBoundary);
        }

        // Folded continuation of the previous field
        if content.starts_with(b" ") || content.starts_with(b"\t") {
            let header = headers.last_mut().ok_or_else(|| malformed(content))?;
            let continuation = trim(content);
            if !continuation.is_empty() {
                if !header.value.is_empty() {
                    header.value.push(b' ');
                }
                header.value.extend_from_slice(continuation);
            }
            continue;
        }

        let colon = content
            .iter()
            .position(|&b| b == b':')
            .ok_or_else(|| malformed(content))?;
        let (name, value) = (&content[..colon], &content[colon + 1..]);
        if !is_field_name(name) {
            return Err(malformed(content));
        }

        headers.append(String::from_utf8_lossy(name), trim(value));
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// RFC 5322 field name: printable US-ASCII except colon
fn is_field_name(name: &[u8]) -> bool {
    !name.is_empty() && name.iter().all(|b| (33..=126).contains(b) && *b != b':')
}

fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn malformed(line: &[u8]) -> ParseError {
    ParseError::MalformedHeader(String::from_utf8_lossy(line).into_owned())
}

/// Message framing errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no blank line separating headers from body")]
    MissingBoundary,

    #[error("malformed header line: {0}")]
    MalformedHeader(String),

    #[error("header block exceeds {0} bytes")]
    HeadersTooLarge(usize),

    #[error("failed to read message: {0}")]
    Io(#[from] std::io::Error),
}
