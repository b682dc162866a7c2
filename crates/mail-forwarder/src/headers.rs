//! Ordered, multi-valued message header collection
//!
//! Internet message headers may repeat (`Received`, `DKIM-Signature`, ...) and
//! their relative order matters to downstream verifiers, so they are kept as a
//! plain sequence of pairs rather than a map. Lookups compare names ASCII
//! case-insensitively.
//!
//! Values are raw bytes. Inbound mail still carries unencoded 8-bit headers,
//! and those must reach the destination exactly as they arrived.

use std::borrow::Cow;

/// A single header field with folding already removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Field name as it appeared in the message
    pub name: String,
    /// Unfolded field value, not otherwise decoded
    pub value: Vec<u8>,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Value as text, with invalid UTF-8 replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }

    /// Case-insensitive name comparison
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Headers in their original order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    headers: Vec<Header>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header after all existing ones
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.headers.push(Header::new(name, value));
    }

    /// First value for `name`, if any
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|h| h.is(name))
            .map(|h| h.value.as_slice())
    }

    /// First value for `name` as lossily decoded text
    pub fn get_text(&self, name: &str) -> Option<Cow<'_, str>> {
        self.headers.iter().find(|h| h.is(name)).map(Header::text)
    }

    /// Every value for `name`, in order
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.headers
            .iter()
            .filter(move |h| h.is(name))
            .map(|h| h.value.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h.is(name))
    }

    /// Copy of this set without any header whose name matches one of `names`
    pub fn without(&self, names: &[&str]) -> HeaderSet {
        self.headers
            .iter()
            .filter(|h| !names.iter().any(|n| h.is(n)))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.headers.iter()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Mutable access to the most recently appended header (used for unfolding)
    pub(crate) fn last_mut(&mut self) -> Option<&mut Header> {
        self.headers.last_mut()
    }
}

impl FromIterator<Header> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        Self {
            headers: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a HeaderSet {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.headers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> HeaderSet {
        let mut headers = HeaderSet::new();
        headers.append("Received", "from a");
        headers.append("from", "alice@example.com");
        headers.append("RECEIVED", "from b");
        headers.append("Subject", "hi");
        headers
    }

    #[test]
    fn test_get_is_case_insensitive_and_returns_first() {
        let headers = sample();
        assert_eq!(headers.get("FROM"), Some(b"alice@example.com".as_slice()));
        assert_eq!(headers.get_text("received").as_deref(), Some("from a"));
        assert_eq!(headers.get("Cc"), None);
    }

    #[test]
    fn test_get_all_keeps_every_occurrence_in_order() {
        let headers = sample();
        let received: Vec<_> = headers.get_all("Received").collect();
        assert_eq!(received, vec![b"from a".as_slice(), b"from b".as_slice()]);
    }

    #[test]
    fn test_values_keep_non_utf8_bytes() {
        let mut headers = HeaderSet::new();
        headers.append("Subject", b"Caf\xe9".to_vec());

        assert_eq!(headers.get("subject"), Some(b"Caf\xe9".as_slice()));
        assert_eq!(headers.get_text("subject").as_deref(), Some("Caf\u{FFFD}"));
    }

    #[test]
    fn test_without_preserves_order_of_remaining() {
        let headers = sample().without(&["From", "subject"]);
        let names: Vec<_> = headers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Received", "RECEIVED"]);
        assert!(!headers.contains("from"));
    }
}
