//! Mailbox address value type and the source-address template
//!
//! Parsing goes through `mailparse` for the RFC 5322 grammar (quoted display
//! names, angle addresses, comments) and then validates the mailbox itself
//! with `email_address`, so a parsed [`Address`] always carries a usable
//! mailbox.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use mailparse::MailAddr;

/// Display name plus mailbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    name: Option<String>,
    mailbox: String,
}

impl Address {
    /// Build an address from parts, validating the mailbox
    pub fn new(name: Option<&str>, mailbox: &str) -> Result<Self, AddressError> {
        let mailbox = mailbox.trim();
        if !email_address::EmailAddress::is_valid(mailbox) {
            return Err(AddressError::InvalidMailbox(mailbox.to_string()));
        }

        Ok(Self {
            name: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            mailbox: mailbox.to_string(),
        })
    }

    /// Parse a header value holding exactly one mailbox
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AddressError::Empty);
        }

        // Going through a header lets mailparse decode RFC 2047 display names
        let line = format!("Address: {input}");
        let (header, _) = mailparse::parse_header(line.as_bytes())
            .map_err(|e| AddressError::Syntax(e.to_string()))?;
        let list =
            mailparse::addrparse_header(&header).map_err(|e| AddressError::Syntax(e.to_string()))?;

        match list.as_slice() {
            [MailAddr::Single(info)] => Self::new(info.display_name.as_deref(), &info.addr),
            _ => Err(AddressError::NotSingle(input.to_string())),
        }
    }

    /// Display name, if one was given
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            None => f.write_str(&self.mailbox),
            Some(name) if name.is_ascii() => {
                write!(f, "\"{}\" <{}>", escape_quoted(name), self.mailbox)
            }
            Some(name) => write!(
                f,
                "=?utf-8?b?{}?= <{}>",
                BASE64.encode(name.as_bytes()),
                self.mailbox
            ),
        }
    }
}

fn escape_quoted(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Source address template with a single display-name placeholder
///
/// `%s` marks where the original sender's name goes and `%%` is a literal
/// percent sign. Every other character, including a lone `%`, is copied
/// through untouched. The name itself is inserted verbatim, never
/// interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTemplate {
    before: String,
    after: String,
}

impl SourceTemplate {
    pub fn new(template: &str) -> Result<Self, AddressError> {
        let mut before = String::new();
        let mut after = String::new();
        let mut found = 0;

        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            let out = if found == 0 { &mut before } else { &mut after };
            match (c, chars.peek()) {
                ('%', Some('s')) => {
                    chars.next();
                    found += 1;
                }
                ('%', Some('%')) => {
                    chars.next();
                    out.push('%');
                }
                _ => out.push(c),
            }
        }

        if found != 1 {
            return Err(AddressError::Placeholder { found });
        }

        Ok(Self { before, after })
    }

    /// Template text with `name` substituted
    pub fn render(&self, name: &str) -> String {
        format!("{}{}{}", self.before, name, self.after)
    }

    /// Substitute `name` and parse the result
    pub fn address(&self, name: &str) -> Result<Address, AddressError> {
        Address::parse(&self.render(name))
    }
}

/// Address parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("invalid address syntax: {0}")]
    Syntax(String),

    #[error("expected exactly one mailbox: {0}")]
    NotSingle(String),

    #[error("invalid mailbox: {0}")]
    InvalidMailbox(String),

    #[error("template must contain exactly one %s placeholder, found {found}")]
    Placeholder { found: usize },
}
