//! Envelope rewriting for forwarded messages
//!
//! The forwarded copy keeps every header of the original except the address
//! headers, which are rebuilt:
//!
//! - `From` becomes the configured source address, optionally carrying the
//!   original sender's display name
//! - `To` becomes the configured destination
//! - `Reply-To` keeps the original `Reply-To`, or the original `From`, so a
//!   reply reaches the person who wrote the message. The value is copied as
//!   raw bytes, 8-bit content included
//! - `Bcc` is dropped so blind recipients are never disclosed
//!
//! The rebuilt headers are appended after the copied ones, in that order.

use tracing::warn;

use crate::address::{Address, AddressError, SourceTemplate};
use crate::error::ForwardError;
use crate::headers::HeaderSet;
use crate::{DESTINATION_SETTING, SOURCE_SETTING};

/// Headers that are never copied from the original
pub const REPLACED_HEADERS: [&str; 4] = ["To", "From", "Bcc", "Reply-To"];

/// Addresses used to re-emit every message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardConfig {
    /// Where every forwarded message goes
    pub destination: Address,
    /// Sender address, with a slot for the original sender's name
    pub source: SourceTemplate,
}

impl ForwardConfig {
    /// Parse and validate both configured addresses
    ///
    /// The source template is also rendered with an empty name, which is what
    /// every message without a parseable `From` will produce.
    pub fn new(destination: &str, source_template: &str) -> Result<Self, ForwardError> {
        let destination = Address::parse(destination).map_err(|source| {
            ForwardError::AddressConfig {
                setting: DESTINATION_SETTING,
                message_id: None,
                source,
            }
        })?;

        let source_error = |source| ForwardError::AddressConfig {
            setting: SOURCE_SETTING,
            message_id: None,
            source,
        };
        let source = SourceTemplate::new(source_template).map_err(source_error)?;
        source.address("").map_err(source_error)?;

        Ok(Self {
            destination,
            source,
        })
    }
}

/// Build the forwarded header set from the original headers
///
/// Fails only when the source template cannot produce a valid address for
/// this sender's name, which is a configuration problem rather than a
/// problem with the message.
pub fn rewrite(original: &HeaderSet, config: &ForwardConfig) -> Result<HeaderSet, AddressError> {
    let original_from = original.get_text("From");

    let sender_name = match original_from.as_deref().map(Address::parse) {
        Some(Ok(addr)) => addr.name().unwrap_or_default().to_string(),
        Some(Err(e)) => {
            warn!(
                from = ?original_from,
                error = %e,
                "Could not parse original From, using empty name"
            );
            String::new()
        }
        None => String::new(),
    };

    let from = config.source.address(&sender_name)?;

    let mut headers = original.without(&REPLACED_HEADERS);
    headers.append("From", from.to_string());
    headers.append("To", config.destination.to_string());
    headers.append("Reply-To", reply_to(original));

    Ok(headers)
}

/// Original `Reply-To`, else original `From`, else empty; always verbatim
pub fn reply_to(original: &HeaderSet) -> Vec<u8> {
    original
        .get("Reply-To")
        .filter(|v| !v.is_empty())
        .or_else(|| original.get("From"))
        .unwrap_or_default()
        .to_vec()
}
