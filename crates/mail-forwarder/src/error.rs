use thiserror::Error;

use crate::address::AddressError;
use crate::parser::ParseError;
use crate::ses::SesError;
use crate::storage::StorageError;

/// Failure of one forwarding stage
///
/// Any of these aborts the rest of the batch and fails the invocation.
#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("failed to retrieve message {message_id}: {source}")]
    Retrieval {
        message_id: String,
        #[source]
        source: StorageError,
    },

    #[error("malformed message {message_id}: {source}")]
    MalformedMessage {
        message_id: String,
        #[source]
        source: ParseError,
    },

    /// A configured address is invalid, either at load time or once a
    /// message's sender name has been substituted into it
    #[error("invalid address configuration in {setting}{}: {source}", for_message(.message_id))]
    AddressConfig {
        setting: &'static str,
        message_id: Option<String>,
        #[source]
        source: AddressError,
    },

    #[error("failed to compose message {message_id}: {source}")]
    Compose {
        message_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to send message {message_id}: {source}")]
    Transmission {
        message_id: String,
        #[source]
        source: SesError,
    },

    #[error("missing required setting: {0}")]
    MissingConfig(&'static str),
}

impl ForwardError {
    /// Message the failure belongs to, when it is not a load-time configuration error
    pub fn message_id(&self) -> Option<&str> {
        match self {
            ForwardError::Retrieval { message_id, .. }
            | ForwardError::MalformedMessage { message_id, .. }
            | ForwardError::Compose { message_id, .. }
            | ForwardError::Transmission { message_id, .. } => Some(message_id),
            ForwardError::AddressConfig { message_id, .. } => message_id.as_deref(),
            ForwardError::MissingConfig(_) => None,
        }
    }
}

fn for_message(message_id: &Option<String>) -> String {
    match message_id {
        Some(id) => format!(" for message {id}"),
        None => String::new(),
    }
}
