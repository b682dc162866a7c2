//! Mail Forwarder Lambda - re-sends SES-received mail to a fixed address
//!
//! An SES receipt rule stores every inbound message in S3 and then invokes
//! this function. For each message the forwarder:
//!
//! 1. **Fetches** the raw message from S3 as a stream
//! 2. **Parses** the header block, leaving the body unread
//! 3. **Rewrites** the address headers
//!    - `From` becomes the configured sender, optionally carrying the
//!      original sender's display name (`"%s via Forwarder" <relay@...>`)
//!    - `To` becomes the configured destination
//!    - `Reply-To` keeps pointing at the original author
//!    - `Bcc` is dropped
//! 4. **Composes** the new headers and the untouched body into one raw message
//! 5. **Sends** it through SES
//!
//! ## Architecture
//!
//! ```text
//! Sender → SES (receipt rule) → S3 (raw message)
//!                    ↓                 ↓
//!               Lambda (this) ← GetObject
//!                    ↓
//!             SES SendEmail (raw) → Destination
//! ```
//!
//! Messages in one event are processed strictly in order and the first
//! failure fails the whole invocation.

pub mod address;
pub mod composer;
pub mod error;
pub mod forwarder;
pub mod headers;
pub mod parser;
pub mod rewriter;
pub mod ses;
pub mod storage;
pub mod types;

pub use address::{Address, AddressError, SourceTemplate};
pub use composer::{compose, RawMessage};
pub use error::ForwardError;
pub use forwarder::Forwarder;
pub use headers::{Header, HeaderSet};
pub use parser::{parse, ParseError};
pub use rewriter::{rewrite, ForwardConfig};
pub use ses::{MailTransport, SesError, SesSender};
pub use storage::{MessageStore, MessageStream, S3Store, StorageConfig, StorageError};
pub use types::SesEvent;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Destination address setting
pub const DESTINATION_SETTING: &str = "FORWARD_TO";
/// Source address template setting
pub const SOURCE_SETTING: &str = "FORWARD_FROM";

/// Process-level configuration, read once at cold start
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Validated destination and source addresses
    pub forward: ForwardConfig,

    /// Bucket, key prefix and region of stored messages
    pub storage: StorageConfig,

    /// SES configuration set for outgoing mail
    pub configuration_set: Option<String>,
}

impl ForwarderConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, ForwardError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ForwardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ForwardError::MissingConfig(name));

        let forward = ForwardConfig::new(
            &required(DESTINATION_SETTING)?,
            &required(SOURCE_SETTING)?,
        )?;

        let storage = StorageConfig {
            bucket: required("S3_BUCKET")?,
            prefix: var("S3_PREFIX").unwrap_or_default(),
            region: var("S3_BUCKET_REGION"),
        };

        Ok(Self {
            forward,
            storage,
            configuration_set: var("SES_CONFIGURATION_SET"),
        })
    }
}
