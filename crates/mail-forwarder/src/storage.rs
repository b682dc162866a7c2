//! Retrieval of received messages from S3
//!
//! SES receipt rules write each inbound message to `bucket/prefix/messageId`.
//! The object body is handed back as a stream; nothing here buffers it.

use std::future::Future;
use std::pin::Pin;

use aws_sdk_s3::{config::Region, error::DisplayErrorContext, Client as S3Client};
use tokio::io::AsyncRead;
use tracing::{debug, error, instrument};

/// Readable stream over one raw stored message
pub type MessageStream = Pin<Box<dyn AsyncRead + Send>>;

/// Source of raw received messages
pub trait MessageStore {
    /// Open the raw message stored for `message_id`
    fn fetch(
        &self,
        message_id: &str,
    ) -> impl Future<Output = Result<MessageStream, StorageError>> + Send;
}

/// Where received messages live
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageConfig {
    pub bucket: String,
    /// Key prefix joined in front of every message id
    pub prefix: String,
    /// Region override for the bucket; defaults to the function's region
    pub region: Option<String>,
}

impl StorageConfig {
    /// Object key for `message_id`
    pub fn key_for(&self, message_id: &str) -> String {
        join_key(&self.prefix, message_id)
    }
}

/// Slash-join a key prefix and a name, collapsing the separator
pub fn join_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

/// S3-backed message store
pub struct S3Store {
    client: S3Client,
    config: StorageConfig,
}

impl S3Store {
    /// Build a client from the shared AWS config, honoring the region override
    pub fn new(shared: &aws_config::SdkConfig, config: StorageConfig) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(shared);
        if let Some(region) = &config.region {
            builder = builder.region(Region::new(region.clone()));
        }

        Self {
            client: S3Client::from_conf(builder.build()),
            config,
        }
    }
}

impl MessageStore for S3Store {
    #[instrument(skip(self), fields(bucket = %self.config.bucket))]
    async fn fetch(&self, message_id: &str) -> Result<MessageStream, StorageError> {
        let key = self.config.key_for(message_id);
        debug!(key = %key, "Fetching message from S3");

        let object = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    return StorageError::NotFound {
                        bucket: self.config.bucket.clone(),
                        key: key.clone(),
                    };
                }
                let message = DisplayErrorContext(&service_error).to_string();
                error!(key = %key, error = %message, "S3 GetObject failed");
                StorageError::Request(message)
            })?;

        Ok(Box::pin(object.body.into_async_read()))
    }
}

/// Storage retrieval errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object s3://{bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("S3 GetObject failed: {0}")]
    Request(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_without_prefix_is_message_id() {
        assert_eq!(join_key("", "abc123"), "abc123");
    }

    #[test]
    fn test_key_joins_prefix_with_single_slash() {
        assert_eq!(join_key("inbound", "abc123"), "inbound/abc123");
        assert_eq!(join_key("inbound/", "abc123"), "inbound/abc123");
        assert_eq!(join_key("mail/inbound//", "/abc123"), "mail/inbound/abc123");
    }

    #[test]
    fn test_storage_config_key_for() {
        let config = StorageConfig {
            bucket: "received-mail".to_string(),
            prefix: "ses/".to_string(),
            region: Some("eu-west-1".to_string()),
        };
        assert_eq!(config.key_for("0000014a"), "ses/0000014a");
    }

    #[test]
    fn test_store_type_is_sendable() {
        fn _assert_send_sync<T: Send + Sync>() {}
        _assert_send_sync::<S3Store>();
    }
}
