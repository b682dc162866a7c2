//! AWS SES v2 raw message transport
//!
//! The forwarded message is already fully formed, so it goes out through
//! `SendEmail` with raw content. SES takes the recipients from the `To`
//! header of the message itself.

use std::future::Future;

use aws_sdk_sesv2::{
    error::DisplayErrorContext,
    primitives::Blob,
    types::{EmailContent, RawMessage as SesRawMessage},
    Client as SesClient,
};
use tracing::{error, info, instrument};

use crate::composer::RawMessage;

/// Outbound delivery of composed messages
pub trait MailTransport {
    /// Hand a complete message to the provider, returning its message id
    fn send_raw(&self, message: RawMessage)
        -> impl Future<Output = Result<String, SesError>> + Send;
}

/// SES email sender
pub struct SesSender {
    client: SesClient,
    configuration_set: Option<String>,
}

impl SesSender {
    /// Create a sender from the shared AWS config
    pub fn new(shared: &aws_config::SdkConfig, configuration_set: Option<String>) -> Self {
        Self {
            client: SesClient::new(shared),
            configuration_set,
        }
    }
}

impl MailTransport for SesSender {
    #[instrument(skip(self, message), fields(bytes = message.len()))]
    async fn send_raw(&self, message: RawMessage) -> Result<String, SesError> {
        let raw_message = SesRawMessage::builder()
            .data(Blob::new(message.into_bytes()))
            .build()
            .map_err(|e| SesError::BuildError(e.to_string()))?;

        let email_content = EmailContent::builder().raw(raw_message).build();

        let mut send_request = self.client.send_email().content(email_content);

        if let Some(ref config_set) = self.configuration_set {
            send_request = send_request.configuration_set_name(config_set);
        }

        let result = send_request.send().await.map_err(|e| {
            error!(error = %DisplayErrorContext(&e), "SES raw send failed");
            SesError::SendFailed(DisplayErrorContext(&e).to_string())
        })?;

        let message_id = result.message_id().unwrap_or("unknown").to_string();
        info!(message_id = %message_id, "Raw email accepted by SES");
        Ok(message_id)
    }
}

/// SES operation errors
#[derive(Debug, thiserror::Error)]
pub enum SesError {
    #[error("Failed to build email: {0}")]
    BuildError(String),

    #[error("SES send failed: {0}")]
    SendFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The sender is built once per cold start and shared by every invocation
    #[test]
    fn test_sender_is_sendable() {
        fn _assert_send_sync<T: Send + Sync>() {}
        _assert_send_sync::<SesSender>();
    }

    #[test]
    fn test_raw_message_builds_from_bytes() {
        let raw = SesRawMessage::builder()
            .data(Blob::new(b"From: a@example.com\r\n\r\nhi".to_vec()))
            .build();
        assert!(raw.is_ok());
    }
}
