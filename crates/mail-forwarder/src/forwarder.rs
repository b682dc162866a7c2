//! The forwarding pipeline: fetch, parse, rewrite, compose, send

use tracing::{error, info, instrument};

use crate::composer::compose;
use crate::error::ForwardError;
use crate::parser::parse;
use crate::rewriter::{rewrite, ForwardConfig};
use crate::ses::MailTransport;
use crate::storage::MessageStore;
use crate::SOURCE_SETTING;

/// Re-emits stored messages through a mail transport
pub struct Forwarder<S, T> {
    store: S,
    transport: T,
    config: ForwardConfig,
}

impl<S, T> Forwarder<S, T>
where
    S: MessageStore + Sync,
    T: MailTransport + Sync,
{
    pub fn new(store: S, transport: T, config: ForwardConfig) -> Self {
        Self {
            store,
            transport,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Forward each message in order, stopping at the first failure
    ///
    /// Returns how many messages were sent. Messages sent before a failure
    /// stay sent; a retried invocation will send them again.
    pub async fn forward_batch<I>(&self, message_ids: I) -> Result<usize, ForwardError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut forwarded = 0;
        for message_id in message_ids {
            let message_id = message_id.as_ref();
            if let Err(e) = self.forward_message(message_id).await {
                error!(message_id, forwarded, error = %e, "Forwarding failed, aborting batch");
                return Err(e);
            }
            forwarded += 1;
        }
        Ok(forwarded)
    }

    /// Forward one stored message, returning the transport's message id
    #[instrument(skip(self))]
    pub async fn forward_message(&self, message_id: &str) -> Result<String, ForwardError> {
        let stream = self
            .store
            .fetch(message_id)
            .await
            .map_err(|source| ForwardError::Retrieval {
                message_id: message_id.to_string(),
                source,
            })?;

        let (original, body) =
            parse(stream)
                .await
                .map_err(|source| ForwardError::MalformedMessage {
                    message_id: message_id.to_string(),
                    source,
                })?;

        let headers =
            rewrite(&original, &self.config).map_err(|source| ForwardError::AddressConfig {
                setting: SOURCE_SETTING,
                message_id: Some(message_id.to_string()),
                source,
            })?;

        // The stored object is released here, before anything is sent
        let raw = compose(&headers, body)
            .await
            .map_err(|source| ForwardError::Compose {
                message_id: message_id.to_string(),
                source,
            })?;

        let size = raw.len();
        let sent_id =
            self.transport
                .send_raw(raw)
                .await
                .map_err(|source| ForwardError::Transmission {
                    message_id: message_id.to_string(),
                    source,
                })?;

        info!(
            sent_id = %sent_id,
            to = %self.config.destination,
            bytes = size,
            "Message forwarded"
        );
        Ok(sent_id)
    }
}
