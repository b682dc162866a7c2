//! SES receipt event structures
//!
//! Shape of the event a receipt rule's Lambda action delivers. Only the
//! fields the forwarder reads or logs are modeled; everything else is
//! ignored during deserialization.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Lambda event from an SES receipt rule
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SesEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<SesRecord>,
}

impl SesEvent {
    /// Stored-object ids of every record, in delivery order
    pub fn message_ids(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.ses.mail.message_id.clone())
            .collect()
    }
}

/// One received message
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SesRecord {
    #[serde(default)]
    pub event_source: Option<String>,
    #[serde(default)]
    pub event_version: Option<String>,
    pub ses: SesMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SesMessage {
    pub mail: SesMail,
    #[serde(default)]
    pub receipt: Option<SesReceipt>,
}

/// Envelope information for the received message
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SesMail {
    /// Also the S3 object name written by the receipt rule
    pub message_id: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Envelope sender (MAIL FROM)
    #[serde(default)]
    pub source: Option<String>,
    /// Envelope recipients (RCPT TO)
    #[serde(default)]
    pub destination: Vec<String>,
}

/// Receipt verdicts and matched recipients
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SesReceipt {
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub spam_verdict: Option<Verdict>,
    #[serde(default)]
    pub virus_verdict: Option<Verdict>,
    #[serde(default)]
    pub spf_verdict: Option<Verdict>,
    #[serde(default)]
    pub dkim_verdict: Option<Verdict>,
    #[serde(default)]
    pub dmarc_verdict: Option<Verdict>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Verdict {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EVENT: &str = r#"{
      "Records": [
        {
          "eventSource": "aws:ses",
          "eventVersion": "1.0",
          "ses": {
            "mail": {
              "timestamp": "2024-03-01T12:00:00.000Z",
              "source": "alice@x.com",
              "messageId": "o3vrnil0e2ic28trm7dfhrc2v0clambda4nbp0g1",
              "destination": ["inbox@forward.example"],
              "headersTruncated": false,
              "commonHeaders": { "subject": "Hello" }
            },
            "receipt": {
              "recipients": ["inbox@forward.example"],
              "spamVerdict": { "status": "PASS" },
              "virusVerdict": { "status": "PASS" },
              "action": { "type": "Lambda", "invocationType": "Event" }
            }
          }
        }
      ]
    }"#;

    #[test]
    fn test_deserializes_receipt_event() {
        let event: SesEvent = serde_json::from_str(EVENT).unwrap();

        assert_eq!(event.records.len(), 1);
        let record = &event.records[0];
        assert_eq!(record.event_source.as_deref(), Some("aws:ses"));
        assert_eq!(record.ses.mail.source.as_deref(), Some("alice@x.com"));
        assert_eq!(
            record.ses.receipt.as_ref().unwrap().spam_verdict.as_ref().unwrap().status,
            "PASS"
        );
        assert_eq!(
            event.message_ids(),
            vec!["o3vrnil0e2ic28trm7dfhrc2v0clambda4nbp0g1".to_string()]
        );
    }

    #[test]
    fn test_missing_records_is_an_empty_batch() {
        let event: SesEvent = serde_json::from_str("{}").unwrap();
        assert!(event.message_ids().is_empty());
    }
}
