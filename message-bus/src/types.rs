//! Type definitions for message bus

use serde::{Deserialize, Serialize};

/// Header carrying the static id of the company a message is addressed to
pub const RECIPIENT_HEADER: &str = "recipient-static-id";

/// JetStream deduplication header
pub const MESSAGE_ID_HEADER: &str = "Nats-Msg-Id";

/// Terminal outcome applied to a delivered message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    /// Processed, remove from the queue
    Ack,
    /// Permanently dropped, never redelivered
    Reject,
    /// Returned to the queue for a later delivery attempt
    Requeue,
}

impl Disposition {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Ack => "ack",
            Disposition::Reject => "reject",
            Disposition::Requeue => "requeue",
        }
    }
}

/// Per-message publish options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOptions {
    /// Company the message is addressed to
    pub recipient_static_id: Option<String>,

    /// Idempotency key, generated when absent
    pub message_id: Option<String>,
}

impl PublishOptions {
    /// Options addressed to a single recipient
    pub fn for_recipient(recipient_static_id: impl Into<String>) -> Self {
        Self {
            recipient_static_id: Some(recipient_static_id.into()),
            message_id: None,
        }
    }

    /// Set an explicit idempotency key
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }
}

/// NATS subject for a routing key published under `publisher_id`
pub fn subject_for(publisher_id: &str, routing_key: &str) -> String {
    format!("{}.{}", publisher_id, routing_key)
}

/// Wildcard subject matching everything published under `publisher_id`
pub fn wildcard_subject(publisher_id: &str) -> String {
    format!("{}.>", publisher_id)
}

/// Routing key of a subject published under `publisher_id`
pub fn routing_key_from_subject<'a>(publisher_id: &str, subject: &'a str) -> Option<&'a str> {
    subject
        .strip_prefix(publisher_id)?
        .strip_prefix('.')
        .filter(|key| !key.is_empty())
}

/// JetStream stream name backing a publisher id
pub fn stream_name_for(publisher_id: &str) -> String {
    publisher_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_round_trip() {
        let subject = subject_for("from-event-mgnt", "KOMGO.CreditLines.Share");
        assert_eq!(subject, "from-event-mgnt.KOMGO.CreditLines.Share");
        assert_eq!(
            routing_key_from_subject("from-event-mgnt", &subject),
            Some("KOMGO.CreditLines.Share")
        );
    }

    #[test]
    fn test_routing_key_requires_prefix() {
        assert_eq!(routing_key_from_subject("from-event-mgnt", "other.KOMGO.X"), None);
        assert_eq!(routing_key_from_subject("from-event-mgnt", "from-event-mgnt."), None);
        assert_eq!(routing_key_from_subject("from-event-mgnt", "from-event-mgntX.a"), None);
    }

    #[test]
    fn test_stream_name_sanitized() {
        assert_eq!(stream_name_for("to-event-mgnt"), "TO_EVENT_MGNT");
    }

    #[test]
    fn test_publish_options_builder() {
        let options = PublishOptions::for_recipient("bank-1").with_message_id("m-1");
        assert_eq!(options.recipient_static_id.as_deref(), Some("bank-1"));
        assert_eq!(options.message_id.as_deref(), Some("m-1"));
    }
}
