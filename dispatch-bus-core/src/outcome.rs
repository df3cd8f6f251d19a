//! Outcome events carried by the bus

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::channel::ChannelName;

/// A reported failure.
///
/// Executors translate whatever went wrong (network, validation, ...) into one
/// of these; it is the error every pending waiter is rejected with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionFailure {
    /// Human readable description.
    pub message: String,
    /// Optional status code (e.g. an HTTP status).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Optional structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ActionFailure {
    /// Create a failure with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            detail: None,
        }
    }

    /// Build a failure from any error, keeping its display text.
    pub fn from_error(error: &(dyn StdError + 'static)) -> Self {
        Self::new(error.to_string())
    }

    /// Attach a status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach structured detail.
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {})", self.message, status),
            None => f.write_str(&self.message),
        }
    }
}

impl StdError for ActionFailure {}

impl From<&str> for ActionFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ActionFailure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Payload of an outcome: a success value or a failure, never both.
pub type Payload = Result<Value, ActionFailure>;

/// The unit of information flowing through the bus.
#[derive(Clone, Debug, PartialEq)]
pub struct OutcomeEvent {
    /// Channel the outcome belongs to.
    pub channel: ChannelName,
    /// Success value or failure.
    pub payload: Payload,
}

impl OutcomeEvent {
    /// A successful outcome.
    pub fn success(channel: impl Into<ChannelName>, value: Value) -> Self {
        Self {
            channel: channel.into(),
            payload: Ok(value),
        }
    }

    /// A failed outcome.
    pub fn failure(channel: impl Into<ChannelName>, failure: ActionFailure) -> Self {
        Self {
            channel: channel.into(),
            payload: Err(failure),
        }
    }

    /// True iff the payload is a failure.
    #[inline]
    pub fn is_failure(&self) -> bool {
        self.payload.is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_display() {
        let f = ActionFailure::new("http error message");
        assert_eq!(f.to_string(), "http error message");

        let f = f.with_status(500);
        assert_eq!(f.to_string(), "http error message (status 500)");
    }

    #[test]
    fn test_failure_from_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let f = ActionFailure::from_error(&io);
        assert_eq!(f.message, "disk on fire");
        assert_eq!(f.status, None);
    }

    #[test]
    fn test_failure_serializes_without_empty_fields() {
        let f = ActionFailure::new("boom");
        assert_eq!(serde_json::to_value(&f).unwrap(), json!({ "message": "boom" }));

        let f = ActionFailure::new("boom")
            .with_status(500)
            .with_detail(json!({ "url": "/data" }));
        let back: ActionFailure = serde_json::from_value(serde_json::to_value(&f).unwrap()).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn test_outcome_is_failure() {
        assert!(!OutcomeEvent::success("load", json!([1, 2])).is_failure());
        assert!(OutcomeEvent::failure("load", "nope".into()).is_failure());
    }
}
