//! Combined configuration

use serde::{Deserialize, Serialize};

use crate::dispatcher::DispatcherConfig;
use crate::error::ConfigError;
use crate::tracker::TrackerConfig;

/// Configuration for the tracker and dispatcher of one process.
///
/// Every field is optional in the serialized form:
///
/// ```
/// use dispatch_bus_core::{CoreConfig, FailureScope};
///
/// let config = CoreConfig::from_json_str(r#"{
///     "tracker": { "failure_scope": "channel" },
///     "dispatcher": { "timeout_ms": 2000 }
/// }"#).unwrap();
///
/// assert_eq!(config.tracker.failure_scope, FailureScope::Channel);
/// assert_eq!(config.dispatcher.timeout_ms, Some(2000));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub tracker: TrackerConfig,
    pub dispatcher: DispatcherConfig,
}

impl CoreConfig {
    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
