//! Error types

use std::time::Duration;

use thiserror::Error;

use crate::channel::ChannelName;
use crate::outcome::ActionFailure;

/// Why an awaited dispatch did not produce a value.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// An executor reported a failure.
    ///
    /// With the default global failure scope this may be a failure reported on
    /// a different channel than the one awaited.
    #[error("action on channel `{channel}` failed: {failure}")]
    Failed {
        channel: ChannelName,
        #[source]
        failure: ActionFailure,
    },

    /// No outcome arrived within the configured timeout.
    #[error("no outcome on channel `{channel}` within {after:?}")]
    TimedOut { channel: ChannelName, after: Duration },

    /// The caller's cancellation token fired.
    #[error("wait on channel `{channel}` was cancelled")]
    Cancelled { channel: ChannelName },

    /// The command could not be handed to the store.
    #[error("command for channel `{channel}` was not sent: command channel closed")]
    CommandChannelClosed { channel: ChannelName },

    /// The success value did not match the type the caller asked for.
    #[error("outcome on channel `{channel}` could not be decoded: {source}")]
    Decode {
        channel: ChannelName,
        #[source]
        source: serde_json::Error,
    },

    /// The outcome stream ended before producing anything.
    #[error("outcome stream for channel `{channel}` ended without an outcome")]
    Detached { channel: ChannelName },
}

impl DispatchError {
    /// The channel that was being awaited.
    pub fn channel(&self) -> &ChannelName {
        match self {
            DispatchError::Failed { channel, .. }
            | DispatchError::TimedOut { channel, .. }
            | DispatchError::Cancelled { channel }
            | DispatchError::CommandChannelClosed { channel }
            | DispatchError::Decode { channel, .. }
            | DispatchError::Detached { channel } => channel,
        }
    }

    /// The reported failure, if this error carries one.
    pub fn failure(&self) -> Option<&ActionFailure> {
        match self {
            DispatchError::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }

    /// Consume the error and return the reported failure, if any.
    pub fn into_failure(self) -> Option<ActionFailure> {
        match self {
            DispatchError::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }

    /// True for [`DispatchError::TimedOut`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::TimedOut { .. })
    }
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
