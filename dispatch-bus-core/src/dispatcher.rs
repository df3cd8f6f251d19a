//! Awaitable dispatch
//!
//! [`ActionDispatcher`] turns a fire-and-forget command into one awaited
//! result. The order of operations is fixed:
//!
//! 1. attach a [`PendingCall`] to the tracker for the command's channel,
//! 2. send the command into the store's command channel,
//! 3. settle with the first outcome observed on that channel.
//!
//! Because step 1 completes synchronously before step 2 starts, an executor
//! that reports immediately cannot outrun the waiter.
//!
//! # Example
//!
//! ```ignore
//! let dispatcher = runtime.dispatcher();
//! let data: Vec<u32> = dispatcher.dispatch_async(AppAction::DataLoad).await?;
//! ```

use std::future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::action::Action;
use crate::channel::ChannelName;
use crate::error::DispatchError;
use crate::tracker::{ActionTracker, Observation};

/// Per-call limits on how long a dispatch waits.
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Give up after this long.
    pub timeout: Option<Duration>,
    /// Give up when this token is cancelled.
    pub cancel: Option<CancellationToken>,
}

impl DispatchOptions {
    /// No limits: wait until an outcome arrives.
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Give up when `token` is cancelled.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Dispatcher-wide defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Default timeout in milliseconds; `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
}

impl DispatcherConfig {
    /// Set the default timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// The default timeout as a [`Duration`].
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// One in-flight dispatch.
///
/// Holds the channel observation from the moment it is attached until it
/// settles; dropping it detaches.
#[derive(Debug)]
pub struct PendingCall {
    observation: Observation,
}

impl PendingCall {
    /// Start waiting on `channel`.
    pub fn attach(tracker: &ActionTracker, channel: impl Into<ChannelName>) -> Self {
        Self {
            observation: tracker.observe(channel),
        }
    }

    /// The awaited channel.
    pub fn channel(&self) -> &ChannelName {
        self.observation.channel()
    }

    /// Wait for the first outcome, honouring `options`.
    pub async fn settle(self, options: DispatchOptions) -> Result<Value, DispatchError> {
        let channel = self.observation.channel().clone();
        let DispatchOptions { timeout, cancel } = options;

        let outcome = self.observation.first();
        let deadline = async move {
            match timeout {
                Some(after) => {
                    tokio::time::sleep(after).await;
                    after
                }
                None => future::pending().await,
            }
        };
        let cancelled = async move {
            match cancel {
                Some(token) => token.cancelled().await,
                None => future::pending().await,
            }
        };

        tokio::select! {
            biased;
            result = outcome => result,
            after = deadline => {
                debug!(channel = %channel, ?after, "dispatch timed out");
                Err(DispatchError::TimedOut { channel, after })
            }
            () = cancelled => {
                debug!(channel = %channel, "dispatch cancelled");
                Err(DispatchError::Cancelled { channel })
            }
        }
    }
}

/// Dispatches commands and awaits their correlated outcome.
#[derive(Debug, Clone)]
pub struct ActionDispatcher<A: Action> {
    command_tx: mpsc::UnboundedSender<A>,
    tracker: ActionTracker,
    config: DispatcherConfig,
}

impl<A: Action> ActionDispatcher<A> {
    /// Create a dispatcher sending commands on `command_tx`.
    pub fn new(command_tx: mpsc::UnboundedSender<A>, tracker: ActionTracker) -> Self {
        Self {
            command_tx,
            tracker,
            config: DispatcherConfig::default(),
        }
    }

    /// Apply dispatcher-wide defaults.
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// The tracker outcomes are awaited on.
    pub fn tracker(&self) -> &ActionTracker {
        &self.tracker
    }

    /// Broadcast a command without waiting for anything.
    pub fn dispatch(&self, action: A) -> Result<(), DispatchError> {
        let channel = action.channel();
        self.command_tx
            .send(action)
            .map_err(|_| DispatchError::CommandChannelClosed { channel })
    }

    /// Dispatch `action` and await the outcome on its own channel.
    pub async fn dispatch_async<T>(&self, action: A) -> Result<T, DispatchError>
    where
        T: DeserializeOwned,
    {
        let channel = action.channel();
        self.dispatch_async_with(action, channel, DispatchOptions::default())
            .await
    }

    /// Dispatch `action` and await the outcome on `channel`.
    pub async fn dispatch_async_on<T>(
        &self,
        action: A,
        channel: impl Into<ChannelName>,
    ) -> Result<T, DispatchError>
    where
        T: DeserializeOwned,
    {
        self.dispatch_async_with(action, channel, DispatchOptions::default())
            .await
    }

    /// Dispatch `action` and await the outcome on `channel` with limits.
    ///
    /// A timeout missing from `options` falls back to the dispatcher default.
    pub async fn dispatch_async_with<T>(
        &self,
        action: A,
        channel: impl Into<ChannelName>,
        mut options: DispatchOptions,
    ) -> Result<T, DispatchError>
    where
        T: DeserializeOwned,
    {
        let channel = channel.into();
        if options.timeout.is_none() {
            options.timeout = self.config.timeout();
        }

        let pending = PendingCall::attach(&self.tracker, channel.clone());

        debug!(action = %action.name(), channel = %channel, "dispatching");
        if self.command_tx.send(action).is_err() {
            warn!(channel = %channel, "command channel closed");
            return Err(DispatchError::CommandChannelClosed { channel });
        }

        let value = pending.settle(options).await?;
        serde_json::from_value(value).map_err(|source| DispatchError::Decode { channel, source })
    }
}
