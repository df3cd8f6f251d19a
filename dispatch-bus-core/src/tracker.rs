//! Action tracker: per-channel outcome streams over the shared bus
//!
//! Executors report outcomes with [`ActionTracker::report_success`] and
//! [`ActionTracker::report_failure`]. Callers wait on
//! [`ActionTracker::observe`], which projects the raw bus onto one channel:
//!
//! 1. a failure terminates the stream (on any channel, under
//!    [`FailureScope::Global`]),
//! 2. successes on other channels are dropped,
//! 3. matching successes are unwrapped to their value.
//!
//! All observers of one channel share a single upstream listener and a
//! replay-one hub, reference counted exactly like the bus itself.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{ready, Context, Poll};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, trace, warn};

use crate::bus::{lock, EventBus, ListenerGuard, Subscription};
use crate::channel::ChannelName;
use crate::error::DispatchError;
use crate::outcome::{ActionFailure, OutcomeEvent, Payload};

/// Which observers a reported failure terminates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureScope {
    /// Any failure terminates every active observation.
    #[default]
    Global,
    /// A failure only terminates observations of its own channel.
    Channel,
}

/// Tracker configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Failure propagation policy.
    pub failure_scope: FailureScope,
}

impl TrackerConfig {
    /// Set the failure propagation policy.
    pub fn with_failure_scope(mut self, scope: FailureScope) -> Self {
        self.failure_scope = scope;
        self
    }
}

/// One channel's shared projection.
struct SharedChannel {
    hub: EventBus<Payload>,
    _upstream: ListenerGuard<OutcomeEvent>,
}

struct TrackerInner {
    bus: EventBus<OutcomeEvent>,
    config: TrackerConfig,
    channels: Mutex<HashMap<ChannelName, SharedChannel>>,
}

impl TrackerInner {
    /// Detach one observer; tear the channel down when it was the last.
    fn release(&self, channel: &ChannelName, subscription: Subscription<Payload>) {
        let mut channels = lock(&self.channels);
        drop(subscription);
        let cold = channels
            .get(channel)
            .is_some_and(|shared| !shared.hub.is_hot());
        let removed = if cold { channels.remove(channel) } else { None };
        drop(channels);

        if removed.is_some() {
            trace!(channel = %channel, "shared channel detached");
        }
    }
}

/// Records outcomes and hands out per-channel outcome streams.
///
/// Cheap to clone; every clone talks to the same bus.
#[derive(Clone)]
pub struct ActionTracker {
    inner: Arc<TrackerInner>,
}

impl fmt::Debug for ActionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTracker")
            .field("config", &self.inner.config)
            .field("active_channels", &self.active_channels())
            .field("bus", &self.inner.bus)
            .finish()
    }
}

impl ActionTracker {
    /// Create a tracker publishing on `bus`.
    pub fn new(bus: EventBus<OutcomeEvent>, config: TrackerConfig) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                bus,
                config,
                channels: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The underlying bus.
    pub fn bus(&self) -> &EventBus<OutcomeEvent> {
        &self.inner.bus
    }

    /// The tracker configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }

    /// Report that the command on `channel` succeeded with `value`.
    ///
    /// Use `&()` when there is no value. A value that cannot be serialized is
    /// reported as a failure so the waiter still settles.
    pub fn report_success<T>(&self, channel: impl Into<ChannelName>, value: &T)
    where
        T: Serialize + ?Sized,
    {
        let channel = channel.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                debug!(channel = %channel, "reporting success");
                self.inner.bus.publish(OutcomeEvent::success(channel, value));
            }
            Err(err) => {
                warn!(channel = %channel, error = %err, "success value not serializable, reporting failure");
                let failure = ActionFailure::new(format!("result could not be serialized: {err}"));
                self.inner.bus.publish(OutcomeEvent::failure(channel, failure));
            }
        }
    }

    /// Report that the command on `channel` failed.
    pub fn report_failure(&self, channel: impl Into<ChannelName>, failure: impl Into<ActionFailure>) {
        let channel = channel.into();
        let failure = failure.into();
        debug!(channel = %channel, failure = %failure, "reporting failure");
        self.inner.bus.publish(OutcomeEvent::failure(channel, failure));
    }

    /// Stream of outcomes for `channel`.
    ///
    /// The observation is attached as soon as this returns; anything reported
    /// afterwards is seen.
    pub fn observe(&self, channel: impl Into<ChannelName>) -> Observation {
        let channel = channel.into();
        let mut channels = lock(&self.inner.channels);
        let subscription = match channels.get(&channel) {
            Some(shared) => shared.hub.subscribe(),
            None => {
                let hub = EventBus::new();
                // Subscribe before wiring upstream so the bus replay lands here.
                let subscription = hub.subscribe();
                let upstream = self.inner.bus.listen(project(
                    channel.clone(),
                    self.inner.config.failure_scope,
                    hub.clone(),
                ));
                trace!(channel = %channel, "shared channel attached");
                channels.insert(
                    channel.clone(),
                    SharedChannel {
                        hub,
                        _upstream: upstream,
                    },
                );
                subscription
            }
        };
        drop(channels);

        Observation {
            channel,
            subscription: Some(subscription),
            tracker: Arc::clone(&self.inner),
        }
    }

    /// Number of channels with at least one active observation.
    pub fn active_channels(&self) -> usize {
        lock(&self.inner.channels).len()
    }
}

fn project(
    channel: ChannelName,
    scope: FailureScope,
    hub: EventBus<Payload>,
) -> impl Fn(&OutcomeEvent) + Send + Sync + 'static {
    move |event: &OutcomeEvent| match &event.payload {
        Err(failure) if scope == FailureScope::Global || event.channel == channel => {
            hub.publish(Err(failure.clone()));
        }
        Ok(value) if event.channel == channel => hub.publish(Ok(value.clone())),
        _ => {}
    }
}

/// Outcome stream for one channel.
///
/// Yields `Ok(value)` for each success on the channel. After yielding a
/// failure the stream is terminated and detached.
pub struct Observation {
    channel: ChannelName,
    subscription: Option<Subscription<Payload>>,
    tracker: Arc<TrackerInner>,
}

impl Observation {
    /// The observed channel.
    pub fn channel(&self) -> &ChannelName {
        &self.channel
    }

    /// Whether the stream has ended.
    pub fn is_terminated(&self) -> bool {
        self.subscription.is_none()
    }

    /// Wait for the first outcome and detach.
    pub async fn first(mut self) -> Result<Value, DispatchError> {
        match self.next().await {
            Some(Ok(value)) => Ok(value),
            Some(Err(failure)) => Err(DispatchError::Failed {
                channel: self.channel.clone(),
                failure,
            }),
            None => Err(DispatchError::Detached {
                channel: self.channel.clone(),
            }),
        }
    }

    fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.tracker.release(&self.channel, subscription);
        }
    }
}

impl fmt::Debug for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observation")
            .field("channel", &self.channel)
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

impl Stream for Observation {
    type Item = Payload;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Payload>> {
        let this = &mut *self;
        let Some(subscription) = this.subscription.as_mut() else {
            return Poll::Ready(None);
        };
        let item = ready!(Pin::new(subscription).poll_next(cx));
        if !matches!(item, Some(Ok(_))) {
            this.detach();
        }
        Poll::Ready(item)
    }
}

impl Drop for Observation {
    fn drop(&mut self) {
        self.detach();
    }
}
