//! Core types for dispatch-bus
//!
//! This crate correlates fire-and-forget commands with the outcomes reported
//! by whoever executes them, so a caller can `await` a command even though
//! the command path itself returns nothing.
//!
//! # Core Concepts
//!
//! - **EventBus**: multicast, replay-one, reference-counted event channel
//! - **ActionTracker**: reports outcomes and projects them onto one channel
//! - **ActionDispatcher**: sends a command and awaits its correlated outcome
//! - **EffectRuntime**: reducer loop whose effect handlers act as executors
//!
//! # Flow
//!
//! ```text
//! caller ── dispatch_async(cmd) ──► observe(channel)   (1. subscribe)
//!                                    command queue      (2. send)
//! executor ◄──────────────────────── cmd
//! executor ── report_success(channel, value) ──► bus ──► caller resolves
//! ```
//!
//! The subscription is always in place before the command is sent, so an
//! executor that reports synchronously cannot be missed.
//!
//! # Example
//!
//! ```ignore
//! use dispatch_bus_core::prelude::*;
//!
//! let tracker = ActionTracker::new(EventBus::new(), TrackerConfig::default());
//! let mut runtime = EffectRuntime::new(AppState::default(), reducer, tracker);
//! let dispatcher = runtime.dispatcher();
//!
//! tokio::spawn(async move {
//!     let data: Vec<u32> = dispatcher.dispatch_async(AppAction::DataLoad).await?;
//!     Ok::<_, DispatchError>(data)
//! });
//! runtime.run(|a| matches!(a, AppAction::Quit), handle_effect).await;
//! ```
//!
//! Correlation is by channel name only. Two concurrent calls on the same
//! channel both resolve with the first outcome reported there.

pub mod action;
pub mod bus;
pub mod channel;
pub mod config;
pub mod dispatcher;
pub mod effect;
pub mod error;
pub mod middleware;
pub mod outcome;
pub mod runtime;
pub mod tasks;
pub mod testing;
pub mod tracker;

// Core trait exports
pub use action::Action;
pub use channel::ChannelName;

// Bus exports
pub use bus::{EventBus, ListenerGuard, Subscription};
pub use outcome::{ActionFailure, OutcomeEvent, Payload};

// Correlation exports
pub use dispatcher::{ActionDispatcher, DispatchOptions, DispatcherConfig, PendingCall};
pub use tracker::{ActionTracker, FailureScope, Observation, TrackerConfig};

// Store exports
pub use effect::{DispatchResult, EffectReducer, EffectStore, EffectStoreWithMiddleware};
pub use middleware::{LoggingMiddleware, Middleware, NoopMiddleware};

// Runtime exports
pub use runtime::{EffectContext, EffectRuntime, EffectStoreLike};
pub use tasks::{TaskKey, TaskManager};

// Config and errors
pub use config::CoreConfig;
pub use error::{ConfigError, DispatchError};

// Testing exports
pub use testing::{OutcomeRecorder, TestHarness};

// Re-export for cancellation in `DispatchOptions`
pub use tokio_util::sync::CancellationToken;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::action::Action;
    pub use crate::bus::EventBus;
    pub use crate::channel::ChannelName;
    pub use crate::dispatcher::{ActionDispatcher, DispatchOptions, DispatcherConfig};
    pub use crate::effect::{DispatchResult, EffectStore, EffectStoreWithMiddleware};
    pub use crate::error::DispatchError;
    pub use crate::middleware::{LoggingMiddleware, Middleware, NoopMiddleware};
    pub use crate::outcome::{ActionFailure, OutcomeEvent};
    pub use crate::runtime::{EffectContext, EffectRuntime};
    pub use crate::tracker::{ActionTracker, FailureScope, TrackerConfig};
    pub use crate::CoreConfig;
}
