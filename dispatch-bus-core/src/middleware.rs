//! Middleware observing commands as they pass through the store

use crate::Action;

/// Middleware trait for intercepting actions
///
/// Implement this trait to add logging, auditing or other cross-cutting
/// concerns around the reducer.
pub trait Middleware<A: Action> {
    /// Called before the action reaches the reducer
    fn before(&mut self, action: &A);

    /// Called after the reducer ran
    fn after(&mut self, action: &A, state_changed: bool);
}

/// Middleware that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl<A: Action> Middleware<A> for NoopMiddleware {
    fn before(&mut self, _action: &A) {}
    fn after(&mut self, _action: &A, _state_changed: bool) {}
}

/// Middleware that traces every action with its outcome channel
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    /// Log when an action arrives
    pub log_before: bool,
    /// Log once the reducer has run
    pub log_after: bool,
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingMiddleware {
    /// Log after the reducer only
    pub fn new() -> Self {
        Self {
            log_before: false,
            log_after: true,
        }
    }

    /// Log on arrival and after the reducer
    pub fn verbose() -> Self {
        Self {
            log_before: true,
            log_after: true,
        }
    }
}

impl<A: Action> Middleware<A> for LoggingMiddleware {
    fn before(&mut self, action: &A) {
        if self.log_before {
            tracing::debug!(action = %action.name(), channel = %action.channel(), "action received");
        }
    }

    fn after(&mut self, action: &A, state_changed: bool) {
        if self.log_after {
            tracing::debug!(action = %action.name(), state_changed, "action reduced");
        }
    }
}
