//! Action trait for commands broadcast into the store

use std::fmt::Debug;

use crate::channel::ChannelName;

/// Marker trait for actions that can be dispatched to the store
///
/// Actions are fire-and-forget commands. They should be:
/// - Clone: Actions may be logged or handed to several handlers
/// - Debug: For debugging and logging
/// - Send + 'static: Commands cross into executor tasks
///
/// Use `#[derive(Action)]` from `dispatch-bus-macros` to auto-implement this trait.
pub trait Action: Clone + Debug + Send + 'static {
    /// Get the action name for logging and filtering
    fn name(&self) -> &'static str;

    /// Channel the executor reports this action's outcome on.
    ///
    /// Defaults to [`name`](Self::name), so a caller and an executor agree on
    /// the channel without sharing anything but the action type.
    fn channel(&self) -> ChannelName {
        ChannelName::from(self.name())
    }
}
