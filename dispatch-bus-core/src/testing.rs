//! Test utilities for dispatch-bus applications
//!
//! - [`TestHarness`]: state plus an action channel, with a tracker and task
//!   manager so effect handlers can run outside a runtime
//! - [`OutcomeRecorder`]: captures every event published on a bus
//! - Assertion macros for verifying emitted actions
//!
//! # Example
//!
//! ```ignore
//! use dispatch_bus::testing::{OutcomeRecorder, TestHarness};
//!
//! let mut harness = TestHarness::<AppState, AppAction>::new(AppState::default());
//! let mut outcomes = OutcomeRecorder::new(harness.tracker().bus());
//!
//! harness.handle_effect(Effect::FetchData, handle_effect);
//! let action = harness.next_emitted().await;
//! assert!(matches!(action, Some(AppAction::DataDidLoad(_))));
//! assert_eq!(outcomes.drain().len(), 1);
//! ```

use tokio::sync::mpsc;

use crate::bus::{EventBus, Subscription};
use crate::outcome::OutcomeEvent;
use crate::runtime::EffectContext;
use crate::tasks::TaskManager;
use crate::tracker::{ActionTracker, TrackerConfig};
use crate::Action;

/// Generic test harness for dispatch-bus applications.
///
/// # Type Parameters
///
/// - `S`: The state type
/// - `A`: The action type (must implement [`Action`])
pub struct TestHarness<S, A: Action> {
    /// The application state under test
    pub state: S,
    tx: mpsc::UnboundedSender<A>,
    rx: mpsc::UnboundedReceiver<A>,
    tracker: ActionTracker,
    tasks: TaskManager<A>,
}

impl<S, A: Action> TestHarness<S, A> {
    /// Create a new test harness with a fresh bus and default tracker.
    pub fn new(state: S) -> Self {
        Self::with_tracker(
            state,
            ActionTracker::new(EventBus::new(), TrackerConfig::default()),
        )
    }

    /// Create a harness reporting outcomes to `tracker`.
    pub fn with_tracker(state: S, tracker: ActionTracker) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let tasks = TaskManager::new(tx.clone());
        Self {
            state,
            tx,
            rx,
            tracker,
            tasks,
        }
    }

    /// The tracker effect handlers report to.
    pub fn tracker(&self) -> &ActionTracker {
        &self.tracker
    }

    /// Get a clone of the action sender for passing to handlers.
    pub fn sender(&self) -> mpsc::UnboundedSender<A> {
        self.tx.clone()
    }

    /// Emit an action (simulates what a handler would do).
    pub fn emit(&self, action: A) {
        let _ = self.tx.send(action);
    }

    /// Run an effect handler against this harness.
    ///
    /// Actions the handler emits, directly or from spawned tasks, land in
    /// the harness channel.
    pub fn handle_effect<E, F>(&mut self, effect: E, handler: F)
    where
        F: FnOnce(E, &mut EffectContext<A>),
    {
        let mut ctx = EffectContext {
            action_tx: &self.tx,
            tasks: &mut self.tasks,
            tracker: &self.tracker,
        };
        handler(effect, &mut ctx);
    }

    /// Wait for the next emitted action.
    pub async fn next_emitted(&mut self) -> Option<A> {
        self.rx.recv().await
    }

    /// Drain all emitted actions from the channel.
    pub fn drain_emitted(&mut self) -> Vec<A> {
        let mut actions = Vec::new();
        while let Ok(action) = self.rx.try_recv() {
            actions.push(action);
        }
        actions
    }

    /// Check if any actions were emitted.
    pub fn has_emitted(&mut self) -> bool {
        !self.drain_emitted().is_empty()
    }
}

impl<S: Default, A: Action> Default for TestHarness<S, A> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

/// Records every event published on a bus.
///
/// The recorder is a subscriber, so it keeps the bus hot while alive.
#[derive(Debug)]
pub struct OutcomeRecorder {
    subscription: Subscription<OutcomeEvent>,
}

impl OutcomeRecorder {
    /// Start recording `bus`.
    pub fn new(bus: &EventBus<OutcomeEvent>) -> Self {
        Self {
            subscription: bus.subscribe(),
        }
    }

    /// Wait for the next recorded event.
    pub async fn next(&mut self) -> Option<OutcomeEvent> {
        self.subscription.recv().await
    }

    /// Take every event recorded so far.
    pub fn drain(&mut self) -> Vec<OutcomeEvent> {
        std::iter::from_fn(|| self.subscription.try_next()).collect()
    }
}

/// Assert that an action matching a pattern was emitted.
///
/// # Example
///
/// ```ignore
/// use dispatch_bus::testing::assert_emitted;
///
/// let actions = harness.drain_emitted();
/// assert_emitted!(actions, Action::DataDidLoad(_));
/// ```
#[macro_export]
macro_rules! assert_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            $actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected action matching `{}` to be emitted, but got: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Assert that a specific action was NOT emitted.
#[macro_export]
macro_rules! assert_not_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            !$actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected action matching `{}` NOT to be emitted, but it was: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Find and return the first action matching a pattern.
#[macro_export]
macro_rules! find_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().find(|a| matches!(a, $pattern $(if $guard)?))
    };
}

/// Count how many actions match a pattern.
#[macro_export]
macro_rules! count_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().filter(|a| matches!(a, $pattern $(if $guard)?)).count()
    };
}
