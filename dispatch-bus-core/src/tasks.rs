//! Executor task management
//!
//! Executors run their work as tokio tasks keyed by [`TaskKey`]. Spawning a
//! task under a key that is still running aborts the older task first, so
//! only the latest command of a kind is worked on.
//!
//! A task's output is sent back to the store when it is `Some(action)`;
//! an executor that has nothing to emit (for example after reporting a
//! failure) returns `None`.
//!
//! ```ignore
//! tasks.spawn(TaskKey::from(AppAction::DataLoad.channel()), async move {
//!     match service.get_data().await {
//!         Ok(data) => Some(AppAction::DataDidLoad(data)),
//!         Err(_) => None,
//!     }
//! });
//! ```

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::trace;

use crate::channel::ChannelName;
use crate::Action;

/// Identifies a task for cancellation and replacement.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TaskKey(String);

impl TaskKey {
    /// Create a new task key.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the key name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for TaskKey {
    fn from(s: &'static str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<ChannelName> for TaskKey {
    fn from(channel: ChannelName) -> Self {
        Self(channel.as_str().to_owned())
    }
}

/// Registry of running executor tasks.
///
/// All tasks are aborted when the manager is dropped.
pub struct TaskManager<A> {
    tasks: HashMap<TaskKey, AbortHandle>,
    action_tx: mpsc::UnboundedSender<A>,
}

impl<A: Action> TaskManager<A> {
    /// Create a manager sending task results on `action_tx`.
    pub fn new(action_tx: mpsc::UnboundedSender<A>) -> Self {
        Self {
            tasks: HashMap::new(),
            action_tx,
        }
    }

    /// Spawn `future`, aborting any running task with the same key.
    ///
    /// An aborted task sends nothing.
    pub fn spawn<F, R>(&mut self, key: impl Into<TaskKey>, future: F) -> &mut Self
    where
        F: Future<Output = R> + Send + 'static,
        R: Into<Option<A>> + Send + 'static,
    {
        let key = key.into();
        self.cancel(&key);
        self.tasks.retain(|_, handle| !handle.is_finished());

        let tx = self.action_tx.clone();
        let handle = tokio::spawn(async move {
            if let Some(action) = future.await.into() {
                let _ = tx.send(action);
            }
        });

        self.tasks.insert(key, handle.abort_handle());
        self
    }

    /// Abort the task under `key`, if any.
    pub fn cancel(&mut self, key: &TaskKey) {
        if let Some(handle) = self.tasks.remove(key) {
            if !handle.is_finished() {
                trace!(task = %key.name(), "aborting superseded task");
            }
            handle.abort();
        }
    }

    /// Abort every task.
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }

    /// Whether a task under `key` is still running.
    pub fn is_running(&self, key: &TaskKey) -> bool {
        self.tasks
            .get(key)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of tracked tasks, finished ones included until the next spawn.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are tracked.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<A> Drop for TaskManager<A> {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}
