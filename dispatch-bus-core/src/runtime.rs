//! Effect runtime
//!
//! [`EffectRuntime`] is the store side of the bus. It drains the command
//! queue, runs each command through the reducer and hands the resulting
//! effects to the app's effect handler. Effect handlers are the executors:
//! they start work through [`EffectContext::track`], which reports the
//! outcome to the [`ActionTracker`] and optionally feeds a follow-up action
//! back into the queue.
//!
//! ```ignore
//! let mut runtime = EffectRuntime::new(AppState::default(), reducer, tracker);
//! let facade = DataFacade::new(runtime.dispatcher());
//! runtime.run(|a| matches!(a, AppAction::Quit), handle_effect).await;
//! ```

use std::future::Future;
use std::marker::PhantomData;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::channel::ChannelName;
use crate::dispatcher::{ActionDispatcher, DispatcherConfig};
use crate::effect::{DispatchResult, EffectReducer, EffectStore, EffectStoreWithMiddleware};
use crate::middleware::Middleware;
use crate::outcome::ActionFailure;
use crate::tasks::TaskManager;
use crate::tracker::ActionTracker;
use crate::Action;

/// Effect store interface used by [`EffectRuntime`].
pub trait EffectStoreLike<S, A: Action, E> {
    /// Dispatch an action and return state changes plus effects.
    fn dispatch(&mut self, action: A) -> DispatchResult<E>;
    /// Get the current state.
    fn state(&self) -> &S;
}

impl<S, A: Action, E> EffectStoreLike<S, A, E> for EffectStore<S, A, E> {
    fn dispatch(&mut self, action: A) -> DispatchResult<E> {
        EffectStore::dispatch(self, action)
    }

    fn state(&self) -> &S {
        EffectStore::state(self)
    }
}

impl<S, A: Action, E, M: Middleware<A>> EffectStoreLike<S, A, E>
    for EffectStoreWithMiddleware<S, A, E, M>
{
    fn dispatch(&mut self, action: A) -> DispatchResult<E> {
        EffectStoreWithMiddleware::dispatch(self, action)
    }

    fn state(&self) -> &S {
        EffectStoreWithMiddleware::state(self)
    }
}

/// Context passed to effect handlers.
pub struct EffectContext<'a, A: Action> {
    pub(crate) action_tx: &'a mpsc::UnboundedSender<A>,
    pub(crate) tasks: &'a mut TaskManager<A>,
    pub(crate) tracker: &'a ActionTracker,
}

impl<'a, A: Action> EffectContext<'a, A> {
    /// Send an action directly.
    pub fn emit(&self, action: A) {
        let _ = self.action_tx.send(action);
    }

    /// Access the action sender.
    pub fn action_tx(&self) -> &mpsc::UnboundedSender<A> {
        self.action_tx
    }

    /// Access the outcome tracker.
    pub fn tracker(&self) -> &ActionTracker {
        self.tracker
    }

    /// Access the task manager.
    pub fn tasks(&mut self) -> &mut TaskManager<A> {
        self.tasks
    }

    /// Run `work` as the executor for `channel`.
    ///
    /// On success the value is reported on `channel` and `on_success` may
    /// produce a follow-up action. On failure the error is reported and
    /// nothing is emitted. A newer `track` on the same channel aborts this
    /// one before it reports.
    pub fn track<T, Er, Fut, F, R>(
        &mut self,
        channel: impl Into<ChannelName>,
        work: Fut,
        on_success: F,
    ) where
        T: Serialize + Send + 'static,
        Er: Into<ActionFailure> + Send + 'static,
        Fut: Future<Output = Result<T, Er>> + Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
        R: Into<Option<A>> + Send + 'static,
    {
        let channel = channel.into();
        let tracker = self.tracker.clone();
        let reported = channel.clone();
        self.tasks.spawn(channel, async move {
            let follow_up: Option<A> = match work.await {
                Ok(value) => {
                    tracker.report_success(reported, &value);
                    on_success(value).into()
                }
                Err(error) => {
                    tracker.report_failure(reported, error);
                    None
                }
            };
            follow_up
        });
    }
}

/// Runtime helper for effect-based stores.
pub struct EffectRuntime<S, A: Action, E, St: EffectStoreLike<S, A, E> = EffectStore<S, A, E>> {
    store: St,
    action_tx: mpsc::UnboundedSender<A>,
    action_rx: mpsc::UnboundedReceiver<A>,
    tracker: ActionTracker,
    tasks: TaskManager<A>,
    dispatcher_config: DispatcherConfig,
    shutdown: CancellationToken,
    _state: PhantomData<S>,
    _effect: PhantomData<E>,
}

impl<S: 'static, A: Action, E> EffectRuntime<S, A, E, EffectStore<S, A, E>> {
    /// Create a runtime from state + effect reducer.
    pub fn new(state: S, reducer: EffectReducer<S, A, E>, tracker: ActionTracker) -> Self {
        Self::from_store(EffectStore::new(state, reducer), tracker)
    }
}

impl<S: 'static, A: Action, E, St: EffectStoreLike<S, A, E>> EffectRuntime<S, A, E, St> {
    /// Create a runtime from an existing effect store.
    pub fn from_store(store: St, tracker: ActionTracker) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let tasks = TaskManager::new(action_tx.clone());

        Self {
            store,
            action_tx,
            action_rx,
            tracker,
            tasks,
            dispatcher_config: DispatcherConfig::default(),
            shutdown: CancellationToken::new(),
            _state: PhantomData,
            _effect: PhantomData,
        }
    }

    /// Defaults for dispatchers created by [`dispatcher`](Self::dispatcher).
    pub fn with_dispatcher_config(mut self, config: DispatcherConfig) -> Self {
        self.dispatcher_config = config;
        self
    }

    /// A dispatcher feeding this runtime's queue.
    pub fn dispatcher(&self) -> ActionDispatcher<A> {
        ActionDispatcher::new(self.action_tx.clone(), self.tracker.clone())
            .with_config(self.dispatcher_config)
    }

    /// Send an action into the runtime queue.
    pub fn enqueue(&self, action: A) {
        let _ = self.action_tx.send(action);
    }

    /// Clone the action sender.
    pub fn action_tx(&self) -> mpsc::UnboundedSender<A> {
        self.action_tx.clone()
    }

    /// Access the current state.
    pub fn state(&self) -> &S {
        self.store.state()
    }

    /// Access the outcome tracker.
    pub fn tracker(&self) -> &ActionTracker {
        &self.tracker
    }

    /// Access the task manager.
    pub fn tasks(&mut self) -> &mut TaskManager<A> {
        &mut self.tasks
    }

    /// Token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn step<FEffect>(&mut self, action: A, handle_effect: &mut FEffect)
    where
        FEffect: FnMut(E, &mut EffectContext<A>),
    {
        let result = self.store.dispatch(action);
        if result.has_effects() {
            let mut ctx = EffectContext {
                action_tx: &self.action_tx,
                tasks: &mut self.tasks,
                tracker: &self.tracker,
            };
            for effect in result.effects {
                handle_effect(effect, &mut ctx);
            }
        }
    }

    /// Process queued actions until `should_quit` matches one or the
    /// shutdown token is cancelled. Running tasks are aborted on exit.
    pub async fn run<FQuit, FEffect>(&mut self, mut should_quit: FQuit, mut handle_effect: FEffect)
    where
        FQuit: FnMut(&A) -> bool,
        FEffect: FnMut(E, &mut EffectContext<A>),
    {
        let shutdown = self.shutdown.clone();
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!("runtime shutdown requested");
                    break;
                }

                Some(action) = self.action_rx.recv() => {
                    if should_quit(&action) {
                        debug!(action = %action.name(), "runtime quit");
                        break;
                    }
                    self.step(action, &mut handle_effect);
                }

                else => {
                    break;
                }
            }
        }

        self.tasks.cancel_all();
    }

    /// Process every action already queued, without waiting.
    ///
    /// Returns the number of actions processed.
    pub fn process_pending<FEffect>(&mut self, mut handle_effect: FEffect) -> usize
    where
        FEffect: FnMut(E, &mut EffectContext<A>),
    {
        let mut processed = 0;
        while let Ok(action) = self.action_rx.try_recv() {
            self.step(action, &mut handle_effect);
            processed += 1;
        }
        processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use crate::error::DispatchError;
    use crate::tracker::TrackerConfig;
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Load { fail: bool },
        Loaded(u32),
        Quit,
    }

    impl Action for TestAction {
        fn name(&self) -> &'static str {
            match self {
                TestAction::Load { .. } => "Load",
                TestAction::Loaded(_) => "Loaded",
                TestAction::Quit => "Quit",
            }
        }
    }

    #[derive(Default)]
    struct TestState {
        loading: bool,
        value: Option<u32>,
    }

    #[derive(Debug, PartialEq)]
    enum TestEffect {
        Fetch { fail: bool },
    }

    fn reducer(state: &mut TestState, action: TestAction) -> DispatchResult<TestEffect> {
        match action {
            TestAction::Load { fail } => {
                state.loading = true;
                DispatchResult::changed_with(TestEffect::Fetch { fail })
            }
            TestAction::Loaded(value) => {
                state.loading = false;
                state.value = Some(value);
                DispatchResult::changed()
            }
            TestAction::Quit => DispatchResult::unchanged(),
        }
    }

    fn handle_effect(effect: TestEffect, ctx: &mut EffectContext<TestAction>) {
        match effect {
            TestEffect::Fetch { fail } => ctx.track(
                "Load",
                async move {
                    if fail {
                        Err(ActionFailure::new("boom").with_status(500))
                    } else {
                        Ok(7u32)
                    }
                },
                TestAction::Loaded,
            ),
        }
    }

    fn runtime() -> EffectRuntime<TestState, TestAction, TestEffect> {
        let tracker = ActionTracker::new(EventBus::new(), TrackerConfig::default());
        EffectRuntime::new(TestState::default(), reducer, tracker)
    }

    #[tokio::test]
    async fn test_process_pending_runs_reducer() {
        let mut runtime = runtime();
        runtime.enqueue(TestAction::Loaded(3));

        let processed = runtime.process_pending(handle_effect);

        assert_eq!(processed, 1);
        assert_eq!(runtime.state().value, Some(3));
    }

    #[tokio::test]
    async fn test_track_reports_and_follows_up() {
        let mut runtime = runtime();
        let mut observation = runtime.tracker().observe("Load");

        runtime.enqueue(TestAction::Load { fail: false });
        runtime.process_pending(handle_effect);
        assert!(runtime.state().loading);

        let value = tokio_stream::StreamExt::next(&mut observation)
            .await
            .expect("stream ended");
        assert_eq!(value, Ok(serde_json::json!(7)));

        let follow_up = tokio::time::timeout(Duration::from_millis(100), async {
            loop {
                if runtime.process_pending(handle_effect) > 0 {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(follow_up.is_ok());
        assert_eq!(runtime.state().value, Some(7));
        assert!(!runtime.state().loading);
    }

    #[tokio::test]
    async fn test_run_serves_dispatch_async() {
        let mut runtime = runtime();
        let dispatcher = runtime.dispatcher();
        let quit = runtime.action_tx();

        let caller = tokio::spawn(async move {
            let ok: Result<u32, DispatchError> =
                dispatcher.dispatch_async(TestAction::Load { fail: false }).await;
            let err: Result<u32, DispatchError> =
                dispatcher.dispatch_async(TestAction::Load { fail: true }).await;
            let _ = quit.send(TestAction::Quit);
            (ok, err)
        });

        runtime
            .run(|a| matches!(a, TestAction::Quit), handle_effect)
            .await;

        let (ok, err) = caller.await.expect("caller panicked");
        assert_eq!(ok.expect("load failed"), 7);
        let err = err.expect_err("load should fail");
        assert_eq!(err.failure().and_then(|f| f.status), Some(500));
    }

    #[tokio::test]
    async fn test_shutdown_token_stops_run() {
        let mut runtime = runtime();
        let token = runtime.shutdown_token();
        token.cancel();

        tokio::time::timeout(
            Duration::from_millis(100),
            runtime.run(|_| false, handle_effect),
        )
        .await
        .expect("run did not stop");
    }

    #[tokio::test]
    async fn test_dispatcher_uses_runtime_config() {
        let runtime = runtime()
            .with_dispatcher_config(DispatcherConfig::default().with_timeout(Duration::from_millis(5)));
        let dispatcher = runtime.dispatcher();

        // Nothing drives the runtime, so the call can only time out.
        let err = dispatcher
            .dispatch_async::<u32>(TestAction::Load { fail: false })
            .await
            .expect_err("should time out");
        assert!(err.is_timeout());
    }
}
