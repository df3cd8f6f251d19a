//! Effect-aware store
//!
//! Commands broadcast by the dispatcher land here. The reducer updates state
//! and declares effects; executors pick the effects up, do the real work and
//! report the outcome to the [`ActionTracker`](crate::ActionTracker).
//!
//! ```ignore
//! enum Effect { FetchData }
//!
//! fn reducer(state: &mut DataState, action: AppAction) -> DispatchResult<Effect> {
//!     match action {
//!         AppAction::DataLoad => DispatchResult::effect(Effect::FetchData),
//!         AppAction::DataDidLoad(data) => {
//!             state.data = Some(data);
//!             DispatchResult::changed()
//!         }
//!     }
//! }
//! ```

use std::marker::PhantomData;

use crate::action::Action;
use crate::middleware::Middleware;

/// What a reducer did with one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult<E> {
    /// Whether the state was modified.
    pub changed: bool,
    /// Work to hand to executors.
    pub effects: Vec<E>,
}

impl<E> Default for DispatchResult<E> {
    fn default() -> Self {
        Self::unchanged()
    }
}

impl<E> DispatchResult<E> {
    /// Nothing changed, nothing to do.
    #[inline]
    pub fn unchanged() -> Self {
        Self {
            changed: false,
            effects: Vec::new(),
        }
    }

    /// State changed, no effects.
    #[inline]
    pub fn changed() -> Self {
        Self {
            changed: true,
            effects: Vec::new(),
        }
    }

    /// One effect, state untouched.
    #[inline]
    pub fn effect(effect: E) -> Self {
        Self {
            changed: false,
            effects: vec![effect],
        }
    }

    /// State changed and one effect.
    #[inline]
    pub fn changed_with(effect: E) -> Self {
        Self {
            changed: true,
            effects: vec![effect],
        }
    }

    /// Append an effect.
    #[inline]
    pub fn with(mut self, effect: E) -> Self {
        self.effects.push(effect);
        self
    }

    /// Returns true if there are any effects to process.
    #[inline]
    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }
}

/// A reducer function that can emit effects.
pub type EffectReducer<S, A, E> = fn(&mut S, A) -> DispatchResult<E>;

/// State container driven by an [`EffectReducer`].
pub struct EffectStore<S, A, E> {
    state: S,
    reducer: EffectReducer<S, A, E>,
    _marker: PhantomData<(A, E)>,
}

impl<S, A: Action, E> EffectStore<S, A, E> {
    /// Create a store with initial state and reducer.
    pub fn new(state: S, reducer: EffectReducer<S, A, E>) -> Self {
        Self {
            state,
            reducer,
            _marker: PhantomData,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Mutable state, for initialization.
    #[inline]
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Run the reducer.
    #[inline]
    pub fn dispatch(&mut self, action: A) -> DispatchResult<E> {
        (self.reducer)(&mut self.state, action)
    }
}

/// [`EffectStore`] wrapped in middleware hooks.
pub struct EffectStoreWithMiddleware<S, A, E, M>
where
    A: Action,
    M: Middleware<A>,
{
    store: EffectStore<S, A, E>,
    middleware: M,
}

impl<S, A, E, M> EffectStoreWithMiddleware<S, A, E, M>
where
    A: Action,
    M: Middleware<A>,
{
    /// Create a store with middleware.
    pub fn new(state: S, reducer: EffectReducer<S, A, E>, middleware: M) -> Self {
        Self {
            store: EffectStore::new(state, reducer),
            middleware,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> &S {
        self.store.state()
    }

    /// The middleware.
    #[inline]
    pub fn middleware(&self) -> &M {
        &self.middleware
    }

    /// Run middleware and reducer.
    pub fn dispatch(&mut self, action: A) -> DispatchResult<E> {
        self.middleware.before(&action);
        let result = self.store.dispatch(action.clone());
        self.middleware.after(&action, result.changed);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    enum TestAction {
        Load,
        Loaded(Vec<u32>),
        Noop,
    }

    impl Action for TestAction {
        fn name(&self) -> &'static str {
            match self {
                TestAction::Load => "Load",
                TestAction::Loaded(_) => "Loaded",
                TestAction::Noop => "Noop",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum TestEffect {
        Fetch,
    }

    #[derive(Default)]
    struct TestState {
        data: Option<Vec<u32>>,
    }

    fn reducer(state: &mut TestState, action: TestAction) -> DispatchResult<TestEffect> {
        match action {
            TestAction::Load => DispatchResult::effect(TestEffect::Fetch),
            TestAction::Loaded(data) => {
                state.data = Some(data);
                DispatchResult::changed()
            }
            TestAction::Noop => DispatchResult::unchanged(),
        }
    }

    #[test]
    fn test_dispatch_result_builders() {
        let r: DispatchResult<TestEffect> = DispatchResult::default();
        assert!(!r.changed && !r.has_effects());

        let r = DispatchResult::changed_with(TestEffect::Fetch).with(TestEffect::Fetch);
        assert!(r.changed);
        assert_eq!(r.effects, vec![TestEffect::Fetch, TestEffect::Fetch]);
    }

    #[test]
    fn test_command_produces_effect() {
        let mut store = EffectStore::new(TestState::default(), reducer);

        let result = store.dispatch(TestAction::Load);
        assert!(!result.changed);
        assert_eq!(result.effects, vec![TestEffect::Fetch]);

        let result = store.dispatch(TestAction::Loaded(vec![1, 2]));
        assert!(result.changed);
        assert_eq!(store.state().data, Some(vec![1, 2]));

        store.state_mut().data = None;
        assert!(!store.dispatch(TestAction::Noop).changed);
        assert_eq!(store.state().data, None);
    }

    #[derive(Default)]
    struct Recording {
        seen: Vec<(&'static str, Option<bool>)>,
    }

    impl Middleware<TestAction> for Recording {
        fn before(&mut self, action: &TestAction) {
            self.seen.push((action.name(), None));
        }

        fn after(&mut self, action: &TestAction, state_changed: bool) {
            self.seen.push((action.name(), Some(state_changed)));
        }
    }

    #[test]
    fn test_middleware_wraps_reducer() {
        let mut store =
            EffectStoreWithMiddleware::new(TestState::default(), reducer, Recording::default());

        store.dispatch(TestAction::Load);
        store.dispatch(TestAction::Loaded(vec![]));

        assert_eq!(
            store.middleware().seen,
            vec![
                ("Load", None),
                ("Load", Some(false)),
                ("Loaded", None),
                ("Loaded", Some(true)),
            ]
        );
        assert_eq!(store.state().data, Some(vec![]));
    }
}
