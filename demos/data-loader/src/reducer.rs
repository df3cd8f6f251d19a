//! Reducer - (state, action) -> effects

use dispatch_bus::DispatchResult;

use crate::action::AppAction;
use crate::effect::Effect;
use crate::state::AppState;

/// The reducer handles all state transitions
pub fn reducer(state: &mut AppState, action: AppAction) -> DispatchResult<Effect> {
    match action {
        AppAction::DataLoad => {
            state.load_requests += 1;
            DispatchResult::changed_with(Effect::FetchData)
        }

        AppAction::DataDidLoad(data) => {
            state.data = Some(data);
            DispatchResult::changed()
        }

        AppAction::Quit => DispatchResult::unchanged(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_requests_fetch() {
        let mut state = AppState::default();

        let result = reducer(&mut state, AppAction::DataLoad);

        assert!(result.changed);
        assert_eq!(result.effects, vec![Effect::FetchData]);
        assert_eq!(state.load_requests, 1);
        assert_eq!(state.data, None);
    }

    #[test]
    fn test_did_load_stores_data() {
        let mut state = AppState::default();

        let result = reducer(&mut state, AppAction::DataDidLoad(vec![1, 2, 3]));

        assert!(result.changed);
        assert!(!result.has_effects());
        assert_eq!(state.data, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_quit_is_noop() {
        let mut state = AppState::default();
        let result = reducer(&mut state, AppAction::Quit);
        assert!(!result.changed);
        assert_eq!(state, AppState::default());
    }
}
