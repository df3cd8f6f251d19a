//! Effects and their executor
//!
//! The reducer only declares `Effect::FetchData`; [`handle_effect`] does the
//! work and reports the outcome so the awaiting caller resolves.

use dispatch_bus::{Action, EffectContext};

use crate::action::AppAction;
use crate::service::DataService;

/// Side effects that can be triggered by actions
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fetch data from the service
    FetchData,
}

/// Execute an effect.
///
/// A repeated `FetchData` replaces the in-flight fetch. On success the data
/// is reported and `DataDidLoad` is emitted; on failure only the failure is
/// reported.
pub fn handle_effect(effect: Effect, ctx: &mut EffectContext<AppAction>, service: &DataService) {
    match effect {
        Effect::FetchData => {
            let service = service.clone();
            ctx.track(
                AppAction::DataLoad.channel(),
                async move { service.get_data().await },
                AppAction::DataDidLoad,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceMode;
    use dispatch_bus::testing::{OutcomeRecorder, TestHarness};
    use dispatch_bus::{assert_emitted, ActionFailure, OutcomeEvent};
    use serde_json::json;
    use std::time::Duration;

    fn harness() -> TestHarness<(), AppAction> {
        TestHarness::new(())
    }

    #[tokio::test]
    async fn test_fetch_reports_then_emits_loaded() {
        let mut harness = harness();
        let mut outcomes = OutcomeRecorder::new(harness.tracker().bus());
        let service = DataService::new(ServiceMode::Ok, Duration::ZERO);

        harness.handle_effect(Effect::FetchData, |e, ctx| handle_effect(e, ctx, &service));

        let action = harness.next_emitted().await;
        assert_eq!(action, Some(AppAction::DataDidLoad(vec![1, 2, 3, 4, 5])));
        assert_eq!(
            outcomes.drain(),
            vec![OutcomeEvent::success("[Data] Load data", json!([1, 2, 3, 4, 5]))]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_reports_and_emits_nothing() {
        let mut harness = harness();
        let mut outcomes = OutcomeRecorder::new(harness.tracker().bus());
        let service = DataService::new(ServiceMode::Fail, Duration::ZERO);

        harness.handle_effect(Effect::FetchData, |e, ctx| handle_effect(e, ctx, &service));

        let event = outcomes.next().await.expect("bus dropped");
        assert_eq!(
            event,
            OutcomeEvent::failure(
                "[Data] Load data",
                ActionFailure::new("http error message").with_status(500)
            )
        );
        tokio::task::yield_now().await;
        assert!(!harness.has_emitted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_fetch_replaces_in_flight() {
        let mut harness = harness();
        let mut outcomes = OutcomeRecorder::new(harness.tracker().bus());
        let service = DataService::new(ServiceMode::Ok, Duration::from_millis(100));

        harness.handle_effect(Effect::FetchData, |e, ctx| handle_effect(e, ctx, &service));
        harness.handle_effect(Effect::FetchData, |e, ctx| handle_effect(e, ctx, &service));

        tokio::time::sleep(Duration::from_millis(500)).await;

        let actions = harness.drain_emitted();
        assert_eq!(actions.len(), 1);
        assert_emitted!(actions, AppAction::DataDidLoad(_));
        assert_eq!(outcomes.drain().len(), 1);
    }
}
