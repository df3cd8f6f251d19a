//! Facade over the store for callers that want a plain `async fn`.

use dispatch_bus::{Action, ActionDispatcher, DispatchError, DispatchOptions};
use tracing::info;

use crate::action::AppAction;

#[derive(Clone, Debug)]
pub struct DataFacade {
    dispatcher: ActionDispatcher<AppAction>,
}

impl DataFacade {
    pub fn new(dispatcher: ActionDispatcher<AppAction>) -> Self {
        Self { dispatcher }
    }

    /// Dispatch `[Data] Load data` and wait for the fetched data.
    pub async fn load_data(&self) -> Result<Vec<u32>, DispatchError> {
        self.load_data_with(DispatchOptions::default()).await
    }

    /// Like [`load_data`](Self::load_data) with an explicit timeout or
    /// cancellation token.
    pub async fn load_data_with(
        &self,
        options: DispatchOptions,
    ) -> Result<Vec<u32>, DispatchError> {
        let action = AppAction::DataLoad;
        let channel = action.channel();
        let data: Vec<u32> = self
            .dispatcher
            .dispatch_async_with(action, channel, options)
            .await?;
        info!(items = data.len(), "data loaded");
        Ok(data)
    }
}
