//! Data loader - dispatch-bus demo
//!
//! A caller awaits data that only ever arrives through the store:
//! 1. `DataFacade::load_data` dispatches `[Data] Load data` and waits
//! 2. The reducer turns the command into `Effect::FetchData`
//! 3. The effect handler (the executor) calls `DataService`
//! 4. The outcome is reported on the `[Data] Load data` channel, resolving
//!    the caller, and `[Data] Data loaded` is fed back into the store

pub mod action;
pub mod effect;
pub mod facade;
pub mod reducer;
pub mod service;
pub mod settings;
pub mod state;
pub mod view;

pub use action::AppAction;
pub use effect::{handle_effect, Effect};
pub use facade::DataFacade;
pub use reducer::reducer;
pub use service::{DataService, ServiceError, ServiceMode};
pub use settings::{load_config, SettingsError};
pub use state::AppState;
pub use view::LoadView;
