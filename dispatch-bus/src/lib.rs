//! dispatch-bus: await the outcome of a dispatched action
//!
//! Commands in a Redux-style store are fire-and-forget. dispatch-bus lets a
//! caller send one and `await` the result that its executor reports later,
//! correlated by channel name over a shared replay-one event bus.
//!
//! # Example
//! ```ignore
//! use dispatch_bus::prelude::*;
//!
//! #[derive(Action, Clone, Debug)]
//! enum AppAction {
//!     #[action(name = "[Data] Load data")]
//!     DataLoad,
//!     Quit,
//! }
//!
//! let data: Vec<u32> = dispatcher.dispatch_async(AppAction::DataLoad).await?;
//! ```

// Re-export everything from core
pub use dispatch_bus_core::*;

// Re-export derive macros
pub use dispatch_bus_macros::Action;

/// Prelude for convenient imports
pub mod prelude {
    pub use dispatch_bus_core::prelude::*;

    // Derive macros
    pub use dispatch_bus_macros::Action;
}
