//! Application state

/// Store state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    /// Last loaded data; `None` until a load succeeds.
    pub data: Option<Vec<u32>>,
    /// Number of load commands seen.
    pub load_requests: u32,
}
