//! Simulated data service
//!
//! Stands in for an HTTP endpoint: after `latency` it either returns
//! `[1, 2, 3, 4, 5]` or fails with an HTTP 500.

use std::time::Duration;

use dispatch_bus::ActionFailure;
use thiserror::Error;
use tracing::debug;

/// Whether the simulated request succeeds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ServiceMode {
    #[default]
    Ok,
    Fail,
}

/// Errors returned by [`DataService`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
}

impl From<ServiceError> for ActionFailure {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Http { status, message } => {
                ActionFailure::new(message).with_status(status)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct DataService {
    mode: ServiceMode,
    latency: Duration,
}

impl DataService {
    pub fn new(mode: ServiceMode, latency: Duration) -> Self {
        Self { mode, latency }
    }

    /// Simulated latency in milliseconds, saturating at `u64::MAX`.
    pub fn latency_ms(&self) -> u64 {
        u64::try_from(self.latency.as_millis()).unwrap_or(u64::MAX)
    }

    pub async fn get_data(&self) -> Result<Vec<u32>, ServiceError> {
        debug!(mode = ?self.mode, latency_ms = self.latency_ms(), "fetching data");
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match self.mode {
            ServiceMode::Ok => Ok(vec![1, 2, 3, 4, 5]),
            ServiceMode::Fail => Err(ServiceError::Http {
                status: 500,
                message: "http error message".into(),
            }),
        }
    }
}
