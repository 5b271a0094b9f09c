//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::config::ApiConfig;
use crate::data::Dataset;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded input tables, read-only for the life of the process
    pub dataset: Arc<Dataset>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(dataset: Dataset, config: ApiConfig) -> Self {
        Self::from_shared(Arc::new(dataset), config)
    }

    /// Create state around an already shared dataset
    pub fn from_shared(dataset: Arc<Dataset>, config: ApiConfig) -> Self {
        Self {
            dataset,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
