pub mod config;
pub mod error;
pub mod gateway;
pub mod jobs;
pub mod routes;

use std::sync::Arc;

use config::Config;
use jobs::backend::{JobBackend, SimulatedBackend};
use jobs::registry::{JobRegistry, MemoryJobRegistry};

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn JobRegistry>,
    pub backend: Arc<dyn JobBackend>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire an in-memory registry to the simulated backend.
    pub fn in_memory(config: Config) -> Self {
        let registry: Arc<dyn JobRegistry> = Arc::new(MemoryJobRegistry::new());
        let backend: Arc<dyn JobBackend> = Arc::new(SimulatedBackend::new(
            registry.clone(),
            config.job_max_duration,
        ));
        Self {
            registry,
            backend,
            config: Arc::new(config),
        }
    }
}
