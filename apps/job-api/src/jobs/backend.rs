//! Stand-in for a real execution engine.

use std::sync::Arc;
use std::time::Duration;

use jobwatch_common::JobId;
use rand::Rng;

use super::registry::JobRegistry;

/// Runs jobs to completion.
///
/// Implementations must eventually call `mark_completed` on the registry
/// exactly once for a started job, or never.
pub trait JobBackend: Send + Sync {
    fn start(&self, id: JobId);
}

/// Completes every job after a random delay in `[0, max_duration)`.
pub struct SimulatedBackend {
    registry: Arc<dyn JobRegistry>,
    max_duration: Duration,
}

impl SimulatedBackend {
    pub fn new(registry: Arc<dyn JobRegistry>, max_duration: Duration) -> Self {
        Self {
            registry,
            max_duration,
        }
    }

    fn pick_duration(&self) -> Duration {
        let max_ms = u64::try_from(self.max_duration.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
    }
}

impl JobBackend for SimulatedBackend {
    fn start(&self, id: JobId) {
        let registry = self.registry.clone();
        let duration = self.pick_duration();

        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            registry.mark_completed(id.as_str());
            tracing::debug!(job_id = %id, ?duration, "simulated job finished");
        });
    }
}
