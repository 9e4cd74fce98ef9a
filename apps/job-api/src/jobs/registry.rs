//! Process-wide job completion registry.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jobwatch_common::JobId;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("failed to generate job id: {0}")]
    IdGeneration(#[from] rand::Error),
}

/// Source of truth for job completion.
///
/// Completion is one-way: once `is_completed` returns `true` for an id it
/// keeps returning `true` until the entry is swept.
pub trait JobRegistry: Send + Sync {
    /// Allocate a fresh id and record it as not completed.
    fn create(&self) -> Result<JobId, JobError>;

    /// Unknown ids are reported as not completed.
    fn is_completed(&self, id: &str) -> bool;

    /// Mark a job completed. Returns `true` only for the call that flipped
    /// the flag; unknown and already completed ids are ignored.
    fn mark_completed(&self, id: &str) -> bool;

    /// Number of tracked jobs.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop jobs that completed more than `retention` ago. Returns the number
    /// of entries removed.
    fn sweep_completed(&self, retention: Duration) -> usize;
}

#[derive(Debug, Clone)]
struct JobRecord {
    completed: bool,
    created_at: Instant,
    completed_at: Option<Instant>,
}

/// In-memory registry. `DashMap` shards the map so lookups on one job are not
/// serialized behind writes to unrelated jobs.
#[derive(Default)]
pub struct MemoryJobRegistry {
    jobs: DashMap<JobId, JobRecord>,
}

impl MemoryJobRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobRegistry for MemoryJobRegistry {
    fn create(&self) -> Result<JobId, JobError> {
        loop {
            let id = JobId::generate()?;
            // A v4 collision is not expected, but never clobber an existing job.
            if let Entry::Vacant(slot) = self.jobs.entry(id.clone()) {
                slot.insert(JobRecord {
                    completed: false,
                    created_at: Instant::now(),
                    completed_at: None,
                });
                return Ok(id);
            }
        }
    }

    fn is_completed(&self, id: &str) -> bool {
        self.jobs.get(id).is_some_and(|job| job.completed)
    }

    fn mark_completed(&self, id: &str) -> bool {
        let Some(mut job) = self.jobs.get_mut(id) else {
            return false;
        };
        if job.completed {
            return false;
        }
        job.completed = true;
        job.completed_at = Some(Instant::now());
        tracing::trace!(job_id = %id, elapsed = ?job.created_at.elapsed(), "job completed");
        true
    }

    fn len(&self) -> usize {
        self.jobs.len()
    }

    fn sweep_completed(&self, retention: Duration) -> usize {
        let now = Instant::now();
        let before = self.jobs.len();
        self.jobs.retain(|_, job| match job.completed_at {
            Some(at) => now.duration_since(at) < retention,
            None => true, // Still running.
        });
        before.saturating_sub(self.jobs.len())
    }
}
