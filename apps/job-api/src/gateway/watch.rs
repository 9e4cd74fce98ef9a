//! Per-connection list of jobs a client is waiting on.

use std::collections::HashSet;

use jobwatch_common::JobId;

use crate::jobs::registry::JobRegistry;

/// Ordered set of watched job ids. Owned by a single poller task.
#[derive(Debug, Default)]
pub struct WatchList {
    order: Vec<JobId>,
    members: HashSet<JobId>,
}

impl WatchList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start watching `id`. Returns `false` if it was already watched.
    pub fn watch(&mut self, id: JobId) -> bool {
        if !self.members.insert(id.clone()) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Remove and return every watched job the registry reports as completed,
    /// in watch order. Pending jobs keep their relative order.
    pub fn take_completed(&mut self, registry: &dyn JobRegistry) -> Vec<JobId> {
        let mut completed = Vec::new();
        self.order.retain(|id| {
            if registry.is_completed(id.as_str()) {
                completed.push(id.clone());
                false
            } else {
                true
            }
        });
        for id in &completed {
            self.members.remove(id);
        }
        completed
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
