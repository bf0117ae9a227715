//! Per-task artifact cache
//!
//! Each task gets its own slot, initialised at most once for the lifetime
//! of the cache. A failed load is cached as "unavailable" just like a
//! successful one; there is no reload path.

use crate::models::Task;
use crate::predictor::Regressor;
use crate::store::ArtifactLoader;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::debug;

type Slot = Arc<OnceLock<Option<Arc<dyn Regressor>>>>;

/// Cached load state of a task's artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// No load attempted yet
    NotLoaded,
    Loaded,
    /// Load attempted and failed; heuristics only for this process
    Unavailable,
}

/// Load-on-first-use cache of regressors keyed by task
#[derive(Default)]
pub struct ArtifactCache {
    slots: DashMap<Task, Slot>,
    load_attempts: AtomicU64,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached regressor for `task`, loading it on first use.
    ///
    /// Concurrent first uses of the same task wait on that task's slot
    /// only; the loader runs once.
    pub fn get_or_load(&self, task: Task, loader: &dyn ArtifactLoader) -> Option<Arc<dyn Regressor>> {
        // Clone the slot out so the map shard is not held across the load
        let slot: Slot = self.slots.entry(task).or_default().value().clone();

        slot.get_or_init(|| {
            self.load_attempts.fetch_add(1, Ordering::Relaxed);
            match loader.load(task) {
                Ok(regressor) => Some(regressor),
                Err(e) => {
                    debug!(task = %task, reason = %e, "Caching unavailable artifact");
                    None
                }
            }
        })
        .clone()
    }

    pub fn status(&self, task: Task) -> ArtifactStatus {
        match self.slots.get(&task).and_then(|slot| slot.get().map(Option::is_some)) {
            None => ArtifactStatus::NotLoaded,
            Some(true) => ArtifactStatus::Loaded,
            Some(false) => ArtifactStatus::Unavailable,
        }
    }

    /// Number of times a loader has been invoked
    pub fn load_attempts(&self) -> u64 {
        self.load_attempts.load(Ordering::Relaxed)
    }
}
