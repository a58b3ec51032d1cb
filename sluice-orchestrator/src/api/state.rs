//! Shared API state

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::repository::PipelineStore;
use crate::service::ReconfigurationService;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PipelineStore>,
    pub reconfiguration: Arc<ReconfigurationService>,
    pub locks: PipelineLocks,
}

impl AppState {
    pub fn new(store: Arc<dyn PipelineStore>, reconfiguration: ReconfigurationService) -> Self {
        Self {
            store,
            reconfiguration: Arc::new(reconfiguration),
            locks: PipelineLocks::default(),
        }
    }
}

/// One async mutex per pipeline id
///
/// Reconfiguration rounds hold the pipeline's mutex from loading the
/// snapshot until the definition is persisted, so two rounds for the same
/// pipeline never interleave. Rounds for different pipelines do not block
/// each other. An entry lives only while a round holds or waits for it.
#[derive(Clone, Default)]
pub struct PipelineLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>>,
}

impl PipelineLocks {
    /// Waits for exclusive access to `id` until the returned guard drops
    pub async fn acquire(&self, id: Uuid) -> PipelineGuard {
        let guard = self.lock_for(id).lock_owned().await;

        PipelineGuard {
            id,
            locks: self.clone(),
            guard: Some(guard),
        }
    }

    fn lock_for(&self, id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        self.map().entry(id).or_default().clone()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.map().len()
    }
}

/// Exclusive access to one pipeline
pub struct PipelineGuard {
    id: Uuid,
    locks: PipelineLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PipelineGuard {
    fn drop(&mut self) {
        self.guard.take();

        // Waiters clone the entry under the map lock, so a count of one
        // means nobody else holds or waits for it.
        let mut locks = self.locks.map();
        if locks
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.id);
        }
    }
}
