use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds the total number of in-flight partner sends across all
/// concurrent broadcasts.
///
/// A bounded `Semaphore` models backpressure in async terms — a saturated
/// pool makes the calling task await its own permit instead of off-loading
/// to a fresh worker.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
        }
    }

    /// Waits for a permit. The returned guard releases the slot on drop.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("worker pool semaphore is never closed")
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}
