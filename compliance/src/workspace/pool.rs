//! Bounded task pool shared by the loader fan-outs.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cancel::CancelToken;

/// Spawns work onto a `JoinSet` while keeping at most `limit` units running.
///
/// Every unit holds a semaphore permit for its whole lifetime. Units that
/// obtain a permit after the pool's token is cancelled resolve to `None`
/// without running.
/// A unit that is already running is not interrupted.
#[derive(Debug, Clone)]
pub struct TaskPool {
    permits: Arc<Semaphore>,
    cancel: CancelToken,
}

impl TaskPool {
    pub fn new(limit: usize, cancel: CancelToken) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit.max(1))),
            cancel,
        }
    }

    pub fn spawn<T, F>(&self, set: &mut JoinSet<Option<T>>, work: F)
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let cancel = self.cancel.clone();
        set.spawn(async move {
            let _permit = permits.acquire_owned().await.ok()?;
            if cancel.is_cancelled() {
                return None;
            }
            Some(work.await)
        });
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Permits not currently held by a running unit.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
