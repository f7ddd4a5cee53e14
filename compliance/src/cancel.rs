//! Cooperative cancellation for loader tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag.
///
/// Clones observe the same flag. A [`child`](CancelToken::child) token is
/// cancelled when its parent is, but cancelling the child leaves the parent
/// untouched.
///
/// Cancellation is checked at unit boundaries only: when a phase starts and
/// when a load task obtains its pool permit. A task already reading or
/// parsing its file runs to completion, and the phase discards nothing it
/// returns. A cancelled run therefore ends after at most one in-flight read
/// per permit.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    parent: Option<Arc<CancelToken>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::new(self.clone())),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }
}
