//! Single-flight admission around the one browser session.
//!
//! The chat page holds exactly one conversation, so at most one prompt may
//! be in flight. Admission is a `try_lock` on an async mutex: callers that
//! lose the race are rejected immediately instead of queueing, and the
//! permit is released by guard drop on every exit path.

use tokio::sync::{Mutex, MutexGuard};

pub(crate) struct SingleFlight<T> {
    inner: Mutex<T>,
}

impl<T> SingleFlight<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Try to become the in-flight caller. Returns `None` without waiting
    /// if another caller currently holds the slot.
    pub(crate) fn try_acquire(&self) -> Option<MutexGuard<'_, T>> {
        self.inner.try_lock().ok()
    }

    /// Wait for the slot. Only used by shutdown, which must not cut off an
    /// in-flight prompt.
    pub(crate) async fn acquire(&self) -> MutexGuard<'_, T> {
        self.inner.lock().await
    }
}
