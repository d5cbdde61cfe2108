use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// FIFO of URLs waiting to be downloaded
#[derive(Debug, Default)]
pub struct DownloadQueue {
    inner: Mutex<QueueState>,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<String>,
    /// Enqueued tasks not yet acknowledged with `task_done`
    outstanding: usize,
}

impl DownloadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue(&self, url: impl Into<String>) {
        let mut state = self.lock();
        state.pending.push_back(url.into());
        state.outstanding += 1;
    }

    /// Take the oldest URL without blocking
    pub fn dequeue(&self) -> Option<String> {
        self.lock().pending.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Acknowledge that a dequeued task has been processed or failed
    pub fn task_done(&self) {
        let mut state = self.lock();
        if state.outstanding == 0 {
            tracing::warn!("task_done called more times than tasks were enqueued");
            return;
        }
        state.outstanding -= 1;
    }

    /// Number of enqueued tasks not yet acknowledged
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }
}
