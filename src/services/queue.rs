use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::models::capture::QueuedCapture;

/// In-memory FIFO of converted captures awaiting upload.
///
/// Files enter on successful conversion and leave on successful upload or
/// when the per-file attempt cap is reached. Every access goes through the
/// inner mutex; the guard is never held across an await point.
#[derive(Default)]
pub struct UploadQueue {
    inner: Mutex<Vec<QueuedCapture>>,
}

/// Outcome of recording a failed upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    /// Still queued; will be retried on the next connectivity event.
    Retained { attempts: u32 },
    /// Attempt cap reached; removed from the queue.
    Dropped { attempts: u32 },
    /// The file was no longer in the queue.
    Missing,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<QueuedCapture>> {
        // A poisoned lock only means another thread panicked mid-access;
        // the queue itself is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Enqueue a converted file. A path already present is a no-op,
    /// keeping the at-most-once queue invariant. Returns whether the file
    /// was added.
    pub fn push(&self, path: PathBuf) -> bool {
        let mut queue = self.lock();
        if queue.iter().any(|c| c.path == path) {
            return false;
        }
        queue.push(QueuedCapture::new(path));
        true
    }

    /// Copy of the queue in processing order, for a drain pass.
    pub fn snapshot(&self) -> Vec<QueuedCapture> {
        self.lock().clone()
    }

    /// Remove a file after a successful upload (or a permanent failure).
    /// Returns whether it was still present.
    pub fn remove(&self, path: &Path) -> bool {
        let mut queue = self.lock();
        let before = queue.len();
        queue.retain(|c| c.path != path);
        queue.len() != before
    }

    /// Bump the attempt counter for a failed upload, dropping the file
    /// once `max_attempts` is reached.
    pub fn record_failure(&self, path: &Path, max_attempts: u32) -> RetryDisposition {
        let mut queue = self.lock();
        let Some(position) = queue.iter().position(|c| c.path == path) else {
            return RetryDisposition::Missing;
        };
        queue[position].attempts += 1;
        let attempts = queue[position].attempts;
        if attempts >= max_attempts {
            queue.remove(position);
            RetryDisposition::Dropped { attempts }
        } else {
            RetryDisposition::Retained { attempts }
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().iter().any(|c| c.path == path)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
