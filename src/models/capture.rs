use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// A converted capture waiting in the upload queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCapture {
    /// Path of the converted `.22000` file.
    pub path: PathBuf,
    /// Failed upload attempts so far.
    pub attempts: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedCapture {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            attempts: 0,
            enqueued_at: Utc::now(),
        }
    }
}
