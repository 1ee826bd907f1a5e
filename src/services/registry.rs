use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::models::job::{JobRecord, StatusReport};

/// Outcome of applying a status report to a tracked job.
#[derive(Debug, Clone)]
pub enum AppliedStatus {
    /// Record updated in place; the job stays tracked.
    Updated(JobRecord),
    /// Terminal status observed; the record was removed.
    Finished(JobRecord),
}

/// In-memory map of outstanding cracking jobs, keyed by the server-issued
/// job identifier. Guarded by a mutex; the guard is never held across an
/// await point.
#[derive(Default)]
pub struct JobRegistry {
    inner: Mutex<HashMap<String, JobRecord>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, JobRecord>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Track a freshly submitted job.
    pub fn insert(&self, record: JobRecord) {
        self.lock().insert(record.job_id.clone(), record);
    }

    /// Identifiers of all outstanding jobs, for a poll pass.
    pub fn ids(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Apply a status report. Terminal statuses remove the record;
    /// unknown status strings update progress/message but leave the
    /// tracked status untouched. Returns `None` when the job is no longer
    /// tracked.
    pub fn apply_report(&self, job_id: &str, report: &StatusReport) -> Option<AppliedStatus> {
        let mut jobs = self.lock();
        let record = jobs.get_mut(job_id)?;

        record.updated_at = Utc::now();
        if report.progress.is_some() {
            record.progress = report.progress.clone();
        }
        if report.message.is_some() {
            record.message = report.message.clone();
        }
        let parsed = report.parsed_status();
        if let Some(status) = parsed {
            record.status = status;
        }
        let snapshot = record.clone();

        if parsed.is_some_and(|status| status.is_terminal()) {
            jobs.remove(job_id);
            return Some(AppliedStatus::Finished(snapshot));
        }
        Some(AppliedStatus::Updated(snapshot))
    }

    /// First job currently reported as running, for the display.
    pub fn running_job(&self) -> Option<JobRecord> {
        self.lock()
            .values()
            .find(|r| r.status == crate::models::job::JobStatus::Running)
            .cloned()
    }

    pub fn get(&self, job_id: &str) -> Option<JobRecord> {
        self.lock().get(job_id).cloned()
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.lock().contains_key(job_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
