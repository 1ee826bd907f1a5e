use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use strum::{Display, EnumString};

/// Status of a cracking job on the remote server.
///
/// `Completed` and `Error` are terminal: the job is dropped from the
/// registry once either is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

/// A submitted cracking job, tracked locally until it reaches a terminal
/// state.
#[derive(Debug, Clone)]
pub struct JobRecord {
    /// Server-issued opaque job identifier.
    pub job_id: String,
    /// Converted capture file this job was created from.
    pub source: PathBuf,
    pub status: JobStatus,
    pub progress: Option<String>,
    pub message: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(job_id: String, source: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            source,
            status: JobStatus::Queued,
            progress: None,
            message: None,
            submitted_at: now,
            updated_at: now,
        }
    }
}

/// Body of `GET /status/{job_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusReport {
    pub status: String,
    /// The server sends progress as either a string or a number.
    #[serde(default, deserialize_with = "lenient_string")]
    pub progress: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusReport {
    /// Parse the server's status string. Unknown strings yield `None` and
    /// leave the tracked status untouched — the server owns the vocabulary.
    pub fn parsed_status(&self) -> Option<JobStatus> {
        self.status.parse().ok()
    }
}

/// One entry of the server's job-list endpoint. Unknown fields ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSummary {
    #[serde(deserialize_with = "required_lenient_string")]
    pub id: String,
    pub title: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }))
}

fn required_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match lenient_string(deserializer)? {
        Some(s) => Ok(s),
        None => Err(serde::de::Error::custom("missing id")),
    }
}
