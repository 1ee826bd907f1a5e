use reqwest::multipart;
use reqwest::StatusCode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::CourierConfig;
use crate::models::job::{JobSummary, StatusReport};

/// HTTP client for the remote cracking server.
pub struct CrackerClient {
    http: reqwest::Client,
    base_url: String,
    jobs_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    job_id: Option<String>,
}

impl CrackerClient {
    /// Build the client with an explicit request timeout so a dead server
    /// cannot stall the host's event delivery indefinitely.
    pub fn new(config: &CourierConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            jobs_url: config.jobs_url(),
        })
    }

    /// Upload a converted capture to `{server}/upload` as multipart form
    /// field `capture`. Returns the server-issued job identifier.
    pub async fn upload(&self, file: &Path) -> Result<String, UploadError> {
        let metadata = tokio::fs::metadata(file)
            .await
            .map_err(|source| UploadError::UnreadableFile {
                path: file.to_path_buf(),
                source,
            })?;
        if metadata.len() == 0 {
            return Err(UploadError::EmptyFile(file.to_path_buf()));
        }

        let bytes = tokio::fs::read(file)
            .await
            .map_err(|source| UploadError::UnreadableFile {
                path: file.to_path_buf(),
                source,
            })?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "capture.22000".to_string());

        let form =
            multipart::Form::new().part("capture", multipart::Part::bytes(bytes).file_name(file_name));

        let url = format!("{}/upload", self.base_url);
        tracing::debug!(file = %file.display(), url = %url, "uploading capture");

        let response = self.http.post(&url).multipart(form).send().await?;
        if response.status() != StatusCode::OK {
            return Err(UploadError::UnexpectedStatus {
                status: response.status(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: UploadResponse = response.json().await?;
        body.job_id.ok_or(UploadError::MissingJobId)
    }

    /// Fetch the status of a single job from `{server}/status/{job_id}`.
    pub async fn job_status(&self, job_id: &str) -> Result<StatusReport, StatusError> {
        let url = format!("{}/status/{}", self.base_url, job_id);
        let response = self.http.get(&url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(StatusError::UnexpectedStatus {
                status: response.status(),
            });
        }
        Ok(response.json().await?)
    }

    /// Fetch the server's job list.
    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>, StatusError> {
        let response = self.http.get(&self.jobs_url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(StatusError::UnexpectedStatus {
                status: response.status(),
            });
        }
        Ok(response.json().await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upload rejected with status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("upload response did not contain a job_id")]
    MissingJobId,

    #[error("cannot read {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("refusing to upload empty file {0}")]
    EmptyFile(PathBuf),
}

impl UploadError {
    /// Failures tied to the file itself can never succeed on retry.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            UploadError::UnreadableFile { .. } | UploadError::EmptyFile(_)
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("status request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("status request rejected with status {status}")]
    UnexpectedStatus { status: StatusCode },
}
