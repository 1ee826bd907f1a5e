use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Extension of capture files the converter accepts.
const CAPTURE_EXT: &str = "pcap";

/// Extension of the hashcat input format produced by the tool.
const HASH_EXT: &str = "22000";

/// Wrapper around the external `hcxpcapngtool` conversion binary.
///
/// Invoked as `<tool> -o <output.22000> <input.pcap>`; zero exit status is
/// the only success signal. A failed conversion is dropped by the caller,
/// never queued or retried.
pub struct HcxConverter {
    tool: String,
    timeout: Duration,
}

impl HcxConverter {
    pub fn new(tool: String, timeout: Duration) -> Self {
        Self { tool, timeout }
    }

    /// Output path for a capture: the input path with its extension
    /// replaced.
    pub fn output_path(capture: &Path) -> PathBuf {
        capture.with_extension(HASH_EXT)
    }

    /// Convert a capture file, blocking until the tool exits or the
    /// timeout elapses.
    pub async fn convert(&self, capture: &Path) -> Result<PathBuf, ConvertError> {
        if capture.extension().and_then(|e| e.to_str()) != Some(CAPTURE_EXT) {
            return Err(ConvertError::UnrecognizedExtension(capture.to_path_buf()));
        }
        tokio::fs::metadata(capture)
            .await
            .map_err(|source| ConvertError::Input {
                path: capture.to_path_buf(),
                source,
            })?;

        let output_file = Self::output_path(capture);
        tracing::debug!(
            tool = %self.tool,
            input = %capture.display(),
            output = %output_file.display(),
            "running conversion tool"
        );

        let run = Command::new(&self.tool)
            .arg("-o")
            .arg(&output_file)
            .arg(capture)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        let output = match tokio::time::timeout(self.timeout, run).await {
            Err(_) => return Err(ConvertError::Timeout(self.timeout.as_secs())),
            Ok(Err(source)) => return Err(ConvertError::Spawn(source)),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(ConvertError::ToolFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output_file)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("not a recognized capture file: {0}")]
    UnrecognizedExtension(PathBuf),

    #[error("cannot read capture {path}: {source}")]
    Input {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to run conversion tool: {0}")]
    Spawn(std::io::Error),

    #[error("conversion tool exited with status {status}: {stderr}")]
    ToolFailed { status: i32, stderr: String },

    #[error("conversion tool did not finish within {0}s")]
    Timeout(u64),
}
