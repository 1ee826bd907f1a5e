use crate::models::job::JobSummary;

/// Display element key owned by this plugin.
pub const UI_ELEMENT: &str = "cracker";

/// Label shown next to the plugin's display element.
pub const UI_LABEL: &str = "crack";

/// Handle to the host display, supplied by the host on every UI callback.
///
/// Implementations are host-owned; the courier only writes through this
/// seam and never renders anything itself.
pub trait DisplaySurface {
    fn add_element(&mut self, key: &str, label: &str);
    fn remove_element(&mut self, key: &str);
    fn set(&mut self, key: &str, value: &str);
}

/// Currently running job, as last observed by the status poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningJob {
    pub job_id: String,
    pub progress: Option<String>,
}

/// Render state for the plugin's display element.
///
/// Written by the upload path and the status poller, read by
/// `on_ui_update`. The poller is the only component that talks to the
/// server for display data; UI refreshes are pure local renders.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub running: Option<RunningJob>,
    pub jobs: Vec<JobSummary>,
    /// One-shot event message (upload result, poll failure). Shown on the
    /// next UI refresh, then cleared.
    pub last_event: Option<String>,
}

impl ViewState {
    /// Render for the next UI refresh, consuming any pending event.
    pub fn take_render(&mut self) -> String {
        if let Some(event) = self.last_event.take() {
            return event;
        }
        self.render()
    }

    /// Steady-state render: running job progress, else the server job
    /// list, else "No jobs".
    pub fn render(&self) -> String {
        if let Some(job) = &self.running {
            return match &job.progress {
                Some(progress) => format!("{}: {}", job.job_id, progress),
                None => format!("{}: running", job.job_id),
            };
        }
        if !self.jobs.is_empty() {
            return self
                .jobs
                .iter()
                .map(|job| format!("- {} (ID: {})", job.title, job.id))
                .collect::<Vec<_>>()
                .join("\n");
        }
        "No jobs".to_string()
    }
}
