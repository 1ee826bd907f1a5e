use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::display::RunningJob;
use crate::plugin::CourierState;
use crate::services::registry::AppliedStatus;

/// Spawn the background status poller.
///
/// Runs until the stop signal flips, checking it again at every sleep
/// boundary. Each cycle polls every outstanding job and refreshes the
/// server job list; the poller is the single source of display data, so
/// UI refreshes never touch the network themselves.
pub fn spawn(state: Arc<CourierState>, mut stop: watch::Receiver<bool>) -> JoinHandle<()> {
    let interval = Duration::from_secs(state.config.poll_interval_secs);
    tokio::spawn(async move {
        tracing::debug!(interval_secs = interval.as_secs(), "status poller started");
        loop {
            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(interval) => {
                    poll_once(&state).await;
                }
            }
        }
        tracing::debug!("status poller stopped");
    })
}

/// One poll cycle. Public so hosts (and tests) can drive the poller
/// manually instead of waiting out the interval.
pub async fn poll_once(state: &CourierState) {
    for job_id in state.registry.ids() {
        match state.client.job_status(&job_id).await {
            Ok(report) => match state.registry.apply_report(&job_id, &report) {
                Some(AppliedStatus::Finished(record)) => {
                    tracing::info!(
                        job_id = %record.job_id,
                        status = %record.status,
                        file = %record.source.display(),
                        "job finished"
                    );
                    state.update_view(|view| {
                        view.last_event = Some(format!("Job {} {}", record.job_id, record.status));
                    });
                }
                Some(AppliedStatus::Updated(record)) => {
                    tracing::debug!(
                        job_id = %record.job_id,
                        status = %record.status,
                        progress = record.progress.as_deref().unwrap_or("-"),
                        "job status updated"
                    );
                }
                None => {}
            },
            Err(e) => {
                // Keep the job; a failing status endpoint is polled again
                // next cycle.
                tracing::warn!(job_id = %job_id, error = %e, "status check failed");
                state.update_view(|view| {
                    view.last_event = Some(format!("Status check failed for {job_id}"));
                });
            }
        }
    }

    let running = state.registry.running_job().map(|record| RunningJob {
        job_id: record.job_id,
        progress: record.progress,
    });
    state.update_view(|view| view.running = running);

    match state.client.list_jobs().await {
        Ok(jobs) => state.update_view(|view| view.jobs = jobs),
        Err(e) => {
            tracing::warn!(error = %e, "failed to retrieve job list");
            state.update_view(|view| {
                view.last_event = Some("Failed to retrieve jobs".to_string());
            });
        }
    }
}
