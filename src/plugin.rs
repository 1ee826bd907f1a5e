use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, CourierConfig};
use crate::display::{DisplaySurface, ViewState, UI_ELEMENT, UI_LABEL};
use crate::models::job::JobRecord;
use crate::services::client::CrackerClient;
use crate::services::convert::HcxConverter;
use crate::services::poller;
use crate::services::queue::{RetryDisposition, UploadQueue};
use crate::services::registry::JobRegistry;

/// Initialize structured JSON logging, for hosts that don't install their
/// own subscriber.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .try_init();
}

/// Shared plugin state, constructed once at load with every field
/// initialized.
pub struct CourierState {
    pub config: CourierConfig,
    pub client: CrackerClient,
    pub converter: HcxConverter,
    pub queue: UploadQueue,
    pub registry: JobRegistry,
    view: Mutex<ViewState>,
    /// Serializes drains: a connectivity signal arriving mid-drain waits
    /// for the running drain and then snapshots the remainder, so a file
    /// is never uploaded twice.
    drain_gate: tokio::sync::Mutex<()>,
}

impl CourierState {
    /// Current display state.
    pub fn view(&self) -> ViewState {
        self.view_lock().clone()
    }

    pub(crate) fn update_view<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        f(&mut self.view_lock())
    }

    fn view_lock(&self) -> MutexGuard<'_, ViewState> {
        self.view.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The courier plugin. The host drives it through the lifecycle hooks
/// below; all failures except bad configuration are logged and absorbed.
pub struct Courier {
    state: Arc<CourierState>,
    stop_tx: watch::Sender<bool>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl Courier {
    /// Build the plugin from host configuration and start the status
    /// poller. Must be called on a tokio runtime. Bad connection settings
    /// are the only fatal failure.
    pub fn load(config: CourierConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = CrackerClient::new(&config)?;
        let converter = HcxConverter::new(
            config.convert_tool.clone(),
            Duration::from_secs(config.convert_timeout_secs),
        );

        let state = Arc::new(CourierState {
            config,
            client,
            converter,
            queue: UploadQueue::new(),
            registry: JobRegistry::new(),
            view: Mutex::new(ViewState::default()),
            drain_gate: tokio::sync::Mutex::new(()),
        });

        let (stop_tx, stop_rx) = watch::channel(false);
        let poller = poller::spawn(Arc::clone(&state), stop_rx);

        tracing::info!(server = %state.config.base_url(), "hashcat courier loaded");
        Ok(Self {
            state,
            stop_tx,
            poller: Mutex::new(Some(poller)),
        })
    }

    /// Shared state, exposed for hosts that want to inspect the queue or
    /// registry directly.
    pub fn state(&self) -> &CourierState {
        &self.state
    }

    /// Handshake captured: convert it and queue the result for upload.
    /// A failed conversion drops the handshake.
    pub async fn on_handshake(&self, capture: &Path) {
        tracing::info!(file = %capture.display(), "captured handshake");
        match self.state.converter.convert(capture).await {
            Ok(hash_file) => {
                if self.state.queue.push(hash_file.clone()) {
                    tracing::info!(
                        file = %hash_file.display(),
                        "queued for upload when internet is available"
                    );
                } else {
                    tracing::debug!(file = %hash_file.display(), "already queued");
                }
            }
            Err(e) => {
                tracing::error!(
                    file = %capture.display(),
                    error = %e,
                    "conversion failed, handshake dropped"
                );
            }
        }
    }

    /// Connectivity available: drain the upload queue. Failed uploads
    /// stay queued for the next signal until the attempt cap drops them.
    pub async fn on_internet_available(&self) {
        let state = &self.state;
        let _gate = state.drain_gate.lock().await;

        let snapshot = state.queue.snapshot();
        if snapshot.is_empty() {
            return;
        }
        tracing::info!(queued = snapshot.len(), "internet available, uploading queued files");

        for capture in snapshot {
            match state.client.upload(&capture.path).await {
                Ok(job_id) => {
                    state.queue.remove(&capture.path);
                    state
                        .registry
                        .insert(JobRecord::new(job_id.clone(), capture.path.clone()));
                    tracing::info!(
                        file = %capture.path.display(),
                        job_id = %job_id,
                        "uploaded"
                    );
                    state.update_view(|view| {
                        view.last_event =
                            Some(format!("Uploaded {} (job {})", file_label(&capture.path), job_id));
                    });
                }
                Err(e) if e.is_permanent() => {
                    state.queue.remove(&capture.path);
                    tracing::error!(
                        file = %capture.path.display(),
                        error = %e,
                        "unusable capture dropped"
                    );
                    state.update_view(|view| {
                        view.last_event =
                            Some(format!("Upload failed: {}", file_label(&capture.path)));
                    });
                }
                Err(e) => {
                    match state
                        .queue
                        .record_failure(&capture.path, state.config.max_upload_attempts)
                    {
                        RetryDisposition::Retained { attempts } => {
                            tracing::error!(
                                file = %capture.path.display(),
                                attempts,
                                error = %e,
                                "upload failed, re-queued for next attempt"
                            );
                        }
                        RetryDisposition::Dropped { attempts } => {
                            tracing::error!(
                                file = %capture.path.display(),
                                attempts,
                                error = %e,
                                "upload permanently failed, dropping"
                            );
                        }
                        RetryDisposition::Missing => {}
                    }
                    state.update_view(|view| {
                        view.last_event =
                            Some(format!("Upload failed: {}", file_label(&capture.path)));
                    });
                }
            }
        }
    }

    /// Host UI setup: claim the plugin's display element.
    pub fn on_ui_setup(&self, display: &mut dyn DisplaySurface) {
        display.add_element(UI_ELEMENT, UI_LABEL);
    }

    /// Host UI refresh: render the poller-maintained view. No network
    /// I/O happens here.
    pub fn on_ui_update(&self, display: &mut dyn DisplaySurface) {
        let line = self.state.update_view(|view| view.take_render());
        display.set(UI_ELEMENT, &line);
    }

    /// Run one status-poll cycle immediately instead of waiting out the
    /// poll interval.
    pub async fn poll_now(&self) {
        poller::poll_once(&self.state).await;
    }

    /// Host unload: release the display element and stop the poller,
    /// waiting for it to observe the signal at its next sleep boundary.
    pub async fn unload(&self, display: &mut dyn DisplaySurface) {
        display.remove_element(UI_ELEMENT);
        let _ = self.stop_tx.send(true);
        let handle = self
            .poller
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        tracing::info!("hashcat courier unloaded");
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
