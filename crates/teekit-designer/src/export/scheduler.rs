//! Dispatches pending export jobs to a bounded pool of render workers.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use teekit_core::{ExportError, RenderError};
use teekit_settings::ExportPipelineSettings;

use super::job::Artifact;
use super::queue::{ClaimedJob, ExportQueue};
use super::snapshot::RenderSnapshot;
use crate::image_store::ImageStore;
use crate::renderer::{RenderContext, RenderRequest, RendererRegistry};

/// Background dispatcher. Dropping it stops dispatching new jobs; jobs
/// already running finish on their own and keep their worker permit, so a
/// scheduler restarted with the same permits never exceeds the cap.
pub struct ExportScheduler {
    dispatcher: JoinHandle<()>,
    settings: ExportPipelineSettings,
}

#[derive(Clone)]
struct WorkerShared {
    queue: Arc<ExportQueue>,
    images: Arc<ImageStore>,
    renderers: Arc<RwLock<RendererRegistry>>,
    timeout: Duration,
    max_output_pixels: u64,
}

impl ExportScheduler {
    /// Worker permits for `settings.max_concurrent_jobs`
    pub fn permits(settings: &ExportPipelineSettings) -> Arc<Semaphore> {
        Arc::new(Semaphore::new(settings.max_concurrent_jobs.max(1)))
    }

    /// Start dispatching on the current tokio runtime. Renderers are looked
    /// up when each job starts, so registry changes apply to later jobs.
    pub fn start(
        queue: Arc<ExportQueue>,
        images: Arc<ImageStore>,
        renderers: Arc<RwLock<RendererRegistry>>,
        permits: Arc<Semaphore>,
        settings: ExportPipelineSettings,
    ) -> Result<Self, ExportError> {
        let handle = Handle::try_current().map_err(|_| ExportError::SchedulerStopped)?;
        let shared = WorkerShared {
            queue,
            images,
            renderers,
            timeout: Duration::from_millis(settings.job_timeout_ms),
            max_output_pixels: settings.max_output_pixels,
        };
        tracing::debug!(
            "Export scheduler started ({} workers, {}ms timeout)",
            settings.max_concurrent_jobs,
            settings.job_timeout_ms
        );
        let dispatcher = handle.spawn(dispatch(shared, permits));
        Ok(Self {
            dispatcher,
            settings,
        })
    }

    pub fn is_running(&self) -> bool {
        !self.dispatcher.is_finished()
    }
}

impl Drop for ExportScheduler {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

impl std::fmt::Debug for ExportScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportScheduler")
            .field("settings", &self.settings)
            .field("running", &self.is_running())
            .finish()
    }
}

async fn dispatch(shared: WorkerShared, permits: Arc<Semaphore>) {
    loop {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            return;
        };
        let job = loop {
            if let Some(job) = shared.queue.claim_next() {
                break job;
            }
            shared.queue.job_added().await;
        };
        let shared = shared.clone();
        tokio::spawn(async move {
            run_job(shared, job).await;
            drop(permit);
        });
    }
}

async fn run_job(shared: WorkerShared, job: ClaimedJob) {
    let id = job.id;
    let started = Instant::now();
    let timeout_ms = shared.timeout.as_millis() as u64;

    let renderer = shared.renderers.read().get(job.settings.format);
    let Some(renderer) = renderer else {
        shared.queue.fail(
            id,
            &RenderError::UnsupportedFormat {
                format: job.settings.format.to_string(),
            },
        );
        return;
    };

    let snapshot = RenderSnapshot::capture(&job.source, &shared.images);
    let progress_queue = Arc::clone(&shared.queue);
    let ctx = RenderContext::new(
        Arc::clone(&job.cancel),
        Some(started + shared.timeout),
        timeout_ms,
        move |percent| {
            let elapsed = started.elapsed().as_millis() as u64;
            let remaining = (percent > 0)
                .then(|| elapsed * (100 - percent as u64) / percent as u64);
            progress_queue.update_progress(id, percent, remaining);
        },
    );

    let areas = job.target_areas.clone();
    let settings = job.settings.clone();
    let max_output_pixels = shared.max_output_pixels;
    let render = tokio::task::spawn_blocking(move || {
        let request = RenderRequest {
            snapshot: &snapshot,
            areas: &areas,
            settings: &settings,
            max_output_pixels,
        };
        renderer.render(&request, &ctx)
    });

    let result = match tokio::time::timeout(shared.timeout, render).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(RenderError::Worker {
            reason: join_error.to_string(),
        }),
        Err(_) => {
            // The blocking render stops at its next checkpoint
            job.cancel.store(true, std::sync::atomic::Ordering::SeqCst);
            Err(RenderError::Timeout { timeout_ms })
        }
    };

    match result {
        Ok(output) => {
            let byte_size = output.bytes.len();
            tracing::debug!(
                "Rendered job {} at {}x{} in {:?}",
                id,
                output.width,
                output.height,
                started.elapsed()
            );
            shared.queue.complete(
                id,
                Artifact {
                    bytes: Arc::new(output.bytes),
                    format: job.settings.format,
                    width: output.width,
                    height: output.height,
                    dpi: job.settings.dpi,
                    byte_size,
                    file_name: job.file_name.clone(),
                },
            );
        }
        Err(err) => shared.queue.fail(id, &err),
    }
}
