//! Export job queue.
//!
//! The queue is the only state shared between the session and the render
//! workers. Each job remembers the document slot it was queued from, so
//! closing or replacing the session's document does not affect it.

use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use teekit_core::{EventBus, ExportError, NotFoundError, RenderError, Result};

use super::job::{Artifact, ErrorInfo, ExportJob, JobId, JobStatus};
use super::settings::ExportSettings;
use super::snapshot::DocumentSlot;
use crate::events::{EditorEvent, ExportEvent};
use crate::model::AreaId;

struct QueueEntry {
    job: ExportJob,
    source: DocumentSlot,
    cancel: Arc<AtomicBool>,
}

/// A job handed to a worker
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub id: JobId,
    pub target_areas: Vec<AreaId>,
    pub settings: ExportSettings,
    pub file_name: String,
    pub source: DocumentSlot,
    pub cancel: Arc<AtomicBool>,
}

pub struct ExportQueue {
    entries: RwLock<Vec<QueueEntry>>,
    next_id: AtomicU64,
    /// Wakes the dispatcher when a pending job appears
    job_added: Notify,
    /// Wakes `wait_for` callers on any job change
    changed: Notify,
    events: Option<Arc<EventBus<EditorEvent>>>,
}

impl ExportQueue {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            job_added: Notify::new(),
            changed: Notify::new(),
            events: None,
        }
    }

    /// Publish every job transition on `bus`
    pub fn with_events(bus: Arc<EventBus<EditorEvent>>) -> Self {
        Self {
            events: Some(bus),
            ..Self::new()
        }
    }

    fn allocate_id(&self) -> JobId {
        JobId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn publish(&self, event: ExportEvent) {
        self.changed.notify_waiters();
        if let Some(bus) = &self.events {
            // Nobody listening is fine
            let _ = bus.publish(EditorEvent::Export(event));
        }
    }

    fn push(&self, job: ExportJob, source: DocumentSlot) -> JobId {
        let id = job.id;
        let snapshot = job.clone();
        self.entries.write().push(QueueEntry {
            job,
            source,
            cancel: Arc::new(AtomicBool::new(false)),
        });
        self.job_added.notify_one();
        self.publish(ExportEvent::JobUpdated(snapshot));
        id
    }

    /// Queue one job rendering `areas` onto a single sheet
    pub fn submit(
        &self,
        areas: &[AreaId],
        settings: ExportSettings,
        file_prefix: &str,
        source: DocumentSlot,
    ) -> Result<JobId> {
        settings.validate()?;
        if areas.is_empty() {
            return Err(ExportError::InvalidSettings {
                reason: "no target areas".to_string(),
            }
            .into());
        }
        if file_prefix.trim().is_empty() {
            return Err(ExportError::InvalidSettings {
                reason: "empty file prefix".to_string(),
            }
            .into());
        }

        let mut targets: Vec<AreaId> = Vec::with_capacity(areas.len());
        for area in areas {
            if !targets.contains(area) {
                targets.push(*area);
            }
        }

        let job = ExportJob::new(self.allocate_id(), targets, settings, file_prefix.to_string());
        tracing::info!("Queued export job {} ({})", job.id, job.file_name);
        Ok(self.push(job, source))
    }

    /// Queue one job per area with shared settings and prefix
    pub fn submit_all(
        &self,
        settings: ExportSettings,
        file_prefix: &str,
        source: DocumentSlot,
    ) -> Result<Vec<JobId>> {
        AreaId::ALL
            .iter()
            .map(|area| {
                self.submit(
                    std::slice::from_ref(area),
                    settings.clone(),
                    file_prefix,
                    source.clone(),
                )
            })
            .collect()
    }

    /// All jobs in submission order
    pub fn get_jobs(&self) -> Vec<ExportJob> {
        self.entries.read().iter().map(|e| e.job.clone()).collect()
    }

    pub fn get_job(&self, id: JobId) -> Option<ExportJob> {
        self.entries
            .read()
            .iter()
            .find(|e| e.job.id == id)
            .map(|e| e.job.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Delete a pending or finished job
    pub fn remove_item(&self, id: JobId) -> Result<ExportJob> {
        let removed = {
            let mut entries = self.entries.write();
            let index = entries
                .iter()
                .position(|e| e.job.id == id)
                .ok_or(NotFoundError::Job { id: id.0 })?;
            if entries[index].job.status == JobStatus::Processing {
                return Err(ExportError::JobBusy { id: id.0 }.into());
            }
            entries.remove(index).job
        };
        tracing::debug!("Removed export job {}", id);
        self.publish(ExportEvent::JobRemoved { id });
        Ok(removed)
    }

    /// Cancel a job. Pending jobs fail immediately; processing jobs are
    /// flagged and fail at the worker's next checkpoint. Finished jobs are
    /// left alone.
    pub fn cancel(&self, id: JobId) -> Result<()> {
        let updated = {
            let mut entries = self.entries.write();
            let entry = entries
                .iter_mut()
                .find(|e| e.job.id == id)
                .ok_or(NotFoundError::Job { id: id.0 })?;
            match entry.job.status {
                JobStatus::Pending => {
                    entry.cancel.store(true, Ordering::SeqCst);
                    Self::mark_failed(&mut entry.job, &RenderError::Cancelled);
                    Some(entry.job.clone())
                }
                JobStatus::Processing => {
                    entry.cancel.store(true, Ordering::SeqCst);
                    None
                }
                JobStatus::Completed | JobStatus::Failed => {
                    tracing::debug!("Job {} already {}; cancel ignored", id, entry.job.status);
                    None
                }
            }
        };
        if let Some(job) = updated {
            tracing::info!("Cancelled pending export job {}", id);
            self.publish(ExportEvent::JobUpdated(job));
        } else {
            tracing::debug!("Cancellation requested for export job {}", id);
        }
        Ok(())
    }

    /// Remove every job, signalling cancellation to those in progress.
    /// Returns the number of jobs removed.
    pub fn clear_queue(&self) -> usize {
        let removed: Vec<JobId> = {
            let mut entries = self.entries.write();
            for entry in entries.iter() {
                entry.cancel.store(true, Ordering::SeqCst);
            }
            entries.drain(..).map(|e| e.job.id).collect()
        };
        tracing::info!("Cleared {} export jobs", removed.len());
        for id in &removed {
            self.publish(ExportEvent::JobRemoved { id: *id });
        }
        removed.len()
    }

    /// Resubmit a failed job under a new id
    pub fn retry(&self, id: JobId) -> Result<JobId> {
        let (job, source) = {
            let entries = self.entries.read();
            let entry = entries
                .iter()
                .find(|e| e.job.id == id)
                .ok_or(NotFoundError::Job { id: id.0 })?;
            if entry.job.status != JobStatus::Failed {
                return Err(ExportError::NotRetryable {
                    id: id.0,
                    status: entry.job.status.to_string(),
                }
                .into());
            }
            (entry.job.resubmission(self.allocate_id()), entry.source.clone())
        };
        tracing::info!(
            "Retrying export job {} as {} (attempt {})",
            id,
            job.id,
            job.attempt
        );
        Ok(self.push(job, source))
    }

    /// Wait until the job is completed or failed
    pub async fn wait_for(&self, id: JobId) -> Result<ExportJob> {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            // Register before checking so a transition in between is not missed
            notified.as_mut().enable();

            match self.get_job(id) {
                Some(job) if job.is_terminal() => return Ok(job),
                Some(_) => {}
                None => return Err(NotFoundError::Job { id: id.0 }.into()),
            }
            notified.await;
        }
    }

    pub(crate) async fn job_added(&self) {
        self.job_added.notified().await;
    }

    /// Move the oldest pending job to processing
    pub(crate) fn claim_next(&self) -> Option<ClaimedJob> {
        let (claimed, snapshot) = {
            let mut entries = self.entries.write();
            let entry = entries
                .iter_mut()
                .find(|e| e.job.status == JobStatus::Pending)?;
            entry.job.status = JobStatus::Processing;
            entry.job.started_at = Some(Utc::now());
            let claimed = ClaimedJob {
                id: entry.job.id,
                target_areas: entry.job.target_areas.clone(),
                settings: entry.job.settings.clone(),
                file_name: entry.job.file_name.clone(),
                source: entry.source.clone(),
                cancel: Arc::clone(&entry.cancel),
            };
            (claimed, entry.job.clone())
        };
        tracing::info!("Processing export job {}", claimed.id);
        self.publish(ExportEvent::JobUpdated(snapshot));
        Some(claimed)
    }

    /// Record progress for a processing job. Progress never goes backwards
    /// and stays below 100 until completion. Returns false if the job is
    /// gone or no longer processing.
    pub(crate) fn update_progress(
        &self,
        id: JobId,
        progress: u8,
        time_remaining_ms: Option<u64>,
    ) -> bool {
        let snapshot = {
            let mut entries = self.entries.write();
            let Some(entry) = entries.iter_mut().find(|e| e.job.id == id) else {
                return false;
            };
            if entry.job.status != JobStatus::Processing {
                return false;
            }
            let progress = progress.min(99);
            if progress <= entry.job.progress {
                return true;
            }
            entry.job.progress = progress;
            entry.job.time_remaining_ms = time_remaining_ms;
            entry.job.clone()
        };
        self.publish(ExportEvent::JobUpdated(snapshot));
        true
    }

    pub(crate) fn complete(&self, id: JobId, artifact: Artifact) {
        let snapshot = {
            let mut entries = self.entries.write();
            let Some(entry) = entries.iter_mut().find(|e| e.job.id == id) else {
                tracing::debug!("Dropping result for removed export job {}", id);
                return;
            };
            if entry.job.status != JobStatus::Processing {
                return;
            }
            entry.job.status = JobStatus::Completed;
            entry.job.progress = 100;
            entry.job.time_remaining_ms = Some(0);
            entry.job.finished_at = Some(Utc::now());
            entry.job.artifact = Some(artifact);
            entry.job.clone()
        };
        tracing::info!(
            "Export job {} completed ({} bytes)",
            id,
            snapshot.artifact.as_ref().map(|a| a.byte_size).unwrap_or(0)
        );
        self.publish(ExportEvent::JobUpdated(snapshot));
    }

    pub(crate) fn fail(&self, id: JobId, err: &RenderError) {
        let snapshot = {
            let mut entries = self.entries.write();
            let Some(entry) = entries.iter_mut().find(|e| e.job.id == id) else {
                tracing::debug!("Dropping failure for removed export job {}", id);
                return;
            };
            if entry.job.is_terminal() {
                return;
            }
            Self::mark_failed(&mut entry.job, err);
            entry.job.clone()
        };
        tracing::warn!("Export job {} failed: {}", id, err);
        self.publish(ExportEvent::JobUpdated(snapshot));
    }

    fn mark_failed(job: &mut ExportJob, err: &RenderError) {
        job.status = JobStatus::Failed;
        job.time_remaining_ms = None;
        job.finished_at = Some(Utc::now());
        job.error = Some(ErrorInfo::from(err));
    }
}

impl Default for ExportQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExportQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportQueue")
            .field("jobs", &self.len())
            .finish()
    }
}
