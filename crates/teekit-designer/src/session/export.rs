//! Export requests and queue management.

use std::sync::Arc;

use teekit_core::{NotFoundError, Result};

use super::EditorSession;
use crate::export::{ExportJob, ExportScheduler, ExportSettings, JobId};
use crate::model::AreaId;
use crate::renderer::Renderer;

impl EditorSession {
    /// Start the export dispatcher on the current tokio runtime if it is
    /// not already running
    pub fn ensure_scheduler(&mut self) -> Result<()> {
        if self.scheduler.as_ref().is_some_and(|s| s.is_running()) {
            return Ok(());
        }
        let scheduler = ExportScheduler::start(
            Arc::clone(&self.queue),
            Arc::clone(&self.images),
            Arc::clone(&self.renderers),
            Arc::clone(&self.export_permits),
            self.config.export.clone(),
        )?;
        self.scheduler = Some(scheduler);
        Ok(())
    }

    /// Settings built from the configured export defaults
    pub fn default_export_settings(&self) -> Result<ExportSettings> {
        Ok(ExportSettings::from_defaults(&self.config.export_defaults)?)
    }

    /// Queue one job rendering `areas` of the open document
    pub fn request_export(&mut self, areas: &[AreaId], settings: ExportSettings) -> Result<JobId> {
        let prefix = self.config.export_defaults.file_prefix.clone();
        self.request_export_with_prefix(areas, settings, &prefix)
    }

    pub fn request_export_with_prefix(
        &mut self,
        areas: &[AreaId],
        settings: ExportSettings,
        file_prefix: &str,
    ) -> Result<JobId> {
        let source = self.slot()?.clone();
        let id = self.queue.submit(areas, settings, file_prefix, source)?;
        self.start_dispatch();
        Ok(id)
    }

    /// Queue one job per area, named `{prefix}-{area}.{ext}`
    pub fn export_all(&mut self, settings: ExportSettings, file_prefix: &str) -> Result<Vec<JobId>> {
        let source = self.slot()?.clone();
        let ids = self.queue.submit_all(settings, file_prefix, source)?;
        self.start_dispatch();
        Ok(ids)
    }

    pub fn get_jobs(&self) -> Vec<ExportJob> {
        self.queue.get_jobs()
    }

    pub fn get_job(&self, id: JobId) -> Result<ExportJob> {
        self.queue
            .get_job(id)
            .ok_or_else(|| NotFoundError::Job { id: id.0 }.into())
    }

    pub fn cancel_export(&self, id: JobId) -> Result<()> {
        self.queue.cancel(id)
    }

    pub fn remove_export(&self, id: JobId) -> Result<ExportJob> {
        self.queue.remove_item(id)
    }

    /// Drop every job; processing ones are asked to stop
    pub fn clear_export_queue(&self) -> usize {
        self.queue.clear_queue()
    }

    /// Resubmit a failed job under a new id
    pub fn retry_export(&mut self, id: JobId) -> Result<JobId> {
        let new_id = self.queue.retry(id)?;
        self.start_dispatch();
        Ok(new_id)
    }

    /// Wait until the job reaches a terminal state
    pub async fn wait_for_job(&self, id: JobId) -> Result<ExportJob> {
        self.queue.wait_for(id).await
    }

    /// Add or replace the renderer for its format. Jobs that have not
    /// started yet use the new renderer.
    pub fn register_renderer(&mut self, renderer: Arc<dyn Renderer>) {
        tracing::debug!("Registered renderer for {}", renderer.format());
        self.renderers.write().register(renderer);
    }

    fn start_dispatch(&mut self) {
        if let Err(e) = self.ensure_scheduler() {
            tracing::warn!("Export jobs stay pending: {}", e);
        }
    }
}

