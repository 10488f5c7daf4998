//! Export job records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use teekit_core::RenderError;

use super::settings::{ExportFormat, ExportSettings};
use crate::model::AreaId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Failure category recorded on a failed job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    UnsupportedFormat,
    MissingSource,
    MissingFont,
    CanvasTooLarge,
    Encode,
    Cancelled,
    Timeout,
    Worker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&RenderError> for ErrorInfo {
    fn from(err: &RenderError) -> Self {
        let kind = match err {
            RenderError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            RenderError::MissingSource { .. } => ErrorKind::MissingSource,
            RenderError::MissingFont { .. } => ErrorKind::MissingFont,
            RenderError::CanvasTooLarge { .. } => ErrorKind::CanvasTooLarge,
            RenderError::Encode { .. } => ErrorKind::Encode,
            RenderError::Cancelled => ErrorKind::Cancelled,
            RenderError::Timeout { .. } => ErrorKind::Timeout,
            RenderError::Worker { .. } => ErrorKind::Worker,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Encoded output of a completed job
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub bytes: Arc<Vec<u8>>,
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
    pub byte_size: usize,
    pub file_name: String,
}

/// `{prefix}-{area}-{area}….{ext}`
pub fn artifact_file_name(prefix: &str, areas: &[AreaId], format: ExportFormat) -> String {
    let mut name = prefix.to_string();
    for area in areas {
        name.push('-');
        name.push_str(area.as_str());
    }
    name.push('.');
    name.push_str(format.extension());
    name
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub id: JobId,
    pub target_areas: Vec<AreaId>,
    pub settings: ExportSettings,
    pub status: JobStatus,
    /// 0..=100, reaches 100 only on completion
    pub progress: u8,
    /// Estimated milliseconds left while processing
    pub time_remaining_ms: Option<u64>,
    pub file_name: String,
    pub file_prefix: String,
    pub artifact: Option<Artifact>,
    pub error: Option<ErrorInfo>,
    /// 1 for an original submission, +1 per retry
    pub attempt: u32,
    pub retried_from: Option<JobId>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExportJob {
    pub(crate) fn new(
        id: JobId,
        target_areas: Vec<AreaId>,
        settings: ExportSettings,
        file_prefix: String,
    ) -> Self {
        let file_name = artifact_file_name(&file_prefix, &target_areas, settings.format);
        Self {
            id,
            target_areas,
            settings,
            status: JobStatus::Pending,
            progress: 0,
            time_remaining_ms: None,
            file_name,
            file_prefix,
            artifact: None,
            error: None,
            attempt: 1,
            retried_from: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Fresh pending copy of a failed job
    pub(crate) fn resubmission(&self, id: JobId) -> Self {
        let mut job = Self::new(
            id,
            self.target_areas.clone(),
            self.settings.clone(),
            self.file_prefix.clone(),
        );
        job.attempt = self.attempt + 1;
        job.retried_from = Some(self.id);
        job
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
