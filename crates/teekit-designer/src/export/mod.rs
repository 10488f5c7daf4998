//! Asynchronous export pipeline.
//!
//! Jobs are queued with [`ExportQueue`], picked up by the
//! [`ExportScheduler`] and rendered on blocking worker threads from an
//! immutable document snapshot. Every transition is published as an
//! [`ExportEvent`](crate::events::ExportEvent).

pub mod job;
pub mod queue;
pub mod scheduler;
pub mod settings;
pub mod snapshot;

pub use job::{artifact_file_name, Artifact, ErrorInfo, ErrorKind, ExportJob, JobId, JobStatus};
pub use queue::{ClaimedJob, ExportQueue};
pub use scheduler::ExportScheduler;
pub use settings::{Background, ExportFormat, ExportSettings, Sizing, BLEED_INCHES};
pub use snapshot::{DocumentSlot, RenderSnapshot};
