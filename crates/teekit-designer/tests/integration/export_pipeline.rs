use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use teekit_core::{Error, ExportError, RenderError};
use teekit_designer::{
    ApproximateMeasurer, AreaId, EditorSession, ElementInit, ErrorKind, ExportFormat,
    ExportSettings, JobStatus, RasterRenderer, RenderContext, RenderOutput, RenderRequest,
    Renderer, Sizing,
};
use teekit_settings::Config;

/// Renderer that only finishes when cancelled or timed out
struct SlowRenderer;

impl Renderer for SlowRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Png
    }

    fn render(
        &self,
        _request: &RenderRequest<'_>,
        ctx: &RenderContext,
    ) -> Result<RenderOutput, RenderError> {
        loop {
            ctx.checkpoint()?;
            ctx.report(1, 2);
            std::thread::sleep(Duration::from_millis(2));
        }
    }
}

/// Renderer that records how many renders overlap
#[derive(Clone, Default)]
struct CountingRenderer {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Renderer for CountingRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Png
    }

    fn render(
        &self,
        _request: &RenderRequest<'_>,
        ctx: &RenderContext,
    ) -> Result<RenderOutput, RenderError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        for step in 0..10 {
            if let Err(err) = ctx.checkpoint() {
                self.active.fetch_sub(1, Ordering::SeqCst);
                return Err(err);
            }
            ctx.report(step, 10);
            std::thread::sleep(Duration::from_millis(3));
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(RenderOutput {
            bytes: vec![0],
            width: 1,
            height: 1,
        })
    }
}

fn session_with(config: Config) -> EditorSession {
    let mut session = EditorSession::with_measurer(config, Arc::new(ApproximateMeasurer));
    session.new_document("Export");
    session
}

fn session() -> EditorSession {
    session_with(Config::default())
}

fn add_swatch(session: &mut EditorSession, area: AreaId, x: f64, y: f64) {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([10, 120, 200, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    let source = session.images().ingest(&bytes, Some("image/png")).unwrap();
    session
        .add_element(area, ElementInit::image(source).at(x, y))
        .unwrap();
}

#[tokio::test]
async fn test_png_export_at_300_dpi() {
    let mut session = session();
    add_swatch(&mut session, AreaId::Front, 20.0, 20.0);

    let id = session
        .request_export(&[AreaId::Front], ExportSettings::new(ExportFormat::Png, 300))
        .unwrap();
    let job = session.wait_for_job(id).await.unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert!(job.error.is_none());
    let artifact = job.artifact.unwrap();
    assert_eq!(artifact.format, ExportFormat::Png);
    assert_eq!(artifact.dpi, 300);
    assert_eq!((artifact.width, artifact.height), (625, 782));
    assert_eq!(artifact.byte_size, artifact.bytes.len());
    assert!(artifact.bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    assert_eq!(artifact.file_name, "tshirt-design-front.png");
}

#[tokio::test]
async fn test_export_all_names_files_per_area() {
    let mut session = session();
    let settings = ExportSettings {
        sizing: Sizing::Original,
        ..ExportSettings::new(ExportFormat::Jpeg, 72)
    };
    let ids = session.export_all(settings, "tee").unwrap();
    assert_eq!(ids.len(), 4);

    let mut names = Vec::new();
    for id in ids {
        let job = session.wait_for_job(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        names.push(job.file_name);
    }
    assert_eq!(
        names,
        vec![
            "tee-front.jpg",
            "tee-back.jpg",
            "tee-left-sleeve.jpg",
            "tee-right-sleeve.jpg"
        ]
    );
}

#[tokio::test]
async fn test_pdf_fails_without_renderer() {
    let mut session = session();
    let id = session
        .request_export(&[AreaId::Back], ExportSettings::new(ExportFormat::Pdf, 150))
        .unwrap();
    let job = session.wait_for_job(id).await.unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.unwrap().kind, ErrorKind::UnsupportedFormat);
    assert!(job.artifact.is_none());
}

#[tokio::test]
async fn test_text_without_font_fails_job() {
    let mut session = session();
    session.register_renderer(Arc::new(
        RasterRenderer::new(ExportFormat::Png, Arc::new(ApproximateMeasurer))
            .with_font_resolver(|_, _, _| None),
    ));
    session
        .add_element(AreaId::Front, ElementInit::text("Hi"))
        .unwrap();

    let id = session
        .request_export(&[AreaId::Front], ExportSettings::new(ExportFormat::Png, 72))
        .unwrap();
    let job = session.wait_for_job(id).await.unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.unwrap().kind, ErrorKind::MissingFont);
    assert!(job.artifact.is_none());
}

#[tokio::test]
async fn test_invalid_requests_rejected_up_front() {
    let mut session = session();
    let err = session
        .request_export(&[AreaId::Front], ExportSettings::new(ExportFormat::Png, 20))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Export(ExportError::InvalidSettings { .. })
    ));
    assert!("tiff".parse::<ExportFormat>().is_err());
    assert!(session.get_jobs().is_empty());
}

#[tokio::test]
async fn test_cancel_processing_job() {
    let mut session = session();
    session.register_renderer(Arc::new(SlowRenderer));

    let id = session
        .request_export(&[AreaId::Front], ExportSettings::new(ExportFormat::Png, 72))
        .unwrap();
    for _ in 0..200 {
        if session.get_job(id).unwrap().status == JobStatus::Processing {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(matches!(
        session.remove_export(id),
        Err(Error::Export(ExportError::JobBusy { .. }))
    ));

    session.cancel_export(id).unwrap();
    let job = session.wait_for_job(id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.unwrap().kind, ErrorKind::Cancelled);
    assert!(job.progress < 100);

    session.remove_export(id).unwrap();
    assert!(session.get_jobs().is_empty());
}

#[tokio::test]
async fn test_timeout_then_retry() {
    let mut config = Config::default();
    config.export.job_timeout_ms = 20;
    let mut session = session_with(config);
    session.register_renderer(Arc::new(SlowRenderer));

    let id = session
        .request_export(&[AreaId::Front], ExportSettings::new(ExportFormat::Png, 72))
        .unwrap();
    let job = session.wait_for_job(id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.unwrap().kind, ErrorKind::Timeout);

    let retry = session.retry_export(id).unwrap();
    assert_ne!(retry, id);
    let resubmitted = session.get_job(retry).unwrap();
    assert_eq!(resubmitted.attempt, 2);
    assert_eq!(resubmitted.retried_from, Some(id));
    assert_eq!(resubmitted.target_areas, vec![AreaId::Front]);

    let job = session.wait_for_job(retry).await.unwrap();
    assert_eq!(job.error.unwrap().kind, ErrorKind::Timeout);
}

#[tokio::test]
async fn test_completed_job_is_not_retryable() {
    let mut session = session();
    let id = session
        .request_export(&[AreaId::Front], ExportSettings::new(ExportFormat::Svg, 96))
        .unwrap();
    session.wait_for_job(id).await.unwrap();
    assert!(matches!(
        session.retry_export(id),
        Err(Error::Export(ExportError::NotRetryable { .. }))
    ));
}

#[tokio::test]
async fn test_jobs_render_the_document_they_were_queued_from() {
    let mut session = session();
    session
        .add_element(AreaId::Front, ElementInit::text("first"))
        .unwrap();
    let id = session
        .request_export(&[AreaId::Front], ExportSettings::new(ExportFormat::Svg, 96))
        .unwrap();

    // Closing and opening another document does not affect the job
    session.new_document("Other");
    let job = session.wait_for_job(id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_progress_is_monotonic() {
    let mut session = session();
    for i in 0..5 {
        add_swatch(&mut session, AreaId::Front, 10.0 * i as f64, 10.0);
    }

    let mut receiver = session.events().receiver();
    let id = session
        .request_export(&[AreaId::Front], ExportSettings::new(ExportFormat::Png, 150))
        .unwrap();
    session.wait_for_job(id).await.unwrap();

    let mut last = 0;
    while let Ok(event) = receiver.try_recv() {
        if let teekit_designer::EditorEvent::Export(teekit_designer::ExportEvent::JobUpdated(job)) =
            event
        {
            if job.id == id {
                assert!(job.progress >= last);
                last = job.progress;
            }
        }
    }
    assert_eq!(last, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_renderer_swap_keeps_concurrency_cap() {
    let mut config = Config::default();
    config.export.max_concurrent_jobs = 1;
    let mut session = session_with(config);
    let counting = CountingRenderer::default();
    session.register_renderer(Arc::new(counting.clone()));

    let first = session
        .request_export(&[AreaId::Front], ExportSettings::new(ExportFormat::Png, 72))
        .unwrap();
    for _ in 0..200 {
        if session.get_job(first).unwrap().status == JobStatus::Processing {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    // Swap while the first job is still rendering
    session.register_renderer(Arc::new(counting.clone()));
    let mut ids = vec![first];
    for area in [AreaId::Back, AreaId::LeftSleeve] {
        ids.push(
            session
                .request_export(&[area], ExportSettings::new(ExportFormat::Png, 72))
                .unwrap(),
        );
    }

    for id in ids {
        let job = session.wait_for_job(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }
    assert_eq!(counting.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_clear_queue() {
    let mut session = session();
    session.register_renderer(Arc::new(SlowRenderer));
    session
        .request_export(&[AreaId::Front], ExportSettings::new(ExportFormat::Png, 72))
        .unwrap();
    session
        .request_export(&[AreaId::Back], ExportSettings::new(ExportFormat::Png, 72))
        .unwrap();

    assert_eq!(session.clear_export_queue(), 2);
    assert!(session.get_jobs().is_empty());
}
