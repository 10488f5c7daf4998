//! Subcommand implementations.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::json;

use teekit::designer::{ElementKind, JobId, Scale};
use teekit::{AreaId, Color, Config, EditorSession, ElementInit, ExportSettings, JobStatus};

use crate::cli::{AddTextArgs, ExportArgs, IngestArgs, InspectArgs, NewArgs};

fn open_design(config: Config, path: &Path) -> Result<EditorSession> {
    let mut session = EditorSession::new(config);
    session
        .load_from_file(path)
        .with_context(|| format!("Failed to load design {}", path.display()))?;
    Ok(session)
}

fn parse_area(area: &str) -> Result<AreaId> {
    area.parse::<AreaId>()
        .with_context(|| format!("Unknown area '{}'", area))
}

pub fn run_new(config: Config, args: &NewArgs) -> Result<()> {
    let mut session = EditorSession::new(config);
    let doc = session.new_document(args.name.clone());
    session
        .save_to_file(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("Created '{}' ({}) at {}", doc.name, doc.id, args.output.display());
    Ok(())
}

pub fn run_inspect(config: Config, args: &InspectArgs) -> Result<()> {
    let session = open_design(config, &args.design)?;
    let doc = session.document_snapshot()?;

    let mut areas = Vec::new();
    for area in doc.areas() {
        let mut elements = Vec::new();
        for element in doc.elements_in(area.id) {
            let bbox = session.bounding_box(element.id)?;
            let summary = match &element.kind {
                ElementKind::Text(text) => text.content.replace('\n', " / "),
                ElementKind::Image(image) => image.source_ref.to_string(),
            };
            elements.push(json!({
                "id": element.id.0,
                "type": element.variant().to_string(),
                "summary": summary,
                "bounds": [bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y],
                "rotation": element.rotation(),
            }));
        }
        areas.push(json!({
            "id": area.id.as_str(),
            "backgroundColor": area.background_color.to_hex(),
            "elements": elements,
        }));
    }
    let report = json!({
        "id": doc.id.to_string(),
        "name": doc.name,
        "createdAt": doc.created_at.to_rfc3339(),
        "lastModifiedAt": doc.last_modified_at.to_rfc3339(),
        "elementCount": doc.element_count(),
        "areas": areas,
    });

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} ({})", doc.name, doc.id);
    for area in report["areas"].as_array().into_iter().flatten() {
        let elements = area["elements"].as_array().map(Vec::len).unwrap_or(0);
        println!(
            "  {:<13} {} element(s), background {}",
            area["id"].as_str().unwrap_or_default(),
            elements,
            area["backgroundColor"].as_str().unwrap_or_default()
        );
        for element in area["elements"].as_array().into_iter().flatten() {
            println!(
                "    #{} {} {}",
                element["id"], element["type"].as_str().unwrap_or_default(),
                element["summary"].as_str().unwrap_or_default()
            );
        }
    }
    Ok(())
}

pub fn run_add_text(config: Config, args: &AddTextArgs) -> Result<()> {
    let mut session = open_design(config, &args.design)?;
    let area = parse_area(&args.area)?;

    let mut init = ElementInit::text(args.content.clone()).at(args.x, args.y);
    if let Some(rotation) = args.rotation {
        init = init.with_rotation(rotation);
    }
    let id = session.add_element(area, init)?;

    let mut patch = teekit::ElementPatch::new();
    if let Some(size) = args.font_size {
        patch = patch.font_size(size);
    }
    if let Some(family) = &args.font_family {
        patch.font_family = Some(family.clone());
    }
    if let Some(fill) = &args.fill {
        patch = patch.fill(Color::parse(fill)?);
    }
    if !patch.is_empty() {
        session.update_element(id, &patch)?;
    }

    session.save_to_file(&args.design)?;
    println!("Added text element #{} to {}", id, area);
    Ok(())
}

pub fn run_ingest(config: Config, args: &IngestArgs) -> Result<()> {
    let mut session = open_design(config, &args.design)?;
    let area = parse_area(&args.area)?;

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("Failed to read image {}", args.image.display()))?;
    let mime = match args
        .image
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => Some("image/png"),
        Some("jpg") | Some("jpeg") => Some("image/jpeg"),
        Some("svg") => Some("image/svg+xml"),
        _ => None,
    };
    let source = session.images().ingest(&bytes, mime)?;

    let mut init = ElementInit::image(source)
        .at(args.x, args.y)
        .with_scale(Scale::uniform(args.scale));
    if let Some(rotation) = args.rotation {
        init = init.with_rotation(rotation);
    }
    let id = session.add_element(area, init)?;
    session.save_to_file(&args.design)?;
    println!("Added image element #{} to {}", id, area);
    Ok(())
}

fn export_settings(session: &EditorSession, args: &ExportArgs) -> Result<ExportSettings> {
    let mut settings = session.default_export_settings()?;
    if let Some(format) = &args.format {
        settings.format = format.parse()?;
    }
    if let Some(dpi) = args.dpi {
        settings.dpi = dpi;
    }
    if let Some(background) = &args.background {
        settings.background = background.parse()?;
    }
    if let Some(sizing) = &args.sizing {
        settings.sizing = sizing.parse()?;
    }
    settings.include_bleed |= args.bleed;
    settings.compress |= args.compress;
    settings.validate()?;
    Ok(settings)
}

pub async fn run_export(config: Config, args: &ExportArgs) -> Result<()> {
    let mut session = open_design(config, &args.design)?;
    let settings = export_settings(&session, args)?;
    let prefix = args
        .prefix
        .clone()
        .unwrap_or_else(|| session.config().export_defaults.file_prefix.clone());

    session.ensure_scheduler()?;
    let ids: Vec<JobId> = if args.all {
        session.export_all(settings, &prefix)?
    } else {
        let areas = if args.areas.is_empty() {
            vec![AreaId::Front]
        } else {
            args.areas
                .iter()
                .map(|a| parse_area(a))
                .collect::<Result<Vec<_>>>()?
        };
        vec![session.request_export_with_prefix(&areas, settings, &prefix)?]
    };

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let mut failures = 0;
    for id in ids {
        let job = session.wait_for_job(id).await?;
        match (job.status, job.artifact, job.error) {
            (JobStatus::Completed, Some(artifact), _) => {
                let path = args.output_dir.join(&artifact.file_name);
                std::fs::write(&path, artifact.bytes.as_slice())
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!(
                    "Wrote {} ({}x{} px, {} dpi, {} bytes)",
                    path.display(),
                    artifact.width,
                    artifact.height,
                    artifact.dpi,
                    artifact.byte_size
                );
            }
            (_, _, error) => {
                failures += 1;
                let reason = error
                    .map(|e| format!("{:?}: {}", e.kind, e.message))
                    .unwrap_or_else(|| "unknown error".to_string());
                eprintln!("Job {} ({}) failed: {}", id, job.file_name, reason);
            }
        }
    }

    if failures > 0 {
        bail!("{} export job(s) failed", failures);
    }
    Ok(())
}
