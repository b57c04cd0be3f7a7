//! CLI Scan Command
//!
//! Non-interactive session: every image is one capture, then the session is
//! finished and the full record list exported.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use tagscan_core::{CredentialStore, ScannedRecord, Workflow, CREDENTIAL_KEY, CSV_MIME_TYPE};
use tagscan_logging::{ScanEvent, ScanEventLogger};
use tagscan_media::{CaptureController, StillImageCamera};
use tagscan_understanding::RecognitionClient;

use crate::config::AppContext;
use crate::terminal_output::{note_info, note_success, note_warn, records_table};

pub struct ScanArgs {
    pub date: String,
    pub truck: String,
    pub out: Option<PathBuf>,
    pub images: Vec<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub records: Vec<ScannedRecord>,
    /// Images that yielded nothing, with the reason shown to the operator.
    pub failures: Vec<(PathBuf, String)>,
}

/// Run one session over `images`. Per-image failures are collected, not fatal.
pub async fn scan_images(
    args: &ScanArgs,
    credential: &str,
    client: &mut RecognitionClient,
    instruction: &str,
) -> Result<ScanReport> {
    let mut workflow = Workflow::new();
    workflow
        .submit(&args.date, &args.truck, credential)
        .context("Cannot start a scanning session")?;
    let session_id = workflow.session_id();

    let mut report = ScanReport::default();
    let mut capture = CaptureController::new(instruction);

    for image in &args.images {
        let camera = StillImageCamera::new(image);
        let outcome = match capture.start(&camera).await {
            Ok(()) => {
                capture
                    .capture(client, |ids| {
                        if let Err(err) = workflow.accumulate(ids) {
                            tracing::warn!(error = %err, "Tags could not be accumulated");
                        }
                    })
                    .await
            }
            Err(err) => Err(err.into()),
        };

        let event = match outcome {
            Ok(tags) => {
                info!(image = %image.display(), tags = %tags.join(", "), "Image scanned");
                ScanEvent::TagsRecognized {
                    tags,
                    session_total: workflow.session_scans().len(),
                }
            }
            Err(err) => {
                report.failures.push((image.clone(), err.to_string()));
                ScanEvent::CaptureFailed {
                    error_msg: err.to_string(),
                }
            }
        };
        ScanEventLogger::log_event(session_id, event);
    }
    capture.release();

    workflow.finish().context("Cannot finish the scanning session")?;
    ScanEventLogger::log_event(
        session_id,
        ScanEvent::SessionFinished {
            new_records: workflow.records().len(),
        },
    );
    report.records = workflow.records().to_vec();
    Ok(report)
}

pub async fn run(ctx: &AppContext, args: ScanArgs) -> Result<()> {
    if args.images.is_empty() {
        bail!("No images given");
    }
    let store = ctx.credential_store();
    let Some(credential) = store.get(CREDENTIAL_KEY).filter(|c| !c.trim().is_empty()) else {
        bail!("No API key stored. Run `tagscan key set <KEY>` first");
    };

    let mut client = ctx.recognition_client(store);
    let report = scan_images(&args, &credential, &mut client, &ctx.instruction()).await?;

    for (image, reason) in &report.failures {
        note_warn(&format!("{}: {}", image.display(), reason));
    }
    if report.records.is_empty() {
        note_info("No tags recognized; nothing exported");
        return Ok(());
    }

    print!("{}", records_table(&report.records));
    export(ctx, args.out.as_deref(), &report.records).await
}

async fn export(ctx: &AppContext, out: Option<&Path>, records: &[ScannedRecord]) -> Result<()> {
    let exporter = ctx.exporter(out);
    if let Some(path) = exporter.export(records).await? {
        ScanEventLogger::log_event(
            None,
            ScanEvent::Exported {
                path: path.display().to_string(),
                mime_type: CSV_MIME_TYPE.to_string(),
                records: records.len(),
            },
        );
        note_success(&format!("Exported {} records to {}", records.len(), path.display()));
    }
    Ok(())
}
