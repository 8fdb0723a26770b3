//! Exporter CLI: wires the API connector, cursor store, and sinks into the
//! sync orchestrator, then runs one cycle or loops until interrupted.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use bridge_desktop::ReqwestHttpClient;
use bridge_traits::time::{Clock, SystemClock};
use core_audit::AuditApi;
use core_runtime::{init_logging, ExporterConfig, LoggingConfig};
use core_sync::{
    CsvRowSink, CursorStore, ExportJobConfig, FileCursorStore, FileSink, OutputFormat, RowSink,
    SyncOrchestrator, SyncSettings,
};
use provider_safetyculture::SafetyCultureConnector;

/// Incrementally export inspection audits to documents, CSV, media files,
/// and web-report links.
#[derive(Debug, Parser)]
#[command(name = "exporter")]
struct Args {
    /// Config file to use
    #[arg(long, default_value = "configs/config.yaml")]
    config: PathBuf,

    /// Formats to produce: pdf, docx, json, csv, media, web-report-link, rows
    #[arg(long = "format", value_delimiter = ',', num_args = 1..)]
    formats: Vec<String>,

    /// Execute continuously until interrupted
    #[arg(long = "loop")]
    run_loop: bool,
}

fn parse_formats(raw: &[String]) -> anyhow::Result<Vec<OutputFormat>> {
    if raw.is_empty() {
        return Ok(vec![OutputFormat::Pdf]);
    }
    raw.iter()
        .map(|s| {
            s.parse::<OutputFormat>()
                .with_context(|| format!("'{}' is not a valid export format", s))
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ExporterConfig::from_yaml_file(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;

    init_logging(LoggingConfig::default()).context("failed to initialize logging")?;

    let formats = parse_formats(&args.formats)?;
    let settings = SyncSettings {
        formats,
        template_ids: config.template_ids.clone(),
        completed_only: true,
        media_sync_offset_seconds: config.media_sync_offset_seconds as i64,
        sync_delay: Duration::from_secs(config.sync_delay_seconds),
        export_inactive_items: config.export_inactive_items,
        timezone: config.timezone.clone(),
        export_profiles: config.export_profiles.clone(),
        filename_item_id: config.filename_item_id.clone(),
        table_name: config.table_name.clone(),
    };

    let http_client = Arc::new(ReqwestHttpClient::new());
    let api: Arc<dyn AuditApi> =
        Arc::new(SafetyCultureConnector::new(http_client, config.api_token.clone()));
    let cursor: Arc<dyn CursorStore> = Arc::new(FileCursorStore::new(config.cursor_path()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let export_dir = config.effective_export_path();
    let sink = FileSink::new(&export_dir);
    let row_sink: Arc<dyn RowSink> = Arc::new(CsvRowSink::new(&export_dir));

    let orchestrator = SyncOrchestrator::new(
        api,
        cursor,
        clock,
        sink,
        row_sink,
        settings,
        ExportJobConfig::default(),
    );

    let stats = orchestrator.run(args.run_loop).await?;
    info!(
        processed = stats.processed,
        skipped = stats.skipped,
        failed = stats.failed,
        "Completed sync process, exiting"
    );

    Ok(())
}
