//! # Sync Orchestrator
//!
//! Drives one incremental sync cycle end to end:
//!
//! 1. Read the cursor.
//! 2. Discover candidate audits modified strictly after it (optionally
//!    filtered by template ids and completed status), in ascending
//!    `modified_at` order.
//! 3. For each candidate: evaluate the media-sync gate, fetch the full
//!    document, run every requested output, and only after all outputs
//!    succeed advance the cursor to that audit's modified timestamp.
//!
//! A gate rejection ends the cycle at that candidate: discovery order is
//! ascending, so everything after it is newer and advancing past it would
//! skip it permanently. A failed audit likewise ends the cycle with its
//! cursor untouched, so it is reprocessed next cycle (at-least-once).
//!
//! Fully sequential: one audit is processed start to finish before the next
//! begins; the only suspension points are the export poll delay and the
//! between-cycle sleep in continuous mode.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, instrument};

use bridge_traits::time::Clock;
use core_audit::{AuditApi, AuditDocument, AuditSummary, DocumentFormat, ExportOptions};
use core_flatten::{filter_inactive, flatten};

use crate::cursor::CursorStore;
use crate::error::{Result, SyncError};
use crate::export_job::{ExportJobConfig, ExportJobRunner};
use crate::gate::MediaSyncGate;
use crate::sink::{FileSink, RowSink};

/// The audit-title header item is omitted when title rules are configured;
/// exports named by it fall back to the audit name.
const AUDIT_TITLE_ITEM_ID: &str = "f3245d40-ea77-11e1-aff1-0800200c9a66";

/// Outputs an audit can be processed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pdf,
    Docx,
    Json,
    Csv,
    Media,
    WebReportLink,
    Rows,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Media => "media",
            OutputFormat::WebReportLink => "web-report-link",
            OutputFormat::Rows => "rows",
        }
    }

}

impl FromStr for OutputFormat {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pdf" => Ok(OutputFormat::Pdf),
            "docx" => Ok(OutputFormat::Docx),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "media" => Ok(OutputFormat::Media),
            "web-report-link" => Ok(OutputFormat::WebReportLink),
            "rows" => Ok(OutputFormat::Rows),
            _ => Err(SyncError::InvalidOutputFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Orchestrator settings, typically assembled from the exporter config.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Outputs to produce per audit.
    pub formats: Vec<OutputFormat>,

    /// Restrict discovery to these template ids (empty = all).
    pub template_ids: Vec<String>,

    /// Restrict discovery to completed audits.
    pub completed_only: bool,

    /// Media-sync gate offset.
    pub media_sync_offset_seconds: i64,

    /// Delay between cycles in continuous mode.
    pub sync_delay: Duration,

    /// Keep inactive items in CSV/row outputs.
    pub export_inactive_items: bool,

    /// Timezone applied to rendered documents.
    pub timezone: String,

    /// Export profile per template id.
    pub export_profiles: HashMap<String, String>,

    /// Header item whose text response names exported files.
    pub filename_item_id: Option<String>,

    /// Row-store table name for the `rows` output.
    pub table_name: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            formats: vec![OutputFormat::Pdf],
            template_ids: Vec::new(),
            completed_only: true,
            media_sync_offset_seconds: 600,
            sync_delay: Duration::from_secs(900),
            export_inactive_items: true,
            timezone: "Etc/UTC".to_string(),
            export_profiles: HashMap::new(),
            filename_item_id: None,
            table_name: "audit_table".to_string(),
        }
    }
}

/// Outcome counters for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub discovered: u64,
    pub processed: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Single-threaded incremental sync driver.
pub struct SyncOrchestrator {
    api: Arc<dyn AuditApi>,
    cursor_store: Arc<dyn CursorStore>,
    gate: MediaSyncGate,
    export_runner: ExportJobRunner,
    sink: FileSink,
    row_sink: Arc<dyn RowSink>,
    settings: SyncSettings,
}

impl SyncOrchestrator {
    pub fn new(
        api: Arc<dyn AuditApi>,
        cursor_store: Arc<dyn CursorStore>,
        clock: Arc<dyn Clock>,
        sink: FileSink,
        row_sink: Arc<dyn RowSink>,
        settings: SyncSettings,
        job_config: ExportJobConfig,
    ) -> Self {
        let gate = MediaSyncGate::new(settings.media_sync_offset_seconds, clock);
        let export_runner = ExportJobRunner::new(Arc::clone(&api), job_config);

        Self {
            api,
            cursor_store,
            gate,
            export_runner,
            sink,
            row_sink,
            settings,
        }
    }

    /// Run one discovery/processing cycle.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<CycleStats> {
        let mut stats = CycleStats::default();
        let since = self.cursor_store.read()?;

        let page = self
            .api
            .discover_audits(since, &self.settings.template_ids, self.settings.completed_only)
            .await
            .map_err(|e| SyncError::Provider(e.to_string()))?;

        info!(total = page.total, modified_after = %since, "Audits discovered");
        stats.discovered = page.audits.len() as u64;
        let total = page.audits.len();

        for (index, summary) in page.audits.iter().enumerate() {
            if !self.gate.is_satisfied(&summary.audit_id, summary.modified_at) {
                // Ascending order: every remaining candidate is at least as
                // new, and passing this one would lose it.
                stats.skipped = (total - index) as u64;
                break;
            }

            info!(
                audit_id = %summary.audit_id,
                "Processing audit ({}/{})",
                index + 1,
                total
            );

            match self.process_audit(summary).await {
                Ok(()) => {
                    self.cursor_store.write(summary.modified_at)?;
                    debug!(cursor = %summary.modified_at, "Cursor advanced");
                    stats.processed += 1;
                }
                Err(e) => {
                    error!(
                        audit_id = %summary.audit_id,
                        error = %e,
                        "Audit processing failed, will retry next cycle"
                    );
                    stats.failed += 1;
                    break;
                }
            }
        }

        Ok(stats)
    }

    /// Run cycles forever (continuous mode) or exactly once.
    pub async fn run(&self, continuous: bool) -> Result<CycleStats> {
        if !continuous {
            return self.run_cycle().await;
        }

        loop {
            // A failed cycle never terminates the orchestrator; the next
            // cycle re-reads the cursor and retries.
            match self.run_cycle().await {
                Ok(stats) => debug!(?stats, "Cycle complete"),
                Err(e) => error!(error = %e, "Sync cycle failed"),
            }
            info!(
                delay_secs = self.settings.sync_delay.as_secs(),
                "Next check scheduled, waiting"
            );
            sleep(self.settings.sync_delay).await;
        }
    }

    /// Fetch one audit and run every requested output. All outputs are
    /// attempted even when one fails; the first failure is returned so the
    /// cursor stays put.
    async fn process_audit(&self, summary: &AuditSummary) -> Result<()> {
        let document = self
            .api
            .fetch_audit(&summary.audit_id)
            .await
            .map_err(|e| SyncError::Provider(e.to_string()))?;

        let filename = export_filename(&document, self.settings.filename_item_id.as_deref());
        let mut first_failure: Option<SyncError> = None;

        for format in &self.settings.formats {
            if let Err(e) = self.run_output(&document, *format, &filename).await {
                error!(
                    audit_id = %document.audit_id,
                    format = %format,
                    error = %e,
                    "Output failed"
                );
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn run_output(
        &self,
        document: &AuditDocument,
        format: OutputFormat,
        filename: &str,
    ) -> Result<()> {
        match format {
            OutputFormat::Pdf | OutputFormat::Docx => {
                let document_format = if format == OutputFormat::Pdf {
                    DocumentFormat::Pdf
                } else {
                    DocumentFormat::Docx
                };
                let options = self.export_options_for(&document.template_id);
                let bytes = self
                    .export_runner
                    .export(&document.audit_id, document_format, &options)
                    .await?;
                self.sink
                    .save_document(filename, document_format.extension(), &bytes)?;
            }
            OutputFormat::Json => {
                self.sink.save_json(filename, document)?;
            }
            OutputFormat::Csv => {
                let rows = filter_inactive(
                    flatten(document),
                    self.settings.export_inactive_items,
                );
                self.sink.append_rows(&document.template_id, &rows)?;
            }
            OutputFormat::Media => {
                let references = document.media_references();
                info!(
                    audit_id = %document.audit_id,
                    count = references.len(),
                    "Downloading media files"
                );
                for media in references {
                    let bytes = self
                        .api
                        .download_media(&document.audit_id, &media.media_id)
                        .await
                        .map_err(|e| SyncError::Provider(e.to_string()))?;
                    self.sink.save_media(filename, &media.media_id, &bytes)?;
                }
            }
            OutputFormat::WebReportLink => {
                let link = self
                    .api
                    .web_report_link(&document.audit_id)
                    .await
                    .map_err(|e| SyncError::Provider(e.to_string()))?;
                let record = [
                    document.template_id.clone(),
                    document
                        .template_data
                        .metadata
                        .name
                        .clone()
                        .unwrap_or_default(),
                    document.audit_id.clone(),
                    document.audit_data.name.clone().unwrap_or_default(),
                    link,
                ];
                self.sink.append_web_report_link(&record)?;
            }
            OutputFormat::Rows => {
                let rows = filter_inactive(
                    flatten(document),
                    self.settings.export_inactive_items,
                );
                self.row_sink.append(&self.settings.table_name, &rows)?;
            }
        }

        Ok(())
    }

    fn export_options_for(&self, template_id: &str) -> ExportOptions {
        ExportOptions {
            timezone: self.settings.timezone.clone(),
            export_profile_id: self.settings.export_profiles.get(template_id).cloned(),
        }
    }
}

/// Name for exported files: the configured header item's text response, the
/// audit name for the audit-title item, else the audit id. Slashes are not
/// path separators here.
fn export_filename(document: &AuditDocument, filename_item_id: Option<&str>) -> String {
    if let Some(item_id) = filename_item_id {
        if item_id == AUDIT_TITLE_ITEM_ID {
            if let Some(name) = &document.audit_data.name {
                return name.replace('/', "_");
            }
        }
        for item in &document.header_items {
            if item.item_id == item_id {
                if let Some(text) = item.responses.as_ref().and_then(|r| r.text.as_deref()) {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        return trimmed.replace('/', "_");
                    }
                }
            }
        }
    }
    document.audit_id.clone()
}
