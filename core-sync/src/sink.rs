//! # Sink Adapters
//!
//! Simple file writers the orchestrator hands finished artifacts to:
//! rendered documents, JSON dumps, per-template CSV tables, media files, and
//! the web-report link index. The core only produces bytes and row records;
//! append/overwrite semantics live here.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, WriterBuilder};
use tracing::{debug, info};

use core_audit::AuditDocument;
use core_flatten::{RowRecord, CSV_HEADER_ROW};

use crate::error::Result;

const WEB_REPORT_LINKS_FILE: &str = "web-report-links.csv";

const WEB_REPORT_HEADER: [&str; 5] = [
    "Template ID",
    "Template Name",
    "Audit ID",
    "Audit Name",
    "Web Report Link",
];

/// Writes export artifacts under one base directory.
pub struct FileSink {
    export_dir: PathBuf,
}

impl FileSink {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    fn ensure_dir(dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        Ok(())
    }

    /// Write a rendered document, overwriting any existing file of the same
    /// name.
    pub fn save_document(
        &self,
        filename: &str,
        extension: &str,
        contents: &[u8],
    ) -> Result<PathBuf> {
        Self::ensure_dir(&self.export_dir)?;
        let path = self.export_dir.join(format!("{}.{}", filename, extension));
        if path.is_file() {
            info!(path = %path.display(), "Overwriting existing report");
        }
        fs::write(&path, contents)?;
        debug!(path = %path.display(), bytes = contents.len(), "Saved document");
        Ok(path)
    }

    /// Dump the full document as pretty-printed JSON.
    pub fn save_json(&self, filename: &str, document: &AuditDocument) -> Result<PathBuf> {
        let payload = serde_json::to_vec_pretty(document)?;
        self.save_document(filename, "json", &payload)
    }

    /// Append rows to `<file_stem>.csv`, writing the header only when the
    /// file is created.
    pub fn append_rows(&self, file_stem: &str, rows: &[RowRecord]) -> Result<PathBuf> {
        Self::ensure_dir(&self.export_dir)?;
        let path = self.export_dir.join(format!("{}.csv", file_stem));
        let is_new = !path.is_file();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(file);

        if is_new {
            writer.write_record(CSV_HEADER_ROW)?;
        }
        for row in rows {
            writer.write_record(row.cells())?;
        }
        writer.flush()?;

        debug!(path = %path.display(), rows = rows.len(), "Appended rows");
        Ok(path)
    }

    /// Write one media file under `media/<audit>/<media_id>.jpg`,
    /// overwriting any previous download.
    pub fn save_media(&self, audit_dir: &str, media_id: &str, contents: &[u8]) -> Result<PathBuf> {
        let dir = self.export_dir.join("media").join(audit_dir);
        Self::ensure_dir(&dir)?;
        let path = dir.join(format!("{}.jpg", media_id));
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Append one web-report link row, creating the file with its header on
    /// first use.
    pub fn append_web_report_link(&self, row: &[String; 5]) -> Result<PathBuf> {
        Self::ensure_dir(&self.export_dir)?;
        let path = self.export_dir.join(WEB_REPORT_LINKS_FILE);
        let is_new = !path.is_file();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(file);

        if is_new {
            info!(path = %path.display(), "Creating web report link index");
            writer.write_record(WEB_REPORT_HEADER)?;
        }
        writer.write_record(row)?;
        writer.flush()?;

        Ok(path)
    }
}

/// Row-store seam for table inserts. SQL engines and other stores plug in
/// here; the bundled implementation appends to a named CSV table.
pub trait RowSink: Send + Sync {
    fn append(&self, table: &str, rows: &[RowRecord]) -> Result<()>;
}

/// `RowSink` writing each table as `<table>.csv` under the export directory.
pub struct CsvRowSink {
    sink: FileSink,
}

impl CsvRowSink {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            sink: FileSink::new(export_dir),
        }
    }
}

impl RowSink for CsvRowSink {
    fn append(&self, table: &str, rows: &[RowRecord]) -> Result<()> {
        self.sink.append_rows(table, rows)?;
        Ok(())
    }
}
