//! # Audit API Seam
//!
//! The `AuditApi` trait is the boundary between the sync core and the remote
//! inspection service. Providers implement it over an injected `HttpClient`;
//! orchestrator tests implement it in-memory.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AuditError;
use crate::model::AuditDocument;

/// Binary document formats the export service can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }

    /// File extension for the downloaded document.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl FromStr for DocumentFormat {
    type Err = AuditError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            _ => Err(AuditError::UnknownDocumentFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of a discovery result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub audit_id: String,
    pub modified_at: DateTime<Utc>,
}

/// Discovery result: candidate audits modified after the requested cursor,
/// in ascending `modified_at` order as returned by the server.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryPage {
    pub total: u64,
    pub audits: Vec<AuditSummary>,
}

/// Options forwarded to the export request.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Timezone applied to rendered documents.
    pub timezone: String,

    /// Export profile to render with, when the template has one configured.
    pub export_profile_id: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            timezone: "Etc/UTC".to_string(),
            export_profile_id: None,
        }
    }
}

/// Parsed outcome of one export-job poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportPollStatus {
    /// Server is still rendering; poll the same job again.
    InProgress,

    /// Rendering finished; the document is available at `href`.
    Success { href: String },

    /// Terminal for this job: an explicit failure status, an unknown status
    /// string, or a response missing any recognizable status field.
    Failed { status: Option<String> },
}

/// Remote inspection service operations used by the sync pipeline.
#[async_trait]
pub trait AuditApi: Send + Sync {
    /// List audits modified strictly after `modified_after`, optionally
    /// restricted to the given template ids and to completed audits.
    async fn discover_audits(
        &self,
        modified_after: DateTime<Utc>,
        template_ids: &[String],
        completed_only: bool,
    ) -> Result<DiscoveryPage>;

    /// Fetch the full nested document for one audit.
    async fn fetch_audit(&self, audit_id: &str) -> Result<AuditDocument>;

    /// Request a new export job; returns the server-assigned job id.
    async fn request_export(
        &self,
        audit_id: &str,
        format: DocumentFormat,
        options: &ExportOptions,
    ) -> Result<String>;

    /// Poll an existing export job.
    async fn poll_export(&self, audit_id: &str, job_id: &str) -> Result<ExportPollStatus>;

    /// Download a finished export document.
    async fn download_export(&self, href: &str) -> Result<Bytes>;

    /// Download one media attachment of an audit.
    async fn download_media(&self, audit_id: &str, media_id: &str) -> Result<Bytes>;

    /// Obtain the shareable web-report link for an audit.
    async fn web_report_link(&self, audit_id: &str) -> Result<String>;
}
