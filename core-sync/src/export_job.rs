//! # Export Job State Machine
//!
//! Drives a single audit's server-side document export through
//! request → poll → success/fail.
//!
//! ## State Machine
//!
//! ```text
//! Requested → InProgress → Success
//!     ↑            ↓
//!     └──(one new job)── Failed
//! ```
//!
//! A poll that comes back `IN_PROGRESS` sleeps a fixed interval and re-polls
//! the same job id. A poll with no recognizable status (malformed or expired
//! job) is a failure of the *job*, not the network call: exactly one new job
//! is requested; a second unusable job is terminal for this audit/format
//! pair. The poll loop is bounded by `max_poll_attempts` so a stuck export
//! can never spin forever.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use core_audit::{AuditApi, DocumentFormat, ExportOptions, ExportPollStatus};

use crate::error::{Result, SyncError};

/// Lifecycle states of one export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportJobStatus {
    Requested,
    InProgress,
    Success,
    Failed,
}

impl ExportJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportJobStatus::Requested => "requested",
            ExportJobStatus::InProgress => "in_progress",
            ExportJobStatus::Success => "success",
            ExportJobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportJobStatus::Success | ExportJobStatus::Failed)
    }
}

impl std::fmt::Display for ExportJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ephemeral state for one (audit id, output format) export. Created per
/// request, discarded on terminal state.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub job_id: String,
    pub status: ExportJobStatus,
    pub retries: u32,
}

impl ExportJob {
    fn new(job_id: String) -> Self {
        Self {
            job_id,
            status: ExportJobStatus::Requested,
            retries: 0,
        }
    }
}

/// Polling configuration.
#[derive(Debug, Clone)]
pub struct ExportJobConfig {
    /// Fixed delay between polls of an in-progress job.
    pub poll_interval: Duration,

    /// Upper bound on in-progress polls per job before the export is
    /// declared failed.
    pub max_poll_attempts: u32,
}

impl Default for ExportJobConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 60,
        }
    }
}

/// Runs export jobs to completion against an `AuditApi`.
pub struct ExportJobRunner {
    api: Arc<dyn AuditApi>,
    config: ExportJobConfig,
}

impl ExportJobRunner {
    pub fn new(api: Arc<dyn AuditApi>, config: ExportJobConfig) -> Self {
        Self { api, config }
    }

    /// Request an export, poll it to completion, and download the rendered
    /// document.
    #[instrument(skip(self, options), fields(audit_id = %audit_id, format = %format))]
    pub async fn export(
        &self,
        audit_id: &str,
        format: DocumentFormat,
        options: &ExportOptions,
    ) -> Result<Bytes> {
        let href = self.run(audit_id, format, options).await?;
        self.api
            .download_export(&href)
            .await
            .map_err(|e| SyncError::Provider(e.to_string()))
    }

    /// Drive the request/poll state machine and return the download href.
    pub async fn run(
        &self,
        audit_id: &str,
        format: DocumentFormat,
        options: &ExportOptions,
    ) -> Result<String> {
        let job_id = self
            .api
            .request_export(audit_id, format, options)
            .await
            .map_err(|e| SyncError::Provider(e.to_string()))?;
        let mut job = ExportJob::new(job_id);
        let mut polls = 0u32;

        loop {
            let status = self
                .api
                .poll_export(audit_id, &job.job_id)
                .await
                .map_err(|e| SyncError::Provider(e.to_string()))?;

            match status {
                ExportPollStatus::InProgress => {
                    job.status = ExportJobStatus::InProgress;
                    polls += 1;
                    if polls >= self.config.max_poll_attempts {
                        job.status = ExportJobStatus::Failed;
                        error!(
                            job_id = %job.job_id,
                            polls = polls,
                            "Export still in progress after poll ceiling, giving up"
                        );
                        return Err(self.export_failed(audit_id, format));
                    }
                    debug!(job_id = %job.job_id, polls = polls, "Export in progress");
                    sleep(self.config.poll_interval).await;
                }
                ExportPollStatus::Success { href } => {
                    job.status = ExportJobStatus::Success;
                    info!(job_id = %job.job_id, "Export ready");
                    return Ok(href);
                }
                ExportPollStatus::Failed { status } => {
                    if job.retries >= 1 {
                        job.status = ExportJobStatus::Failed;
                        error!(
                            job_id = %job.job_id,
                            status = status.as_deref().unwrap_or("<missing>"),
                            "Export failed twice, skipping"
                        );
                        return Err(self.export_failed(audit_id, format));
                    }

                    warn!(
                        job_id = %job.job_id,
                        status = status.as_deref().unwrap_or("<missing>"),
                        "Export job unusable, requesting a new job"
                    );
                    job.retries += 1;
                    polls = 0;
                    job.job_id = self
                        .api
                        .request_export(audit_id, format, options)
                        .await
                        .map_err(|e| SyncError::Provider(e.to_string()))?;
                    job.status = ExportJobStatus::Requested;
                }
            }
        }
    }

    fn export_failed(&self, audit_id: &str, format: DocumentFormat) -> SyncError {
        SyncError::ExportFailed {
            audit_id: audit_id.to_string(),
            format: format.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use chrono::{DateTime, Utc};
    use core_audit::{AuditDocument, DiscoveryPage};
    use std::sync::Mutex;

    /// Scripted API double: pops one poll outcome per call, counts export
    /// requests.
    struct ScriptedApi {
        poll_outcomes: Mutex<Vec<ExportPollStatus>>,
        request_count: Mutex<u32>,
    }

    impl ScriptedApi {
        fn new(poll_outcomes: Vec<ExportPollStatus>) -> Self {
            Self {
                poll_outcomes: Mutex::new(poll_outcomes),
                request_count: Mutex::new(0),
            }
        }

        fn requests(&self) -> u32 {
            *self.request_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl AuditApi for ScriptedApi {
        async fn discover_audits(
            &self,
            _modified_after: DateTime<Utc>,
            _template_ids: &[String],
            _completed_only: bool,
        ) -> BridgeResult<DiscoveryPage> {
            Ok(DiscoveryPage::default())
        }

        async fn fetch_audit(&self, _audit_id: &str) -> BridgeResult<AuditDocument> {
            Err(BridgeError::NotAvailable("fetch_audit".to_string()))
        }

        async fn request_export(
            &self,
            _audit_id: &str,
            _format: DocumentFormat,
            _options: &ExportOptions,
        ) -> BridgeResult<String> {
            let mut count = self.request_count.lock().unwrap();
            *count += 1;
            Ok(format!("job-{}", count))
        }

        async fn poll_export(
            &self,
            _audit_id: &str,
            _job_id: &str,
        ) -> BridgeResult<ExportPollStatus> {
            let mut outcomes = self.poll_outcomes.lock().unwrap();
            if outcomes.is_empty() {
                // Script exhausted: stay malformed.
                Ok(ExportPollStatus::Failed { status: None })
            } else {
                Ok(outcomes.remove(0))
            }
        }

        async fn download_export(&self, _href: &str) -> BridgeResult<Bytes> {
            Ok(Bytes::from_static(b"%PDF-1.4"))
        }

        async fn download_media(&self, _audit_id: &str, _media_id: &str) -> BridgeResult<Bytes> {
            Ok(Bytes::new())
        }

        async fn web_report_link(&self, _audit_id: &str) -> BridgeResult<String> {
            Ok(String::new())
        }
    }

    fn runner(api: Arc<ScriptedApi>, max_poll_attempts: u32) -> ExportJobRunner {
        ExportJobRunner::new(
            api,
            ExportJobConfig {
                poll_interval: Duration::ZERO,
                max_poll_attempts,
            },
        )
    }

    #[tokio::test]
    async fn test_in_progress_then_success_polls_same_job() {
        let api = Arc::new(ScriptedApi::new(vec![
            ExportPollStatus::InProgress,
            ExportPollStatus::InProgress,
            ExportPollStatus::Success {
                href: "https://example.com/doc.pdf".to_string(),
            },
        ]));

        let href = runner(api.clone(), 60)
            .run("audit_1", DocumentFormat::Pdf, &ExportOptions::default())
            .await
            .unwrap();

        assert_eq!(href, "https://example.com/doc.pdf");
        assert_eq!(api.requests(), 1, "in-progress polls never re-request");
    }

    #[tokio::test]
    async fn test_malformed_job_retries_exactly_once() {
        // Every poll is unrecognizable; the runner must re-request once and
        // then stop - never loop a third time.
        let api = Arc::new(ScriptedApi::new(vec![]));

        let err = runner(api.clone(), 60)
            .run("audit_1", DocumentFormat::Pdf, &ExportOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::ExportFailed { .. }));
        assert_eq!(api.requests(), 2, "exactly one retry request");
    }

    #[tokio::test]
    async fn test_retry_job_can_succeed() {
        let api = Arc::new(ScriptedApi::new(vec![
            ExportPollStatus::Failed {
                status: Some("FAILED".to_string()),
            },
            ExportPollStatus::Success {
                href: "https://example.com/doc.docx".to_string(),
            },
        ]));

        let href = runner(api.clone(), 60)
            .run("audit_1", DocumentFormat::Docx, &ExportOptions::default())
            .await
            .unwrap();

        assert_eq!(href, "https://example.com/doc.docx");
        assert_eq!(api.requests(), 2);
    }

    #[tokio::test]
    async fn test_poll_ceiling_bounds_stuck_exports() {
        let api = Arc::new(ScriptedApi::new(vec![
            ExportPollStatus::InProgress,
            ExportPollStatus::InProgress,
            ExportPollStatus::InProgress,
            ExportPollStatus::InProgress,
        ]));

        let err = runner(api.clone(), 3)
            .run("audit_1", DocumentFormat::Pdf, &ExportOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::ExportFailed { .. }));
        assert_eq!(api.requests(), 1, "a stuck job is not re-requested");
    }

    #[tokio::test]
    async fn test_export_downloads_href() {
        let api = Arc::new(ScriptedApi::new(vec![ExportPollStatus::Success {
            href: "https://example.com/doc.pdf".to_string(),
        }]));

        let bytes = runner(api, 60)
            .export("audit_1", DocumentFormat::Pdf, &ExportOptions::default())
            .await
            .unwrap();

        assert_eq!(&bytes[..], b"%PDF-1.4");
    }

    #[test]
    fn test_status_terminal_states() {
        assert!(!ExportJobStatus::Requested.is_terminal());
        assert!(!ExportJobStatus::InProgress.is_terminal());
        assert!(ExportJobStatus::Success.is_terminal());
        assert!(ExportJobStatus::Failed.is_terminal());
    }
}
