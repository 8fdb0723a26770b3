//! SafetyCulture API connector implementation
//!
//! Implements the `AuditApi` trait over the SafetyCulture REST API v1.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use core_audit::{
    AuditApi, AuditDocument, DiscoveryPage, DocumentFormat, ExportOptions, ExportPollStatus,
};

use crate::error::{ProviderError, Result};
use crate::types::{AuditSearchResponse, ExportJobResponse, ExportPollResponse, WebReportResponse};

/// SafetyCulture API base URL
const API_BASE: &str = "https://api.safetyculture.io";

/// Timeout for metadata/search calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for document and media downloads
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// SafetyCulture API connector
///
/// Implements `AuditApi` against the v1 REST endpoints:
/// - Audit discovery via `audits/search` with modified-after/template/completed filters
/// - Full document fetch via `audits/{id}`
/// - Asynchronous document export via `audits/{id}/export` + poll
/// - Media and export downloads
/// - Web report link retrieval
///
/// # Example
///
/// ```ignore
/// use provider_safetyculture::SafetyCultureConnector;
/// use core_audit::AuditApi;
///
/// let connector = SafetyCultureConnector::new(http_client, api_token);
/// let page = connector.discover_audits(since, &[], true).await?;
/// ```
pub struct SafetyCultureConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// API access token
    api_token: String,

    /// Base URL, overridable for tests
    base_url: String,
}

impl SafetyCultureConnector {
    /// Create a new connector against the production API
    pub fn new(http_client: Arc<dyn HttpClient>, api_token: String) -> Self {
        Self {
            http_client,
            api_token,
            base_url: API_BASE.to_string(),
        }
    }

    /// Override the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn audits_url(&self, tail: &str) -> String {
        format!("{}/audits/{}", self.base_url, tail)
    }

    fn authenticated(&self, method: HttpMethod, url: &str, timeout: Duration) -> HttpRequest {
        HttpRequest::new(method, url)
            .bearer_token(&self.api_token)
            .header("Accept", "application/json")
            .timeout(timeout)
    }

    /// Execute a GET, logging and mapping any non-2xx status.
    async fn get(&self, url: String, timeout: Duration) -> Result<HttpResponse> {
        let request = self.authenticated(HttpMethod::Get, &url, timeout);
        let response = self.http_client.execute(request).await?;

        if response.is_success() {
            debug!(status = response.status, url = %url, "API request succeeded");
            Ok(response)
        } else {
            warn!(status = response.status, url = %url, "API request failed");
            Err(ProviderError::Api {
                status: response.status,
                url,
            })
        }
    }

    fn parse<T: serde::de::DeserializeOwned>(response: &HttpResponse, what: &str) -> Result<T> {
        serde_json::from_slice(&response.body)
            .map_err(|e| ProviderError::Parse(format!("{}: {}", what, e)))
    }
}

#[async_trait]
impl AuditApi for SafetyCultureConnector {
    #[instrument(skip(self), fields(modified_after = %modified_after))]
    async fn discover_audits(
        &self,
        modified_after: DateTime<Utc>,
        template_ids: &[String],
        completed_only: bool,
    ) -> bridge_traits::error::Result<DiscoveryPage> {
        let mut url = format!(
            "{}/audits/search?field=audit_id&field=modified_at&order=asc&modified_after={}",
            self.base_url,
            urlencoding::encode(&modified_after.to_rfc3339_opts(SecondsFormat::Millis, true))
        );

        for template_id in template_ids {
            url.push_str(&format!("&template={}", urlencoding::encode(template_id)));
        }
        if completed_only {
            url.push_str("&completed=true");
        }

        let response = self.get(url, REQUEST_TIMEOUT).await?;
        let search: AuditSearchResponse = Self::parse(&response, "audit search response")?;

        info!(total = search.total, "Audits discovered");

        Ok(DiscoveryPage {
            total: search.total,
            audits: search.audits,
        })
    }

    #[instrument(skip(self), fields(audit_id = %audit_id))]
    async fn fetch_audit(&self, audit_id: &str) -> bridge_traits::error::Result<AuditDocument> {
        let url = self.audits_url(audit_id);
        let response = self.get(url, REQUEST_TIMEOUT).await?;
        let document: AuditDocument = Self::parse(&response, "audit document")?;
        Ok(document)
    }

    #[instrument(skip(self, options), fields(audit_id = %audit_id, format = %format))]
    async fn request_export(
        &self,
        audit_id: &str,
        format: DocumentFormat,
        options: &ExportOptions,
    ) -> bridge_traits::error::Result<String> {
        let mut url = format!(
            "{}?format={}&timezone={}",
            self.audits_url(&format!("{}/export", audit_id)),
            format.as_str(),
            urlencoding::encode(&options.timezone)
        );

        if let Some(profile_id) = &options.export_profile_id {
            url.push_str(&format!(
                "&export_profile={}",
                urlencoding::encode(profile_id)
            ));
        }

        let request = self.authenticated(HttpMethod::Post, &url, REQUEST_TIMEOUT);
        let response = self.http_client.execute(request).await.map_err(ProviderError::Bridge)?;

        if !response.is_success() {
            warn!(status = response.status, url = %url, "Export request failed");
            return Err(ProviderError::RemoteRequest {
                status: response.status,
                url,
            }
            .into());
        }

        let job: ExportJobResponse = Self::parse(&response, "export job response")?;
        debug!(job_id = %job.id, "Export job created");
        Ok(job.id)
    }

    #[instrument(skip(self), fields(audit_id = %audit_id, job_id = %job_id))]
    async fn poll_export(
        &self,
        audit_id: &str,
        job_id: &str,
    ) -> bridge_traits::error::Result<ExportPollStatus> {
        let url = self.audits_url(&format!("{}/exports/{}", audit_id, job_id));
        let response = self.get(url, REQUEST_TIMEOUT).await?;

        // A 2xx body that is not the expected shape means the job itself is
        // malformed or expired, not that the network call failed; the caller
        // decides whether to re-request.
        let poll: ExportPollResponse = serde_json::from_slice(&response.body).unwrap_or_default();

        let status = match poll.status.as_deref() {
            Some("IN_PROGRESS") | Some("IN PROGRESS") => ExportPollStatus::InProgress,
            Some("SUCCESS") => match poll.href {
                Some(href) => ExportPollStatus::Success { href },
                None => ExportPollStatus::Failed {
                    status: Some("SUCCESS".to_string()),
                },
            },
            other => ExportPollStatus::Failed {
                status: other.map(|s| s.to_string()),
            },
        };

        Ok(status)
    }

    #[instrument(skip(self), fields(href = %href))]
    async fn download_export(&self, href: &str) -> bridge_traits::error::Result<Bytes> {
        let response = self.get(href.to_string(), DOWNLOAD_TIMEOUT).await?;
        info!(bytes = response.body.len(), "Downloaded export document");
        Ok(response.body)
    }

    #[instrument(skip(self), fields(audit_id = %audit_id, media_id = %media_id))]
    async fn download_media(
        &self,
        audit_id: &str,
        media_id: &str,
    ) -> bridge_traits::error::Result<Bytes> {
        let url = self.audits_url(&format!("{}/media/{}", audit_id, media_id));
        let response = self.get(url, DOWNLOAD_TIMEOUT).await?;
        Ok(response.body)
    }

    #[instrument(skip(self), fields(audit_id = %audit_id))]
    async fn web_report_link(&self, audit_id: &str) -> bridge_traits::error::Result<String> {
        let url = self.audits_url(&format!("{}/web_report_link", audit_id));
        let response = self.get(url, REQUEST_TIMEOUT).await?;
        let report: WebReportResponse = Self::parse(&response, "web report response")?;
        Ok(report.url)
    }
}
