//! SafetyCulture API response types
//!
//! Wire shapes for the search, export, and web-report endpoints. The full
//! audit document deserializes directly into `core_audit::AuditDocument`.

use core_audit::AuditSummary;
use serde::Deserialize;

/// `audits/search` response
#[derive(Debug, Deserialize)]
pub struct AuditSearchResponse {
    #[serde(default)]
    pub total: u64,

    #[serde(default)]
    pub audits: Vec<AuditSummary>,
}

/// `audits/{id}/export` response
#[derive(Debug, Deserialize)]
pub struct ExportJobResponse {
    pub id: String,
}

/// `audits/{id}/exports/{job_id}` response
///
/// Both fields are optional on the wire: expired or malformed jobs come back
/// without a recognizable status at all.
#[derive(Debug, Default, Deserialize)]
pub struct ExportPollResponse {
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub href: Option<String>,
}

/// `audits/{id}/web_report_link` response
#[derive(Debug, Deserialize)]
pub struct WebReportResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_search_response() {
        let json = r#"{
            "total": 2,
            "audits": [
                {"audit_id": "audit_1", "modified_at": "2024-01-05T10:00:00.000Z"},
                {"audit_id": "audit_2", "modified_at": "2024-01-06T10:00:00.000Z"}
            ]
        }"#;

        let response: AuditSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.total, 2);
        assert_eq!(response.audits[0].audit_id, "audit_1");
    }

    #[test]
    fn test_deserialize_poll_response_missing_status() {
        let response: ExportPollResponse = serde_json::from_str("{}").unwrap();
        assert!(response.status.is_none());
        assert!(response.href.is_none());
    }

    #[test]
    fn test_deserialize_poll_response_success() {
        let json = r#"{"status": "SUCCESS", "href": "https://example.com/report.pdf"}"#;
        let response: ExportPollResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status.as_deref(), Some("SUCCESS"));
        assert_eq!(
            response.href.as_deref(),
            Some("https://example.com/report.pdf")
        );
    }
}
