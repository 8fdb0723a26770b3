//! # Row Schema
//!
//! The fixed 31-column table schema every flattened audit projects into.
//! The first 16 columns are per-item; the rest repeat the document-level
//! metadata on every row so each row is self-describing.

use core_audit::{format_number, AuditDocument};
use chrono::SecondsFormat;

/// Ordered header of the output table.
pub const CSV_HEADER_ROW: [&str; 31] = [
    "ItemType",
    "Label",
    "Response",
    "Comment",
    "MediaHypertextReference",
    "Latitude",
    "Longitude",
    "ItemScore",
    "ItemMaxScore",
    "ItemScorePercentage",
    "Mandatory",
    "FailedResponse",
    "Inactive",
    "ItemID",
    "ResponseID",
    "ParentID",
    "AuditOwner",
    "AuditAuthor",
    "AuditName",
    "AuditScore",
    "AuditMaxScore",
    "AuditScorePercentage",
    "AuditDuration",
    "DateStarted",
    "DateCompleted",
    "DateModified",
    "AuditID",
    "TemplateID",
    "TemplateName",
    "TemplateAuthor",
    "ItemCategory",
];

/// One output row: a single item projected into the fixed schema.
///
/// Every cell is a rendered string; absent values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowRecord {
    pub item_type: String,
    pub label: String,
    pub response: String,
    pub comment: String,
    pub media_hypertext_reference: String,
    pub latitude: String,
    pub longitude: String,
    pub item_score: String,
    pub item_max_score: String,
    pub item_score_percentage: String,
    pub mandatory: String,
    pub failed_response: String,
    pub inactive: String,
    pub item_id: String,
    pub response_id: String,
    pub parent_id: String,
    pub audit_owner: String,
    pub audit_author: String,
    pub audit_name: String,
    pub audit_score: String,
    pub audit_max_score: String,
    pub audit_score_percentage: String,
    pub audit_duration: String,
    pub date_started: String,
    pub date_completed: String,
    pub date_modified: String,
    pub audit_id: String,
    pub template_id: String,
    pub template_name: String,
    pub template_author: String,
    pub item_category: String,
}

impl RowRecord {
    /// Cells in header order, for CSV/table writers.
    pub fn cells(&self) -> [&str; 31] {
        [
            &self.item_type,
            &self.label,
            &self.response,
            &self.comment,
            &self.media_hypertext_reference,
            &self.latitude,
            &self.longitude,
            &self.item_score,
            &self.item_max_score,
            &self.item_score_percentage,
            &self.mandatory,
            &self.failed_response,
            &self.inactive,
            &self.item_id,
            &self.response_id,
            &self.parent_id,
            &self.audit_owner,
            &self.audit_author,
            &self.audit_name,
            &self.audit_score,
            &self.audit_max_score,
            &self.audit_score_percentage,
            &self.audit_duration,
            &self.date_started,
            &self.date_completed,
            &self.date_modified,
            &self.audit_id,
            &self.template_id,
            &self.template_name,
            &self.template_author,
            &self.item_category,
        ]
    }
}

/// Document-level metadata, rendered once and copied into every row.
#[derive(Debug, Clone, Default)]
pub struct AuditMetadata {
    pub owner: String,
    pub author: String,
    pub name: String,
    pub score: String,
    pub max_score: String,
    pub score_percentage: String,
    pub duration: String,
    pub date_started: String,
    pub date_completed: String,
    pub date_modified: String,
    pub audit_id: String,
    pub template_id: String,
    pub template_name: String,
    pub template_author: String,
}

impl AuditMetadata {
    pub fn from_document(doc: &AuditDocument) -> Self {
        let data = &doc.audit_data;
        Self {
            owner: data.authorship.owner.clone().unwrap_or_default(),
            author: data.authorship.author.clone().unwrap_or_default(),
            name: data.name.clone().unwrap_or_default(),
            score: render_optional_number(data.score),
            max_score: render_optional_number(data.total_score),
            score_percentage: render_optional_number(data.score_percentage),
            duration: render_optional_number(data.duration),
            date_started: data.date_started.clone().unwrap_or_default(),
            date_completed: data.date_completed.clone().unwrap_or_default(),
            date_modified: doc
                .modified_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            audit_id: doc.audit_id.clone(),
            template_id: doc.template_id.clone(),
            template_name: doc.template_data.metadata.name.clone().unwrap_or_default(),
            template_author: doc
                .template_data
                .authorship
                .author
                .clone()
                .unwrap_or_default(),
        }
    }

    /// Apply the metadata tail to a row.
    pub fn apply_to(&self, row: &mut RowRecord) {
        row.audit_owner = self.owner.clone();
        row.audit_author = self.author.clone();
        row.audit_name = self.name.clone();
        row.audit_score = self.score.clone();
        row.audit_max_score = self.max_score.clone();
        row.audit_score_percentage = self.score_percentage.clone();
        row.audit_duration = self.duration.clone();
        row.date_started = self.date_started.clone();
        row.date_completed = self.date_completed.clone();
        row.date_modified = self.date_modified.clone();
        row.audit_id = self.audit_id.clone();
        row.template_id = self.template_id.clone();
        row.template_name = self.template_name.clone();
        row.template_author = self.template_author.clone();
    }
}

/// Render an optional numeric column; absent or non-numeric means empty.
pub fn render_optional_number(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}
