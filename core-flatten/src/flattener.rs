//! # Item Tree Flattener
//!
//! Walks one audit document in document order (header items first, then body
//! items, pre-order as given by the source) and projects every item into a
//! [`RowRecord`]. Category resolution, scoring roll-up, and smartfield label
//! synthesis happen here; inactive-row filtering is a separate post-step so
//! extraction stays preference-agnostic.

use std::collections::HashMap;

use chrono::DateTime;
use tracing::warn;

use core_audit::{AuditDocument, ItemNode, ItemType, SelectedResponse};

use crate::item_map::ItemMap;
use crate::row::{render_optional_number, AuditMetadata, RowRecord};
use crate::{smartfield, vocab};

/// Flatten a document into rows, one per item, in document order.
///
/// Inactive items are included; apply [`filter_inactive`] afterwards if the
/// caller excludes them.
pub fn flatten(doc: &AuditDocument) -> Vec<RowRecord> {
    Flattener::new(doc).flatten()
}

/// Drop inactive rows unless the caller wants them kept.
pub fn filter_inactive(rows: Vec<RowRecord>, include_inactive: bool) -> Vec<RowRecord> {
    if include_inactive {
        rows
    } else {
        rows.into_iter().filter(|r| r.inactive != "true").collect()
    }
}

/// Single-document flattening pass.
///
/// Holds the per-document indexes (item map, custom response-set labels,
/// rendered metadata tail); build one per document and discard it with the
/// document.
pub struct Flattener<'a> {
    doc: &'a AuditDocument,
    item_map: ItemMap,
    response_set_labels: HashMap<&'a str, &'a str>,
    metadata: AuditMetadata,
}

impl<'a> Flattener<'a> {
    pub fn new(doc: &'a AuditDocument) -> Self {
        Self {
            doc,
            item_map: ItemMap::build(doc),
            response_set_labels: doc.response_set_labels(),
            metadata: AuditMetadata::from_document(doc),
        }
    }

    pub fn flatten(&self) -> Vec<RowRecord> {
        self.doc.all_items().map(|item| self.row_for(item)).collect()
    }

    fn row_for(&self, item: &ItemNode) -> RowRecord {
        let mut row = RowRecord::default();
        self.metadata.apply_to(&mut row);

        row.item_type = item.item_type.clone();
        row.label = item.label.clone().unwrap_or_default();
        row.item_id = item.item_id.clone();
        row.parent_id = item.parent_id.clone().unwrap_or_default();
        row.inactive = item.inactive.to_string();
        row.item_category = self.item_map.category_of(item);
        row.media_hypertext_reference = media_references(item);

        if let Some(options) = &item.options {
            row.mandatory = options.is_mandatory.to_string();
        }

        if let Some(responses) = &item.responses {
            row.comment = responses.text.clone().unwrap_or_default();
            if let Some(failed) = responses.failed {
                row.failed_response = failed.to_string();
            }
            if let Some(first) = responses.selected.first() {
                row.response_id = first.id.clone().unwrap_or_default();
            }
        }

        if let Some(scoring) = &item.scoring {
            let (score, max_score, percentage) = scoring.effective();
            row.item_score = render_optional_number(score);
            row.item_max_score = render_optional_number(max_score);
            row.item_score_percentage = render_optional_number(percentage);
        }

        match item.parsed_type() {
            Some(item_type) => self.apply_typed_fields(item_type, item, &mut row),
            None => {
                // One malformed item must never abort the whole document.
                warn!(
                    audit_id = %self.doc.audit_id,
                    item_id = %item.item_id,
                    item_type = %item.item_type,
                    "Unrecognized item type, emitting default fields"
                );
            }
        }

        row
    }

    fn apply_typed_fields(&self, item_type: ItemType, item: &ItemNode, row: &mut RowRecord) {
        let responses = item.responses.as_ref();

        match item_type {
            ItemType::Question => {
                if let Some(first) = responses.and_then(|r| r.selected.first()) {
                    row.response = self.selected_label(first);
                }
            }
            ItemType::List => {
                if let Some(responses) = responses {
                    row.response = responses
                        .selected
                        .iter()
                        .map(|s| self.selected_label(s))
                        .collect::<Vec<_>>()
                        .join("\n");
                }
            }
            ItemType::Text | ItemType::TextSingle => {
                // The stored text is the answer here, not a comment.
                if let Some(text) = responses.and_then(|r| r.text.clone()) {
                    row.response = text;
                }
                row.comment.clear();
            }
            ItemType::Checkbox | ItemType::Switch | ItemType::Slider | ItemType::Temperature => {
                if let Some(value) = responses.and_then(|r| r.value.as_ref()) {
                    row.response = value.render();
                }
            }
            ItemType::Address => {
                if let Some(location) = responses.and_then(|r| r.location.as_ref()) {
                    if let Some(address) = &location.formatted_address {
                        row.response = address.joined();
                    }
                    if let Some(geometry) = &location.geometry {
                        row.latitude = geometry
                            .latitude()
                            .map(|v| v.to_string())
                            .unwrap_or_default();
                        row.longitude = geometry
                            .longitude()
                            .map(|v| v.to_string())
                            .unwrap_or_default();
                    }
                }
            }
            ItemType::DateTime => {
                if let Some(raw) = responses.and_then(|r| r.datetime.as_deref()) {
                    row.response = format_display_datetime(raw);
                }
            }
            ItemType::Drawing | ItemType::Signature => {
                if let Some(image) = responses.and_then(|r| r.image.as_ref()) {
                    row.response = image.media_id.clone();
                }
            }
            ItemType::Media => {
                row.response = item
                    .media
                    .iter()
                    .map(|m| m.media_id.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
            }
            ItemType::Information => {
                // Only link/media sub-types have an answer; informational
                // text does not.
                if let Some(options) = &item.options {
                    match options.kind.as_deref() {
                        Some("link") => {
                            row.response = options.link.clone().unwrap_or_default();
                        }
                        Some("media") => {
                            row.response = options
                                .media
                                .as_ref()
                                .map(|m| m.reference().to_string())
                                .unwrap_or_default();
                        }
                        _ => {}
                    }
                }
            }
            ItemType::Smartfield => {
                if let Some(options) = &item.options {
                    row.label = smartfield::synthesize_label(options, &self.response_set_labels);
                }
                if let Some(evaluation) = item.evaluation {
                    row.response = evaluation.to_string();
                }
            }
            ItemType::Section
            | ItemType::Category
            | ItemType::Element
            | ItemType::PrimeElement
            | ItemType::DynamicField
            | ItemType::Asset
            | ItemType::Scanner => {}
        }
    }

    /// Display label for one selected option: the stored label when present,
    /// else the id resolved through the standard and custom response tables,
    /// else the raw id.
    fn selected_label(&self, selected: &SelectedResponse) -> String {
        if let Some(label) = &selected.label {
            return label.clone();
        }
        if let Some(id) = &selected.id {
            if let Some(label) = vocab::standard_response_label(id) {
                return label.to_string();
            }
            if let Some(label) = self.response_set_labels.get(id.as_str()) {
                return (*label).to_string();
            }
            return id.clone();
        }
        String::new()
    }
}

/// Media references attached directly to one item, newline-joined: item-level
/// media, drawing/signature image, information-field media.
fn media_references(item: &ItemNode) -> String {
    let mut refs: Vec<&str> = item.media.iter().map(|m| m.reference()).collect();
    if let Some(image) = item.responses.as_ref().and_then(|r| r.image.as_ref()) {
        refs.push(image.reference());
    }
    if let Some(media) = item.options.as_ref().and_then(|o| o.media.as_ref()) {
        refs.push(media.reference());
    }
    refs.join("\n")
}

/// Render a raw item timestamp in display form (day-month-year, 12-hour
/// clock). Unparseable input passes through unchanged.
pub fn format_display_datetime(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.format("%d %B %Y %I:%M %p").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn document(items_json: &str) -> AuditDocument {
        let json = format!(
            r#"{{
                "audit_id": "audit_1",
                "template_id": "template_1",
                "modified_at": "2024-01-05T10:00:00.000Z",
                "audit_data": {{
                    "name": "Walkthrough",
                    "authorship": {{"owner": "Dana", "author": "Lee"}}
                }},
                "template_data": {{
                    "metadata": {{"name": "Warehouse"}},
                    "response_sets": {{
                        "set-1": {{"responses": [{{"id": "r-cal", "label": "California"}}]}}
                    }}
                }},
                "header_items": [],
                "items": {}
            }}"#,
            items_json
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_rows_follow_document_order_with_metadata_tail() {
        let mut doc = document(
            r#"[{"item_id": "b1", "type": "question", "label": "Body question"}]"#,
        );
        doc.header_items = vec![serde_json::from_str(
            r#"{"item_id": "h1", "type": "textsingle", "label": "Prepared by",
                "responses": {"text": "Lee"}}"#,
        )
        .unwrap()];

        let rows = flatten(&doc);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].item_id, "h1");
        assert_eq!(rows[0].response, "Lee");
        assert_eq!(rows[1].item_id, "b1");
        assert_eq!(rows[0].audit_owner, "Dana");
        assert_eq!(rows[1].audit_name, "Walkthrough");
        assert_eq!(rows[1].template_name, "Warehouse");
    }

    #[test]
    fn test_category_resolution_nearest_ancestor_and_root() {
        let doc = document(
            r#"[
                {"item_id": "sec", "type": "section", "label": "Exterior"},
                {"item_id": "cat", "type": "category", "label": "Loading dock", "parent_id": "sec"},
                {"item_id": "q1", "type": "question", "parent_id": "cat"},
                {"item_id": "q2", "type": "question"}
            ]"#,
        );

        let rows = flatten(&doc);
        assert_eq!(rows[2].item_category, "Loading dock");
        assert_eq!(rows[3].item_category, "");
    }

    #[test]
    fn test_scoring_combined_projection_and_absence() {
        let doc = document(
            r#"[
                {"item_id": "s1", "type": "section",
                 "scoring": {"combined_score": 7.0, "combined_max_score": 10.0,
                             "combined_score_percentage": 70.0}},
                {"item_id": "q1", "type": "question",
                 "scoring": {"score": 1.0, "max_score": 1.0, "score_percentage": 100.0}},
                {"item_id": "q2", "type": "question"}
            ]"#,
        );

        let rows = flatten(&doc);
        assert_eq!(rows[0].item_score, "7");
        assert_eq!(rows[0].item_max_score, "10");
        assert_eq!(rows[0].item_score_percentage, "70");
        assert_eq!(rows[1].item_score, "1");
        assert_eq!(rows[2].item_score, "");
        assert_eq!(rows[2].item_max_score, "");
        assert_eq!(rows[2].item_score_percentage, "");
    }

    #[test]
    fn test_question_resolves_selected_label_and_response_id() {
        let doc = document(
            r#"[
                {"item_id": "q1", "type": "question",
                 "responses": {"selected": [{"id": "resp-1", "label": "Yes"}], "failed": false,
                               "text": "all good"}},
                {"item_id": "q2", "type": "question",
                 "responses": {"selected": [{"id": "r-cal"}]}}
            ]"#,
        );

        let rows = flatten(&doc);
        assert_eq!(rows[0].response, "Yes");
        assert_eq!(rows[0].response_id, "resp-1");
        assert_eq!(rows[0].comment, "all good");
        assert_eq!(rows[0].failed_response, "false");
        // label absent on the wire, resolved through the custom response set
        assert_eq!(rows[1].response, "California");
    }

    #[test]
    fn test_list_joins_selection_order() {
        let doc = document(
            r#"[{"item_id": "l1", "type": "list",
                 "responses": {"selected": [
                     {"id": "a", "label": "Frog"},
                     {"id": "b", "label": "Toad"}
                 ]}}]"#,
        );

        let rows = flatten(&doc);
        assert_eq!(rows[0].response, "Frog\nToad");
    }

    #[test]
    fn test_scalar_fields() {
        let doc = document(
            r#"[
                {"item_id": "c1", "type": "checkbox", "responses": {"value": true}},
                {"item_id": "sw1", "type": "switch", "responses": {"value": false}},
                {"item_id": "sl1", "type": "slider", "responses": {"value": 6.0}}
            ]"#,
        );

        let rows = flatten(&doc);
        assert_eq!(rows[0].response, "true");
        assert_eq!(rows[1].response, "false");
        assert_eq!(rows[2].response, "6");
    }

    #[test]
    fn test_address_exposes_text_and_coordinates() {
        let doc = document(
            r#"[{"item_id": "a1", "type": "address",
                 "responses": {"location": {
                     "formatted_address": ["15 Gilbert St", "Dover Heights NSW 2030"],
                     "geometry": {"coordinates": [151.28, -33.87]}
                 }}}]"#,
        );

        let rows = flatten(&doc);
        assert_eq!(rows[0].response, "15 Gilbert St, Dover Heights NSW 2030");
        assert_eq!(rows[0].latitude, "-33.87");
        assert_eq!(rows[0].longitude, "151.28");
    }

    #[test]
    fn test_datetime_display_form() {
        let doc = document(
            r#"[{"item_id": "d1", "type": "datetime",
                 "responses": {"datetime": "2024-01-05T15:30:00.000Z"}}]"#,
        );

        let rows = flatten(&doc);
        assert_eq!(rows[0].response, "05 January 2024 03:30 PM");
    }

    #[test]
    fn test_media_and_signature_references() {
        let doc = document(
            r#"[
                {"item_id": "m1", "type": "media",
                 "media": [
                     {"media_id": "photo-1", "href": "https://api.example.com/media/photo-1"},
                     {"media_id": "photo-2"}
                 ]},
                {"item_id": "s1", "type": "signature",
                 "responses": {"image": {"media_id": "sig-1"}}}
            ]"#,
        );

        let rows = flatten(&doc);
        assert_eq!(rows[0].response, "photo-1\nphoto-2");
        assert_eq!(
            rows[0].media_hypertext_reference,
            "https://api.example.com/media/photo-1\nphoto-2"
        );
        assert_eq!(rows[1].response, "sig-1");
        assert_eq!(rows[1].media_hypertext_reference, "sig-1");
    }

    #[test]
    fn test_information_only_link_and_media_answer() {
        let doc = document(
            r#"[
                {"item_id": "i1", "type": "information",
                 "options": {"type": "link", "link": "https://example.com/policy"}},
                {"item_id": "i2", "type": "information",
                 "options": {"type": "media", "media": {"media_id": "clip-1"}}},
                {"item_id": "i3", "type": "information",
                 "options": {"type": "text"}, "label": "Nothing to do here"}
            ]"#,
        );

        let rows = flatten(&doc);
        assert_eq!(rows[0].response, "https://example.com/policy");
        assert_eq!(rows[1].response, "clip-1");
        assert_eq!(rows[2].response, "");
    }

    #[test]
    fn test_smartfield_label_synthesis() {
        let doc = document(
            r#"[{"item_id": "sf1", "type": "smartfield", "label": "raw stored label",
                 "evaluation": true,
                 "options": {
                     "condition": "3f206184-e4f6-11e1-aff1-0800200c9a66",
                     "values": ["8bcfbf00-e11b-11e1-9b23-0800200c9a66", "42"]
                 }}]"#,
        );

        let rows = flatten(&doc);
        assert_eq!(rows[0].label, "if response is one of|Yes|42|");
        assert_eq!(rows[0].response, "true");
    }

    #[test]
    fn test_unrecognized_type_yields_default_fields() {
        let doc = document(
            r#"[
                {"item_id": "w1", "type": "weather", "label": "Sky",
                 "responses": {"text": "cloudy"}},
                {"item_id": "q1", "type": "question",
                 "responses": {"selected": [{"label": "Yes"}]}}
            ]"#,
        );

        let rows = flatten(&doc);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].item_type, "weather");
        assert_eq!(rows[0].response, "");
        assert_eq!(rows[0].comment, "cloudy");
        assert_eq!(rows[1].response, "Yes");
    }

    #[test]
    fn test_inactive_post_filter() {
        let doc = document(
            r#"[
                {"item_id": "q1", "type": "question", "inactive": true},
                {"item_id": "q2", "type": "question"}
            ]"#,
        );

        let rows = flatten(&doc);
        assert_eq!(rows.len(), 2, "extraction always includes inactive rows");

        let kept = filter_inactive(rows.clone(), true);
        assert_eq!(kept.len(), 2);

        let filtered = filter_inactive(rows, false);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].item_id, "q2");
    }

    #[test]
    fn test_format_display_datetime_passthrough_on_garbage() {
        assert_eq!(format_display_datetime("not a date"), "not a date");
    }
}
