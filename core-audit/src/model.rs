//! # Audit Document Model
//!
//! Typed representation of an inspection audit as returned by the API: a
//! document header plus an ordered tree of items (sections, categories,
//! questions, and leaf fields), audit-level metadata, and the template's
//! custom response-set definitions.
//!
//! Documents are fetched fresh per processing attempt and discarded after
//! flattening or export; nothing here is persisted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::AuditError;

/// Full audit document as fetched from the API.
///
/// `header_items` precede `items` in document order; the flattener processes
/// them in exactly this order and never re-sorts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditDocument {
    pub audit_id: String,

    pub template_id: String,

    /// Last server-side modification time (RFC 3339). Drives both the
    /// media-sync gate and the incremental cursor.
    pub modified_at: chrono::DateTime<chrono::Utc>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub header_items: Vec<ItemNode>,

    #[serde(default)]
    pub items: Vec<ItemNode>,

    #[serde(default)]
    pub audit_data: AuditData,

    #[serde(default)]
    pub template_data: TemplateData,
}

impl AuditDocument {
    /// All items in document order: header items first, then body items.
    pub fn all_items(&self) -> impl Iterator<Item = &ItemNode> {
        self.header_items.iter().chain(self.items.iter())
    }

    /// Media references attached anywhere in the document: item-level media
    /// lists, drawing/signature images, and information-field media.
    pub fn media_references(&self) -> Vec<&MediaRef> {
        let mut refs = Vec::new();
        for item in self.all_items() {
            refs.extend(item.media.iter());
            if let Some(image) = item.responses.as_ref().and_then(|r| r.image.as_ref()) {
                refs.push(image);
            }
            if let Some(media) = item.options.as_ref().and_then(|o| o.media.as_ref()) {
                refs.push(media);
            }
        }
        refs
    }

    /// Label lookup across every custom response set declared by the
    /// template, keyed by response id. Built once per document.
    pub fn response_set_labels(&self) -> HashMap<&str, &str> {
        let mut labels = HashMap::new();
        for set in self.template_data.response_sets.values() {
            for response in &set.responses {
                if let (Some(id), Some(label)) = (response.id.as_deref(), response.label.as_deref())
                {
                    labels.insert(id, label);
                }
            }
        }
        labels
    }
}

/// Audit-level metadata, constant across all rows of one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditData {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub score: Option<f64>,

    #[serde(default)]
    pub total_score: Option<f64>,

    #[serde(default)]
    pub score_percentage: Option<f64>,

    /// Duration of the inspection in seconds.
    #[serde(default)]
    pub duration: Option<f64>,

    #[serde(default)]
    pub date_started: Option<String>,

    #[serde(default)]
    pub date_completed: Option<String>,

    #[serde(default)]
    pub authorship: Authorship,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Authorship {
    #[serde(default)]
    pub owner: Option<String>,

    #[serde(default)]
    pub author: Option<String>,
}

/// Template metadata carried on every audit document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateData {
    #[serde(default)]
    pub metadata: TemplateMetadata,

    #[serde(default)]
    pub authorship: Authorship,

    /// Custom response-set definitions keyed by set id.
    #[serde(default)]
    pub response_sets: HashMap<String, ResponseSet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateMetadata {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseSet {
    #[serde(default)]
    pub responses: Vec<SelectedResponse>,
}

/// The closed set of item types a document may declare.
///
/// The wire value stays a plain string on [`ItemNode`]; parsing happens at
/// flattening time so an unrecognized type degrades to an empty row instead
/// of failing deserialization of the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Section,
    Category,
    Question,
    List,
    Text,
    TextSingle,
    Address,
    Checkbox,
    Switch,
    Slider,
    Drawing,
    Information,
    Media,
    Signature,
    Smartfield,
    DynamicField,
    Element,
    PrimeElement,
    DateTime,
    Asset,
    Scanner,
    Temperature,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Section => "section",
            ItemType::Category => "category",
            ItemType::Question => "question",
            ItemType::List => "list",
            ItemType::Text => "text",
            ItemType::TextSingle => "textsingle",
            ItemType::Address => "address",
            ItemType::Checkbox => "checkbox",
            ItemType::Switch => "switch",
            ItemType::Slider => "slider",
            ItemType::Drawing => "drawing",
            ItemType::Information => "information",
            ItemType::Media => "media",
            ItemType::Signature => "signature",
            ItemType::Smartfield => "smartfield",
            ItemType::DynamicField => "dynamicfield",
            ItemType::Element => "element",
            ItemType::PrimeElement => "primeelement",
            ItemType::DateTime => "datetime",
            ItemType::Asset => "asset",
            ItemType::Scanner => "scanner",
            ItemType::Temperature => "temperature",
        }
    }

    /// Whether this node starts a grouping the category-resolution walk
    /// terminates at.
    pub fn is_grouping(&self) -> bool {
        matches!(self, ItemType::Section | ItemType::Category)
    }
}

impl FromStr for ItemType {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "section" => Ok(ItemType::Section),
            "category" => Ok(ItemType::Category),
            "question" => Ok(ItemType::Question),
            "list" => Ok(ItemType::List),
            "text" => Ok(ItemType::Text),
            "textsingle" => Ok(ItemType::TextSingle),
            "address" => Ok(ItemType::Address),
            "checkbox" => Ok(ItemType::Checkbox),
            "switch" => Ok(ItemType::Switch),
            "slider" => Ok(ItemType::Slider),
            "drawing" => Ok(ItemType::Drawing),
            "information" => Ok(ItemType::Information),
            "media" => Ok(ItemType::Media),
            "signature" => Ok(ItemType::Signature),
            "smartfield" => Ok(ItemType::Smartfield),
            "dynamicfield" => Ok(ItemType::DynamicField),
            "element" => Ok(ItemType::Element),
            "primeelement" => Ok(ItemType::PrimeElement),
            "datetime" => Ok(ItemType::DateTime),
            "asset" => Ok(ItemType::Asset),
            "scanner" => Ok(ItemType::Scanner),
            "temperature" => Ok(ItemType::Temperature),
            _ => Err(AuditError::UnknownItemType(s.to_string())),
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One node in the document tree.
///
/// Invariant: every non-root node's `parent_id` resolves to exactly one other
/// node in the same document, or is absent (effectively a root).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemNode {
    pub item_id: String,

    #[serde(default)]
    pub parent_id: Option<String>,

    /// Declared type, kept as the raw wire string. See [`ItemType`].
    #[serde(rename = "type")]
    pub item_type: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub responses: Option<ResponsePayload>,

    #[serde(default)]
    pub scoring: Option<Scoring>,

    #[serde(default)]
    pub media: Vec<MediaRef>,

    #[serde(default)]
    pub inactive: bool,

    #[serde(default)]
    pub options: Option<ItemOptions>,

    /// Smartfield condition outcome.
    #[serde(default)]
    pub evaluation: Option<bool>,
}

impl ItemNode {
    /// Declared type parsed against the closed set, if recognized.
    pub fn parsed_type(&self) -> Option<ItemType> {
        self.item_type.parse().ok()
    }

    pub fn is_mandatory(&self) -> bool {
        self.options.as_ref().map(|o| o.is_mandatory).unwrap_or(false)
    }
}

/// Type-dependent response payload. Fields are a union across all item
/// types; extractors read only what their type defines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponsePayload {
    /// Free text: the answer for text fields, the comment for others.
    #[serde(default)]
    pub text: Option<String>,

    /// Selected options, in selection order (question/list).
    #[serde(default)]
    pub selected: Vec<SelectedResponse>,

    /// Stored scalar for checkbox/switch/slider/temperature.
    #[serde(default)]
    pub value: Option<ResponseValue>,

    /// Raw timestamp for datetime fields.
    #[serde(default)]
    pub datetime: Option<String>,

    #[serde(default)]
    pub location: Option<Location>,

    /// Captured image for drawing/signature fields.
    #[serde(default)]
    pub image: Option<MediaRef>,

    #[serde(default)]
    pub failed: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectedResponse {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub label: Option<String>,
}

/// Scalar response value; the wire carries booleans, numbers, and strings in
/// the same slot depending on the item type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ResponseValue {
    /// Render the stored value as an output cell.
    pub fn render(&self) -> String {
        match self {
            ResponseValue::Bool(b) => b.to_string(),
            ResponseValue::Number(n) => format_number(*n),
            ResponseValue::Text(s) => s.clone(),
        }
    }
}

/// Format a float without a trailing `.0` for whole values.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Item scoring sub-record. An item carries either its own score triple or
/// the combined (section/category aggregate) triple, never both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scoring {
    #[serde(default)]
    pub score: Option<f64>,

    #[serde(default)]
    pub max_score: Option<f64>,

    #[serde(default)]
    pub score_percentage: Option<f64>,

    #[serde(default)]
    pub combined_score: Option<f64>,

    #[serde(default)]
    pub combined_max_score: Option<f64>,

    #[serde(default)]
    pub combined_score_percentage: Option<f64>,
}

impl Scoring {
    /// The effective (score, max, percentage) triple: the item's own values
    /// when a score is present, otherwise the combined aggregate.
    pub fn effective(&self) -> (Option<f64>, Option<f64>, Option<f64>) {
        if self.score.is_some() {
            (self.score, self.max_score, self.score_percentage)
        } else if self.combined_score.is_some() {
            (
                self.combined_score,
                self.combined_max_score,
                self.combined_score_percentage,
            )
        } else {
            (None, None, None)
        }
    }
}

/// Reference to an attached media object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRef {
    pub media_id: String,

    #[serde(default)]
    pub href: Option<String>,
}

impl MediaRef {
    /// The href when the server provided one, else the bare id.
    pub fn reference(&self) -> &str {
        self.href.as_deref().unwrap_or(&self.media_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub formatted_address: Option<FormattedAddress>,

    #[serde(default)]
    pub geometry: Option<Geometry>,
}

/// The place-name text arrives either as a list of lines or a single string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormattedAddress {
    Lines(Vec<String>),
    Single(String),
}

impl FormattedAddress {
    pub fn joined(&self) -> String {
        match self {
            FormattedAddress::Lines(lines) => lines.join(", "),
            FormattedAddress::Single(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Geometry {
    /// `[longitude, latitude]`, GeoJSON order.
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

impl Geometry {
    pub fn longitude(&self) -> Option<f64> {
        self.coordinates.first().copied()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.coordinates.get(1).copied()
    }
}

/// Item options: mandatory flag, information sub-type, and the smartfield
/// condition definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemOptions {
    #[serde(default)]
    pub is_mandatory: bool,

    /// Information sub-type: "link", "media", or "text".
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub link: Option<String>,

    #[serde(default)]
    pub media: Option<MediaRef>,

    /// Smartfield condition id.
    #[serde(default)]
    pub condition: Option<String>,

    /// Smartfield referenced values (response ids or literals).
    #[serde(default)]
    pub values: Vec<String>,

    /// Custom response-set id for question items.
    #[serde(default)]
    pub response_set: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_item_type_round_trip() {
        for name in [
            "section",
            "category",
            "question",
            "list",
            "text",
            "textsingle",
            "address",
            "checkbox",
            "switch",
            "slider",
            "drawing",
            "information",
            "media",
            "signature",
            "smartfield",
            "dynamicfield",
            "element",
            "primeelement",
            "datetime",
            "asset",
            "scanner",
            "temperature",
        ] {
            let parsed: ItemType = name.parse().unwrap();
            assert_eq!(parsed.as_str(), name);
        }

        assert!("weather".parse::<ItemType>().is_err());
    }

    #[test]
    fn test_grouping_types() {
        assert!(ItemType::Section.is_grouping());
        assert!(ItemType::Category.is_grouping());
        assert!(!ItemType::Question.is_grouping());
    }

    #[test]
    fn test_deserialize_item_node() {
        let json = r#"{
            "item_id": "item-1",
            "parent_id": "root-1",
            "type": "question",
            "label": "Is the site secure?",
            "responses": {
                "selected": [{"id": "resp-yes", "label": "Yes"}],
                "failed": false,
                "text": "gate locked"
            },
            "scoring": {"score": 1.0, "max_score": 1.0, "score_percentage": 100.0},
            "options": {"is_mandatory": true}
        }"#;

        let item: ItemNode = serde_json::from_str(json).unwrap();
        assert_eq!(item.parsed_type(), Some(ItemType::Question));
        assert!(item.is_mandatory());
        assert!(!item.inactive);
        assert_eq!(
            item.responses.unwrap().selected[0].label.as_deref(),
            Some("Yes")
        );
    }

    #[test]
    fn test_deserialize_scalar_values() {
        let switch: ResponsePayload = serde_json::from_str(r#"{"value": true}"#).unwrap();
        assert_eq!(switch.value.unwrap().render(), "true");

        let slider: ResponsePayload = serde_json::from_str(r#"{"value": 6.0}"#).unwrap();
        assert_eq!(slider.value.unwrap().render(), "6");

        let slider: ResponsePayload = serde_json::from_str(r#"{"value": 6.5}"#).unwrap();
        assert_eq!(slider.value.unwrap().render(), "6.5");
    }

    #[test]
    fn test_scoring_effective_prefers_own_score() {
        let own = Scoring {
            score: Some(3.0),
            max_score: Some(5.0),
            score_percentage: Some(60.0),
            ..Default::default()
        };
        assert_eq!(own.effective(), (Some(3.0), Some(5.0), Some(60.0)));

        let combined = Scoring {
            combined_score: Some(7.0),
            combined_max_score: Some(10.0),
            combined_score_percentage: Some(70.0),
            ..Default::default()
        };
        assert_eq!(
            combined.effective(),
            (Some(7.0), Some(10.0), Some(70.0))
        );

        assert_eq!(Scoring::default().effective(), (None, None, None));
    }

    #[test]
    fn test_formatted_address_variants() {
        let lines: FormattedAddress =
            serde_json::from_str(r#"["15 Gilbert St", "Dover Heights NSW 2030"]"#).unwrap();
        assert_eq!(lines.joined(), "15 Gilbert St, Dover Heights NSW 2030");

        let single: FormattedAddress = serde_json::from_str(r#""1 Main St""#).unwrap();
        assert_eq!(single.joined(), "1 Main St");
    }

    #[test]
    fn test_media_references_collects_all_sources() {
        let json = r#"{
            "audit_id": "audit_1",
            "template_id": "template_1",
            "modified_at": "2024-01-05T10:00:00.000Z",
            "header_items": [],
            "items": [
                {
                    "item_id": "m1",
                    "type": "media",
                    "media": [{"media_id": "photo-1"}, {"media_id": "photo-2"}]
                },
                {
                    "item_id": "s1",
                    "type": "signature",
                    "responses": {"image": {"media_id": "sig-1"}}
                },
                {
                    "item_id": "i1",
                    "type": "information",
                    "options": {"type": "media", "media": {"media_id": "info-1"}}
                }
            ]
        }"#;

        let doc: AuditDocument = serde_json::from_str(json).unwrap();
        let ids: Vec<&str> = doc
            .media_references()
            .iter()
            .map(|m| m.media_id.as_str())
            .collect();
        assert_eq!(ids, vec!["photo-1", "photo-2", "sig-1", "info-1"]);
    }

    #[test]
    fn test_response_set_labels() {
        let json = r#"{
            "audit_id": "audit_1",
            "template_id": "template_1",
            "modified_at": "2024-01-05T10:00:00.000Z",
            "template_data": {
                "response_sets": {
                    "set-1": {
                        "responses": [
                            {"id": "r1", "label": "California"},
                            {"id": "r2", "label": "Nevada"}
                        ]
                    }
                }
            }
        }"#;

        let doc: AuditDocument = serde_json::from_str(json).unwrap();
        let labels = doc.response_set_labels();
        assert_eq!(labels.get("r1"), Some(&"California"));
        assert_eq!(labels.get("r2"), Some(&"Nevada"));
        assert_eq!(labels.get("missing"), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(66.666), "66.666");
        assert_eq!(format_number(0.0), "0");
    }
}
