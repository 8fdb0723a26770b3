//! # Item Tree Flattener
//!
//! Converts one audit document into an ordered sequence of fixed-schema rows.
//!
//! ## Components
//!
//! - **Row schema** (`row`): the 31-column header, `RowRecord`, and the
//!   rendered document-level metadata tail
//! - **Item map** (`item_map`): per-document id index for nearest
//!   section/category ancestor resolution
//! - **Vocabulary** (`vocab`): static standard-response and smartfield
//!   condition tables
//! - **Smartfield synthesis** (`smartfield`): condition phrase + resolved
//!   value label rendering
//! - **Flattener** (`flattener`): document walk, type-specific response
//!   extraction, scoring roll-up, inactive post-filter

pub mod flattener;
pub mod item_map;
pub mod row;
pub mod smartfield;
pub mod vocab;

pub use flattener::{filter_inactive, flatten, format_display_datetime, Flattener};
pub use item_map::ItemMap;
pub use row::{render_optional_number, AuditMetadata, RowRecord, CSV_HEADER_ROW};
pub use smartfield::synthesize_label;
