//! # Audit Domain
//!
//! Domain model for inspection audit documents plus the `AuditApi` trait the
//! sync pipeline consumes. The model mirrors the API's document shape with
//! typed optional accessors so downstream code never walks raw JSON.

pub mod api;
pub mod error;
pub mod model;

pub use api::{
    AuditApi, AuditSummary, DiscoveryPage, DocumentFormat, ExportOptions, ExportPollStatus,
};
pub use error::AuditError;
pub use model::{
    format_number, AuditData, AuditDocument, Authorship, FormattedAddress, Geometry, ItemNode,
    ItemOptions, ItemType, Location, MediaRef, ResponsePayload, ResponseSet, ResponseValue,
    Scoring, SelectedResponse, TemplateData, TemplateMetadata,
};
