//! # SafetyCulture Provider
//!
//! Implements the `AuditApi` trait for the SafetyCulture REST API v1.
//!
//! ## Overview
//!
//! This crate provides:
//! - Audit discovery with modified-after, template, and completed filters
//! - Full audit document retrieval
//! - Asynchronous document export (request + poll + download)
//! - Media downloads and web-report links
//! - Bearer token authentication via the injected `HttpClient`

pub mod connector;
pub mod error;
pub mod types;

pub use connector::SafetyCultureConnector;
pub use error::{ProviderError, Result};
