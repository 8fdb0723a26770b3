//! # Runtime Support
//!
//! Configuration loading/validation and logging setup for the exporter.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    ExporterConfig, DEFAULT_MEDIA_SYNC_OFFSET_SECONDS, DEFAULT_SYNC_DELAY_SECONDS,
};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
