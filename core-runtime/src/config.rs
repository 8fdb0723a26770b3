//! # Exporter Configuration
//!
//! Loads and validates the exporter's YAML configuration file. Validation is
//! fail-fast: a config that cannot drive a sync cycle (bad token, empty
//! export path) is rejected before the first cycle begins, while merely
//! invalid numeric settings fall back to their defaults with a log line.
//!
//! ## File shape
//!
//! ```yaml
//! API:
//!     token: <64 lowercase hex characters>
//! config_name: site-a
//! export_options:
//!     export_path: exports
//!     timezone: Etc/UTC
//!     sync_delay_in_seconds: 900
//!     media_sync_offset_in_seconds: 600
//!     template_ids: template_aa,template_bb
//!     preferences: template_aa:profile-guid
//!     filename: f3245d40-ea77-11e1-aff1-0800200c9a66
//!     sql_table: audit_table
//!     csv_options:
//!         export_inactive_items: false
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{Error, Result};

/// Wait 15 minutes by default between sync cycles.
pub const DEFAULT_SYNC_DELAY_SECONDS: u64 = 900;

/// Only process audits modified more than 10 minutes ago by default.
pub const DEFAULT_MEDIA_SYNC_OFFSET_SECONDS: u64 = 600;

const DEFAULT_EXPORT_PATH: &str = "exports";
const DEFAULT_TIMEZONE: &str = "Etc/UTC";
const DEFAULT_TABLE_NAME: &str = "audit_table";

/// Validated exporter configuration.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// API access token (64 lowercase hex characters).
    pub api_token: String,

    /// Optional profile name; exports and cursor files are scoped by it so
    /// several configs can share a working directory.
    pub config_name: Option<String>,

    /// Base directory for exported artifacts.
    pub export_path: PathBuf,

    /// Delay between cycles in continuous mode.
    pub sync_delay_seconds: u64,

    /// Media-sync gate offset.
    pub media_sync_offset_seconds: u64,

    /// Keep inactive items in CSV/row outputs.
    pub export_inactive_items: bool,

    /// Timezone applied to rendered documents.
    pub timezone: String,

    /// Restrict discovery to these template ids (empty = all).
    pub template_ids: Vec<String>,

    /// Export profile per template id.
    pub export_profiles: HashMap<String, String>,

    /// Header item whose text response names exported files.
    pub filename_item_id: Option<String>,

    /// Table name for the row-store output.
    pub table_name: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            config_name: None,
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            sync_delay_seconds: DEFAULT_SYNC_DELAY_SECONDS,
            media_sync_offset_seconds: DEFAULT_MEDIA_SYNC_OFFSET_SECONDS,
            export_inactive_items: true,
            timezone: DEFAULT_TIMEZONE.to_string(),
            template_ids: Vec::new(),
            export_profiles: HashMap::new(),
            filename_item_id: None,
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }
}

impl ExporterConfig {
    /// Load and validate a configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(contents)?;
        let options = file.export_options.unwrap_or_default();

        let config = Self {
            api_token: file.api.and_then(|a| a.token).unwrap_or_default(),
            config_name: file.config_name,
            export_path: options
                .export_path
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_PATH)),
            sync_delay_seconds: normalize_seconds(
                options.sync_delay_in_seconds,
                DEFAULT_SYNC_DELAY_SECONDS,
                "sync_delay_in_seconds",
            ),
            media_sync_offset_seconds: normalize_seconds(
                options.media_sync_offset_in_seconds,
                DEFAULT_MEDIA_SYNC_OFFSET_SECONDS,
                "media_sync_offset_in_seconds",
            ),
            export_inactive_items: options
                .csv_options
                .unwrap_or_default()
                .export_inactive_items
                .unwrap_or(true),
            timezone: options
                .timezone
                .filter(|tz| !tz.is_empty())
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            template_ids: parse_template_ids(options.template_ids.as_deref()),
            export_profiles: parse_preferences(options.preferences.as_deref()),
            filename_item_id: options.filename.filter(|f| !f.is_empty()),
            table_name: options
                .sql_table
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Fail-fast validation of settings no cycle can run without.
    pub fn validate(&self) -> Result<()> {
        if !token_is_valid(&self.api_token) {
            return Err(Error::Config(
                "API token failed to match expected pattern (64 lowercase hex characters)"
                    .to_string(),
            ));
        }

        if self.export_path.as_os_str().is_empty() {
            return Err(Error::Config("Export path cannot be empty".to_string()));
        }

        if self.timezone.is_empty() {
            return Err(Error::Config("Timezone cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Export directory, scoped by `config_name` when set.
    pub fn effective_export_path(&self) -> PathBuf {
        match &self.config_name {
            Some(name) => self.export_path.join(name),
            None => self.export_path.clone(),
        }
    }

    /// Cursor file location, scoped by `config_name` when set.
    pub fn cursor_path(&self) -> PathBuf {
        let file_name = match &self.config_name {
            Some(name) => format!("last_successful-{}.txt", name),
            None => "last_successful.txt".to_string(),
        };
        PathBuf::from("last_successful").join(file_name)
    }
}

/// Token format check: 64 lowercase hex characters.
fn token_is_valid(token: &str) -> bool {
    token.len() == 64
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

fn normalize_seconds(value: Option<i64>, default: u64, setting: &str) -> u64 {
    match value {
        Some(v) if v >= 0 => v as u64,
        Some(v) => {
            warn!(
                setting = setting,
                value = v,
                default = default,
                "Invalid value in configuration file, using default"
            );
            default
        }
        None => default,
    }
}

/// Comma-separated template id list.
fn parse_template_ids(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Space-separated `template_id:profile_id` pairs; the template id is the
/// part before the first colon and the whole token is the profile id. First
/// mapping per template wins.
fn parse_preferences(raw: Option<&str>) -> HashMap<String, String> {
    let mut mapping = HashMap::new();
    if let Some(raw) = raw {
        for token in raw.split_whitespace() {
            if let Some((template_id, _)) = token.split_once(':') {
                mapping
                    .entry(template_id.to_string())
                    .or_insert_with(|| token.to_string());
            } else {
                warn!(token = token, "Malformed preference mapping, skipping");
            }
        }
    }
    mapping
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(rename = "API", default)]
    api: Option<ApiSection>,

    #[serde(default)]
    config_name: Option<String>,

    #[serde(default)]
    export_options: Option<ExportOptionsSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiSection {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExportOptionsSection {
    #[serde(default)]
    export_path: Option<String>,

    #[serde(default)]
    timezone: Option<String>,

    #[serde(default)]
    sync_delay_in_seconds: Option<i64>,

    #[serde(default)]
    media_sync_offset_in_seconds: Option<i64>,

    #[serde(default)]
    template_ids: Option<String>,

    #[serde(default)]
    preferences: Option<String>,

    #[serde(default)]
    filename: Option<String>,

    #[serde(default)]
    sql_table: Option<String>,

    #[serde(default)]
    csv_options: Option<CsvOptionsSection>,
}

#[derive(Debug, Default, Deserialize)]
struct CsvOptionsSection {
    #[serde(default)]
    export_inactive_items: Option<bool>,
}
