//! # Sync Module
//!
//! Incremental audit synchronization: discovers audits modified since the
//! persisted cursor, gates them on media-upload settling time, produces the
//! requested outputs per audit, and advances the cursor only after an audit
//! is fully processed.
//!
//! ## Components
//!
//! - **Cursor Store** (`cursor`): persisted high-water mark of the last
//!   successfully processed modification time
//! - **Media Sync Gate** (`gate`): predicate deciding whether an audit is
//!   safe to export yet
//! - **Export Job State Machine** (`export_job`): request → poll →
//!   success/fail with a bounded loop and single re-request retry
//! - **Sink Adapters** (`sink`): document/JSON/CSV/media/web-report writers
//!   plus the `RowSink` table seam
//! - **Sync Orchestrator** (`orchestrator`): the per-cycle driver

pub mod cursor;
pub mod error;
pub mod export_job;
pub mod gate;
pub mod orchestrator;
pub mod sink;

pub use cursor::{epoch_default, CursorStore, FileCursorStore, MemoryCursorStore};
pub use error::{Result, SyncError};
pub use export_job::{ExportJob, ExportJobConfig, ExportJobRunner, ExportJobStatus};
pub use gate::{is_ready, MediaSyncGate};
pub use orchestrator::{CycleStats, OutputFormat, SyncOrchestrator, SyncSettings};
pub use sink::{CsvRowSink, FileSink, RowSink};
