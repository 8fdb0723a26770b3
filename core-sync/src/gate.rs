//! # Media Sync Gate
//!
//! An audit's metadata can be marked modified before its attached media
//! (photos, signatures) has finished uploading from the originating device.
//! Exporting too early silently produces documents with missing media, so a
//! candidate is only "safe" once enough wall-clock time has passed since its
//! last modification. This is a debounce heuristic: waiting on already-synced
//! media is acceptable, exporting with missing media is what we minimize.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::info;

use bridge_traits::time::Clock;

/// True iff the elapsed time since `modified_at` strictly exceeds the offset.
pub fn is_ready(modified_at: DateTime<Utc>, now: DateTime<Utc>, offset_seconds: i64) -> bool {
    now.signed_duration_since(modified_at) > Duration::seconds(offset_seconds)
}

/// Gate with an injected clock, used by the orchestrator per candidate.
pub struct MediaSyncGate {
    offset_seconds: i64,
    clock: Arc<dyn Clock>,
}

impl MediaSyncGate {
    pub fn new(offset_seconds: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            offset_seconds,
            clock,
        }
    }

    /// Check one candidate, logging the informational skip when it is not
    /// ready yet. Not an error; the candidate is reconsidered next cycle.
    pub fn is_satisfied(&self, audit_id: &str, modified_at: DateTime<Utc>) -> bool {
        if is_ready(modified_at, self.clock.now(), self.offset_seconds) {
            true
        } else {
            info!(
                audit_id = %audit_id,
                "Audit modified too recently, some media may not have finished syncing; \
                 skipping export until next cycle"
            );
            false
        }
    }
}
