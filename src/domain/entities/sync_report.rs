use serde::{Deserialize, Serialize};

/// Counters for one reconciliation cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    /// True when the trigger was a no-op because a cycle was in flight.
    pub skipped: bool,
    pub pushed_count: u32,
    pub failed_count: u32,
    pub purged_count: u32,
    pub pulled_count: u32,
}

impl SyncReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}
