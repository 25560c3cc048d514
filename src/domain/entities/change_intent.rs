use crate::domain::value_objects::{ChangeOp, EntityKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Durable log entry describing one intended local mutation. Write-only
/// bookkeeping: reconciliation derives its work from the per-record
/// `sync_pending` index, not from this log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeIntent {
    pub id: i64,
    pub kind: EntityKind,
    pub record_id: String,
    pub op: ChangeOp,
    pub snapshot: Value,
    pub recorded_at: DateTime<Utc>,
    pub retry_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeIntentDraft {
    pub kind: EntityKind,
    pub record_id: String,
    pub op: ChangeOp,
    pub snapshot: Value,
}

impl ChangeIntentDraft {
    pub fn new(kind: EntityKind, record_id: String, op: ChangeOp, snapshot: Value) -> Self {
        Self {
            kind,
            record_id,
            op,
            snapshot,
        }
    }
}
