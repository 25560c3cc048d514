use super::provenance::SyncProvenance;
use serde_json::Value;

/// Untyped view of one mirrored row: the record's identifier, its domain
/// attributes as a JSON object, and the sync bookkeeping columns.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorRecord {
    pub id: String,
    pub payload: Value,
    pub sync: SyncProvenance,
}

impl MirrorRecord {
    pub fn new(id: String, payload: Value, sync: SyncProvenance) -> Self {
        Self { id, payload, sync }
    }
}
