use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-record sync bookkeeping kept beside the mirrored payload.
///
/// `sync_pending` is the only field consulted by the pull-merge path;
/// `locally_created` / `locally_updated` survive `mark_synced` as
/// provenance history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncProvenance {
    pub locally_created: bool,
    pub locally_updated: bool,
    pub locally_deleted: bool,
    pub sync_pending: i64,
    pub last_sync_attempt: Option<DateTime<Utc>>,
}

impl SyncProvenance {
    pub fn is_pending(&self) -> bool {
        self.sync_pending == 1
    }

    /// Provenance of a record hydrated straight from the remote service.
    pub fn synced(at: DateTime<Utc>) -> Self {
        Self {
            sync_pending: 0,
            last_sync_attempt: Some(at),
            ..Self::default()
        }
    }
}

/// A typed record annotated with its current sync provenance, as returned
/// by the repository facade.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<R> {
    pub record: R,
    pub sync: SyncProvenance,
}

impl<R> Stored<R> {
    pub fn new(record: R, sync: SyncProvenance) -> Self {
        Self { record, sync }
    }
}
