use crate::domain::entities::{ChangeIntent, ChangeIntentDraft, MirrorRecord};
use crate::domain::value_objects::EntityKind;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;

/// Durable local mirror of every entity table, keyed by identifier.
///
/// The local-write operations (`insert_local`, `merge_local`,
/// `mark_deleted`) stamp sync provenance in the same statement as the
/// payload write, so no local mutation can leave the bookkeeping columns
/// unset. Store failures are surfaced, never swallowed.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<MirrorRecord>, AppError>;

    /// Full table scan ordered by creation time, newest first.
    async fn list(&self, kind: EntityKind) -> Result<Vec<MirrorRecord>, AppError>;

    /// Foreign-key equality scan (e.g. all fee payments of one student).
    async fn list_by_parent(
        &self,
        kind: EntityKind,
        parent_id: &str,
    ) -> Result<Vec<MirrorRecord>, AppError>;

    /// Insert a locally created record; stamps `locally_created` and
    /// `sync_pending`.
    async fn insert_local(
        &self,
        kind: EntityKind,
        payload: Value,
    ) -> Result<MirrorRecord, AppError>;

    /// Shallow-merge a partial update into the stored payload; stamps
    /// `locally_updated` and `sync_pending` without clearing
    /// `locally_created`.
    async fn merge_local(
        &self,
        kind: EntityKind,
        id: &str,
        patch: Value,
    ) -> Result<MirrorRecord, AppError>;

    /// Mark a record for remote deletion; the row stays in the mirror
    /// until the delete is confirmed.
    async fn mark_deleted(&self, kind: EntityKind, id: &str) -> Result<(), AppError>;

    /// Hard delete, used only after a confirmed remote delete.
    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), AppError>;

    async fn pending(&self, kind: EntityKind) -> Result<Vec<MirrorRecord>, AppError>;

    async fn pending_ids(&self, kind: EntityKind) -> Result<HashSet<String>, AppError>;

    /// Sum of pending records across all entity tables.
    async fn pending_count(&self) -> Result<u64, AppError>;

    /// Clear `sync_pending` and stamp `last_sync_attempt`; leaves the
    /// `locally_created` / `locally_updated` history flags untouched.
    async fn mark_synced(&self, kind: EntityKind, id: &str) -> Result<(), AppError>;

    /// Batched upsert of records pulled from the remote service; clears all
    /// provenance flags and stamps `sync_pending = 0`. Returns the number
    /// of rows written.
    async fn upsert_remote(&self, kind: EntityKind, records: &[Value]) -> Result<u64, AppError>;

    async fn append_change_intent(&self, draft: ChangeIntentDraft) -> Result<i64, AppError>;

    async fn change_intents(&self) -> Result<Vec<ChangeIntent>, AppError>;

    async fn clear_change_intents(&self) -> Result<(), AppError>;

    async fn last_sync(&self) -> Result<Option<DateTime<Utc>>, AppError>;

    async fn set_last_sync(&self, at: DateTime<Utc>) -> Result<(), AppError>;
}
