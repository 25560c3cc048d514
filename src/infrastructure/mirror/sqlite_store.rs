use super::rows::{ChangeIntentRow, MirrorRow};
use crate::application::ports::mirror_store::MirrorStore;
use crate::domain::entities::{ChangeIntent, ChangeIntentDraft, MirrorRecord, SyncProvenance};
use crate::domain::sync_record::iso_timestamp;
use crate::domain::value_objects::{ChangeOp, EntityKind};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use std::collections::HashSet;

const LAST_SYNC_KEY: &str = "last_sync";
const DEFAULT_BATCH_SIZE: usize = 100;

/// SQLite-backed mirror of the hosted database: one table per entity, a
/// change-intent log, and a small key-value table for process-wide state.
pub struct SqliteMirrorStore {
    pool: Pool<Sqlite>,
    batch_size: usize,
}

impl SqliteMirrorStore {
    /// Create the store and ensure the schema exists.
    pub async fn initialize(pool: Pool<Sqlite>) -> Result<Self, AppError> {
        for kind in EntityKind::ALL {
            let table = kind.table_name();
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    payload TEXT NOT NULL,
                    parent_id TEXT,
                    created_at TEXT NOT NULL,
                    locally_created INTEGER NOT NULL DEFAULT 0,
                    locally_updated INTEGER NOT NULL DEFAULT 0,
                    locally_deleted INTEGER NOT NULL DEFAULT 0,
                    sync_pending INTEGER NOT NULL DEFAULT 0,
                    last_sync_attempt TEXT
                )
                "#
            ))
            .execute(&pool)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_sync_pending ON {table}(sync_pending)"
            ))
            .execute(&pool)
            .await?;
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_parent_id ON {table}(parent_id)"
            ))
            .execute(&pool)
            .await?;
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table}(created_at)"
            ))
            .execute(&pool)
            .await?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS change_intents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_table TEXT NOT NULL,
                record_id TEXT NOT NULL,
                operation TEXT NOT NULL,
                snapshot TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                retry_count INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sync_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn record_from_row(row: MirrorRow) -> Result<MirrorRecord, AppError> {
        let payload: Value = serde_json::from_str(&row.payload)
            .map_err(|err| AppError::DeserializationError(err.to_string()))?;
        let sync = SyncProvenance {
            locally_created: row.locally_created,
            locally_updated: row.locally_updated,
            locally_deleted: row.locally_deleted,
            sync_pending: row.sync_pending,
            last_sync_attempt: row
                .last_sync_attempt
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        };
        Ok(MirrorRecord::new(row.id, payload, sync))
    }

    fn intent_from_row(row: ChangeIntentRow) -> Result<ChangeIntent, AppError> {
        let kind = EntityKind::from_table_name(&row.entity_table).ok_or_else(|| {
            AppError::DeserializationError(format!("unknown entity table {}", row.entity_table))
        })?;
        let op = ChangeOp::from_str(&row.operation).ok_or_else(|| {
            AppError::DeserializationError(format!("unknown operation {}", row.operation))
        })?;
        let snapshot: Value = serde_json::from_str(&row.snapshot)
            .map_err(|err| AppError::DeserializationError(err.to_string()))?;
        let recorded_at = DateTime::parse_from_rfc3339(&row.recorded_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(ChangeIntent {
            id: row.id,
            kind,
            record_id: row.record_id,
            op,
            snapshot,
            recorded_at,
            retry_count: row.retry_count.max(0) as u32,
        })
    }
}

/// Extract the index columns kept beside the JSON payload.
fn index_columns(kind: EntityKind, payload: &Value) -> (Option<String>, String) {
    let parent_id = kind
        .parent_field()
        .and_then(|field| payload.get(field))
        .and_then(Value::as_str)
        .map(str::to_string);
    let created_at = payload
        .get("created_at")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| iso_timestamp(Utc::now()));
    (parent_id, created_at)
}

fn payload_id(payload: &Value) -> Option<&str> {
    payload.get("id").and_then(Value::as_str)
}

#[async_trait]
impl MirrorStore for SqliteMirrorStore {
    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<MirrorRecord>, AppError> {
        let row = sqlx::query_as::<_, MirrorRow>(&format!(
            "SELECT * FROM {} WHERE id = ?1",
            kind.table_name()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::record_from_row).transpose()
    }

    async fn list(&self, kind: EntityKind) -> Result<Vec<MirrorRecord>, AppError> {
        let rows = sqlx::query_as::<_, MirrorRow>(&format!(
            "SELECT * FROM {} ORDER BY created_at DESC",
            kind.table_name()
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::record_from_row).collect()
    }

    async fn list_by_parent(
        &self,
        kind: EntityKind,
        parent_id: &str,
    ) -> Result<Vec<MirrorRecord>, AppError> {
        let rows = sqlx::query_as::<_, MirrorRow>(&format!(
            "SELECT * FROM {} WHERE parent_id = ?1 ORDER BY created_at DESC",
            kind.table_name()
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::record_from_row).collect()
    }

    async fn insert_local(
        &self,
        kind: EntityKind,
        payload: Value,
    ) -> Result<MirrorRecord, AppError> {
        let id = payload_id(&payload)
            .ok_or_else(|| AppError::InvalidInput("record payload is missing an id".to_string()))?
            .to_string();
        let (parent_id, created_at) = index_columns(kind, &payload);
        let now = Utc::now();
        let stamp = iso_timestamp(now);

        sqlx::query(&format!(
            r#"
            INSERT INTO {} (
                id, payload, parent_id, created_at,
                locally_created, locally_updated, locally_deleted,
                sync_pending, last_sync_attempt
            ) VALUES (?1, ?2, ?3, ?4, 1, 0, 0, 1, ?5)
            "#,
            kind.table_name()
        ))
        .bind(&id)
        .bind(payload.to_string())
        .bind(&parent_id)
        .bind(&created_at)
        .bind(&stamp)
        .execute(&self.pool)
        .await?;

        Ok(MirrorRecord::new(
            id,
            payload,
            SyncProvenance {
                locally_created: true,
                locally_updated: false,
                locally_deleted: false,
                sync_pending: 1,
                last_sync_attempt: Some(now),
            },
        ))
    }

    async fn merge_local(
        &self,
        kind: EntityKind,
        id: &str,
        patch: Value,
    ) -> Result<MirrorRecord, AppError> {
        let patch = match patch {
            Value::Object(map) => map,
            _ => {
                return Err(AppError::InvalidInput(
                    "partial update must be a JSON object".to_string(),
                ));
            }
        };

        let existing = self
            .get(kind, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} record {}", kind, id)))?;

        let mut merged = match existing.payload {
            Value::Object(map) => map,
            _ => {
                return Err(AppError::Internal(format!(
                    "stored payload for {} record {} is not an object",
                    kind, id
                )));
            }
        };
        for (key, value) in patch {
            merged.insert(key, value);
        }
        let merged = Value::Object(merged);

        let (parent_id, created_at) = index_columns(kind, &merged);
        let now = Utc::now();
        let stamp = iso_timestamp(now);

        sqlx::query(&format!(
            r#"
            UPDATE {}
            SET payload = ?1, parent_id = ?2, created_at = ?3,
                locally_updated = 1, sync_pending = 1, last_sync_attempt = ?4
            WHERE id = ?5
            "#,
            kind.table_name()
        ))
        .bind(merged.to_string())
        .bind(&parent_id)
        .bind(&created_at)
        .bind(&stamp)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(MirrorRecord::new(
            id.to_string(),
            merged,
            SyncProvenance {
                locally_created: existing.sync.locally_created,
                locally_updated: true,
                locally_deleted: existing.sync.locally_deleted,
                sync_pending: 1,
                last_sync_attempt: Some(now),
            },
        ))
    }

    async fn mark_deleted(&self, kind: EntityKind, id: &str) -> Result<(), AppError> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE {}
            SET locally_deleted = 1, sync_pending = 1, last_sync_attempt = ?1
            WHERE id = ?2
            "#,
            kind.table_name()
        ))
        .bind(iso_timestamp(Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} record {}", kind, id)));
        }
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), AppError> {
        sqlx::query(&format!(
            "DELETE FROM {} WHERE id = ?1",
            kind.table_name()
        ))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn pending(&self, kind: EntityKind) -> Result<Vec<MirrorRecord>, AppError> {
        let rows = sqlx::query_as::<_, MirrorRow>(&format!(
            "SELECT * FROM {} WHERE sync_pending = 1 ORDER BY created_at ASC",
            kind.table_name()
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::record_from_row).collect()
    }

    async fn pending_ids(&self, kind: EntityKind) -> Result<HashSet<String>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT id FROM {} WHERE sync_pending = 1",
            kind.table_name()
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut ids = HashSet::with_capacity(rows.len());
        for row in rows {
            ids.insert(row.try_get::<String, _>("id")?);
        }
        Ok(ids)
    }

    async fn pending_count(&self) -> Result<u64, AppError> {
        let mut total: i64 = 0;
        for kind in EntityKind::ALL {
            let (count,): (i64,) = sqlx::query_as(&format!(
                "SELECT COUNT(*) FROM {} WHERE sync_pending = 1",
                kind.table_name()
            ))
            .fetch_one(&self.pool)
            .await?;
            total += count;
        }
        Ok(total.max(0) as u64)
    }

    async fn mark_synced(&self, kind: EntityKind, id: &str) -> Result<(), AppError> {
        sqlx::query(&format!(
            "UPDATE {} SET sync_pending = 0, last_sync_attempt = ?1 WHERE id = ?2",
            kind.table_name()
        ))
        .bind(iso_timestamp(Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_remote(&self, kind: EntityKind, records: &[Value]) -> Result<u64, AppError> {
        let stamp = iso_timestamp(Utc::now());
        let mut written: u64 = 0;

        for chunk in records.chunks(self.batch_size) {
            let rows: Vec<(&str, &Value)> = chunk
                .iter()
                .filter_map(|payload| match payload_id(payload) {
                    Some(id) => Some((id, payload)),
                    None => {
                        tracing::warn!(table = %kind, "skipping remote record without an id");
                        None
                    }
                })
                .collect();
            if rows.is_empty() {
                continue;
            }

            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                r#"INSERT INTO {} (
                    id, payload, parent_id, created_at,
                    locally_created, locally_updated, locally_deleted,
                    sync_pending, last_sync_attempt
                ) "#,
                kind.table_name()
            ));
            builder.push_values(rows.iter().copied(), |mut b, (id, payload)| {
                let (parent_id, created_at) = index_columns(kind, payload);
                b.push_bind(id.to_string())
                    .push_bind(payload.to_string())
                    .push_bind(parent_id)
                    .push_bind(created_at)
                    .push_bind(0i64)
                    .push_bind(0i64)
                    .push_bind(0i64)
                    .push_bind(0i64)
                    .push_bind(stamp.clone());
            });
            builder.push(
                r#" ON CONFLICT(id) DO UPDATE SET
                    payload = excluded.payload,
                    parent_id = excluded.parent_id,
                    created_at = excluded.created_at,
                    locally_created = 0,
                    locally_updated = 0,
                    locally_deleted = 0,
                    sync_pending = 0,
                    last_sync_attempt = excluded.last_sync_attempt"#,
            );

            builder.build().execute(&self.pool).await?;
            written += rows.len() as u64;
        }

        Ok(written)
    }

    async fn append_change_intent(&self, draft: ChangeIntentDraft) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO change_intents (
                entity_table, record_id, operation, snapshot, recorded_at, retry_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0)
            "#,
        )
        .bind(draft.kind.table_name())
        .bind(&draft.record_id)
        .bind(draft.op.as_str())
        .bind(draft.snapshot.to_string())
        .bind(iso_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn change_intents(&self) -> Result<Vec<ChangeIntent>, AppError> {
        let rows = sqlx::query_as::<_, ChangeIntentRow>(
            "SELECT * FROM change_intents ORDER BY recorded_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::intent_from_row).collect()
    }

    async fn clear_change_intents(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM change_intents")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn last_sync(&self) -> Result<Option<DateTime<Utc>>, AppError> {
        let value: Option<(String,)> =
            sqlx::query_as("SELECT value FROM sync_meta WHERE key = ?1")
                .bind(LAST_SYNC_KEY)
                .fetch_optional(&self.pool)
                .await?;

        Ok(value
            .as_ref()
            .and_then(|(s,)| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    async fn set_last_sync(&self, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sync_meta (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(LAST_SYNC_KEY)
        .bind(iso_timestamp(at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
