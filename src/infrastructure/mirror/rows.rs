use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct MirrorRow {
    pub id: String,
    pub payload: String,
    pub parent_id: Option<String>,
    pub created_at: String,
    pub locally_created: bool,
    pub locally_updated: bool,
    pub locally_deleted: bool,
    pub sync_pending: i64,
    pub last_sync_attempt: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ChangeIntentRow {
    pub id: i64,
    pub entity_table: String,
    pub record_id: String,
    pub operation: String,
    pub snapshot: String,
    pub recorded_at: String,
    pub retry_count: i64,
}
