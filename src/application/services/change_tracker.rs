use crate::application::ports::mirror_store::MirrorStore;
use crate::domain::entities::{ChangeIntentDraft, MirrorRecord};
use crate::domain::value_objects::{ChangeOp, EntityKind};
use crate::shared::error::AppError;
use serde_json::{json, Value};
use std::sync::Arc;

/// The sole local-mutation path. Every write goes through the mirror's
/// provenance-stamping primitives and leaves one entry in the durable
/// change-intent log.
pub struct ChangeTracker {
    store: Arc<dyn MirrorStore>,
}

impl ChangeTracker {
    pub fn new(store: Arc<dyn MirrorStore>) -> Self {
        Self { store }
    }

    pub async fn record_create(
        &self,
        kind: EntityKind,
        payload: Value,
    ) -> Result<MirrorRecord, AppError> {
        let record = self.store.insert_local(kind, payload).await?;
        self.store
            .append_change_intent(ChangeIntentDraft::new(
                kind,
                record.id.clone(),
                ChangeOp::Create,
                record.payload.clone(),
            ))
            .await?;
        Ok(record)
    }

    pub async fn record_update(
        &self,
        kind: EntityKind,
        id: &str,
        patch: Value,
    ) -> Result<MirrorRecord, AppError> {
        let snapshot = patch.clone();
        let record = self.store.merge_local(kind, id, patch).await?;
        self.store
            .append_change_intent(ChangeIntentDraft::new(
                kind,
                id.to_string(),
                ChangeOp::Update,
                snapshot,
            ))
            .await?;
        Ok(record)
    }

    pub async fn record_delete(&self, kind: EntityKind, id: &str) -> Result<(), AppError> {
        self.store.mark_deleted(kind, id).await?;
        self.store
            .append_change_intent(ChangeIntentDraft::new(
                kind,
                id.to_string(),
                ChangeOp::Delete,
                json!({ "id": id }),
            ))
            .await?;
        Ok(())
    }

    pub async fn mark_synced(&self, kind: EntityKind, id: &str) -> Result<(), AppError> {
        self.store.mark_synced(kind, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mirror::SqliteMirrorStore;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_tracker(name: &str) -> ChangeTracker {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
            .await
            .unwrap();
        let store = SqliteMirrorStore::initialize(pool).await.unwrap();
        ChangeTracker::new(Arc::new(store))
    }

    fn teacher_payload(id: &str) -> Value {
        json!({
            "id": id,
            "name": "R. Iyer",
            "subject": "Mathematics",
            "contact": "9000000001",
            "email": "iyer@example.org",
            "qualification": "MSc",
            "experience": 8,
            "created_at": "2026-03-01T09:00:00.000Z",
            "updated_at": "2026-03-01T09:00:00.000Z",
            "created_by": "admin"
        })
    }

    #[tokio::test]
    async fn every_mutation_leaves_one_intent() {
        let tracker = setup_tracker("tracker_intents").await;

        tracker
            .record_create(EntityKind::Teachers, teacher_payload("t1"))
            .await
            .unwrap();
        tracker
            .record_update(EntityKind::Teachers, "t1", json!({"salary": 52000.0}))
            .await
            .unwrap();
        tracker
            .record_delete(EntityKind::Teachers, "t1")
            .await
            .unwrap();

        let intents = tracker.store.change_intents().await.unwrap();
        assert_eq!(intents.len(), 3);
        assert_eq!(intents[0].op, ChangeOp::Create);
        assert_eq!(intents[1].op, ChangeOp::Update);
        assert_eq!(intents[1].snapshot, json!({"salary": 52000.0}));
        assert_eq!(intents[2].op, ChangeOp::Delete);
    }

    #[tokio::test]
    async fn update_after_offline_create_keeps_both_flags() {
        let tracker = setup_tracker("tracker_flags").await;

        tracker
            .record_create(EntityKind::Teachers, teacher_payload("t1"))
            .await
            .unwrap();
        let record = tracker
            .record_update(EntityKind::Teachers, "t1", json!({"salary": 52000.0}))
            .await
            .unwrap();

        assert!(record.sync.locally_created);
        assert!(record.sync.locally_updated);
        assert_eq!(record.sync.sync_pending, 1);
    }

    #[tokio::test]
    async fn mark_synced_preserves_provenance_history() {
        let tracker = setup_tracker("tracker_mark_synced").await;

        tracker
            .record_create(EntityKind::Teachers, teacher_payload("t1"))
            .await
            .unwrap();
        tracker.mark_synced(EntityKind::Teachers, "t1").await.unwrap();

        let record = tracker
            .store
            .get(EntityKind::Teachers, "t1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.sync.sync_pending, 0);
        assert!(record.sync.locally_created);
    }
}
