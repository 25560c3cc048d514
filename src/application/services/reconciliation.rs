use crate::application::ports::mirror_store::MirrorStore;
use crate::application::ports::remote_gateway::RemoteGateway;
use crate::application::services::change_tracker::ChangeTracker;
use crate::application::services::status::StatusBroadcaster;
use crate::domain::entities::SyncReport;
use crate::domain::value_objects::EntityKind;
use crate::shared::error::AppError;
use chrono::Utc;
use futures::future::try_join_all;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Runs one complete push-then-pull reconciliation cycle across all entity
/// tables. At most one cycle is in flight at a time; a reentrant trigger is
/// a no-op.
pub struct ReconciliationEngine {
    store: Arc<dyn MirrorStore>,
    gateway: Arc<dyn RemoteGateway>,
    tracker: Arc<ChangeTracker>,
    status: Arc<StatusBroadcaster>,
    in_progress: Mutex<bool>,
}

impl ReconciliationEngine {
    pub fn new(
        store: Arc<dyn MirrorStore>,
        gateway: Arc<dyn RemoteGateway>,
        tracker: Arc<ChangeTracker>,
        status: Arc<StatusBroadcaster>,
    ) -> Self {
        Self {
            store,
            gateway,
            tracker,
            status,
            in_progress: Mutex::new(false),
        }
    }

    pub async fn is_syncing(&self) -> bool {
        *self.in_progress.lock().await
    }

    /// One full cycle: push every pending record, pull every table, stamp
    /// the last-sync timestamp. Returns a skipped report when a cycle is
    /// already in flight.
    pub async fn sync_all(&self) -> Result<SyncReport, AppError> {
        {
            // Checked and set before the first suspension point on I/O.
            let mut in_progress = self.in_progress.lock().await;
            if *in_progress {
                tracing::debug!("Sync cycle already in progress, skipping trigger");
                return Ok(SyncReport::skipped());
            }
            *in_progress = true;
        }

        self.status.set_syncing(true).await;
        let result = self.run_cycle().await;
        *self.in_progress.lock().await = false;
        self.status.set_syncing(false).await;

        match &result {
            Ok(report) => {
                tracing::info!(
                    pushed = report.pushed_count,
                    failed = report.failed_count,
                    purged = report.purged_count,
                    pulled = report.pulled_count,
                    "Sync cycle complete"
                );
            }
            Err(err) => {
                tracing::error!("Sync cycle failed: {}", err);
            }
        }

        result
    }

    async fn run_cycle(&self) -> Result<SyncReport, AppError> {
        let mut report = SyncReport::default();

        for kind in EntityKind::ALL {
            self.push_table(kind, &mut report).await?;
        }

        report.pulled_count = self.pull_all().await?;
        self.store.set_last_sync(Utc::now()).await?;

        Ok(report)
    }

    /// Push every pending record of one table. Gateway failures are
    /// per-record: the record stays pending for the next cycle and the
    /// rest of the table proceeds. Store failures abort the cycle.
    async fn push_table(&self, kind: EntityKind, report: &mut SyncReport) -> Result<(), AppError> {
        let pending = self.store.pending(kind).await?;

        for record in pending {
            if record.sync.locally_deleted {
                match self.gateway.delete(kind, &record.id).await {
                    Ok(()) => {
                        self.store.delete(kind, &record.id).await?;
                        report.purged_count += 1;
                    }
                    Err(err) => {
                        report.failed_count += 1;
                        tracing::warn!(table = %kind, id = %record.id, "Failed to push delete: {}", err);
                    }
                }
            } else if record.sync.locally_created {
                match self.gateway.insert(kind, record.payload.clone()).await {
                    Ok(()) => {
                        self.tracker.mark_synced(kind, &record.id).await?;
                        report.pushed_count += 1;
                    }
                    Err(err) => {
                        report.failed_count += 1;
                        tracing::warn!(table = %kind, id = %record.id, "Failed to push create: {}", err);
                    }
                }
            } else if record.sync.locally_updated {
                match self
                    .gateway
                    .update(kind, &record.id, record.payload.clone())
                    .await
                {
                    Ok(()) => {
                        self.tracker.mark_synced(kind, &record.id).await?;
                        report.pushed_count += 1;
                    }
                    Err(err) => {
                        report.failed_count += 1;
                        tracing::warn!(table = %kind, id = %record.id, "Failed to push update: {}", err);
                    }
                }
            } else {
                tracing::debug!(table = %kind, id = %record.id, "Pending record carries no provenance flags");
            }
        }

        Ok(())
    }

    /// Concurrent pull fan-out over every table. Each table's merge commits
    /// as soon as its own fetch finishes; the first failure fails the whole
    /// phase, which skips the last-sync stamp without reverting merges that
    /// already landed.
    async fn pull_all(&self) -> Result<u32, AppError> {
        let pulls = EntityKind::ALL.iter().map(|kind| self.pull_table(*kind));
        let merged = try_join_all(pulls).await?;
        Ok(merged.into_iter().sum())
    }

    async fn pull_table(&self, kind: EntityKind) -> Result<u32, AppError> {
        let remote = self.gateway.select_all(kind).await?;
        // Recomputed immediately before the merge so a write racing the
        // fetch still wins locally.
        let pending = self.store.pending_ids(kind).await?;
        let mergeable: Vec<Value> = remote
            .into_iter()
            .filter(|record| {
                record
                    .get("id")
                    .and_then(Value::as_str)
                    .map_or(false, |id| !pending.contains(id))
            })
            .collect();

        let written = self.store.upsert_remote(kind, &mergeable).await?;
        Ok(written as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mirror::SqliteMirrorStore;
    use crate::test_support::InMemoryGateway;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::time::Duration;

    struct Fixture {
        store: Arc<SqliteMirrorStore>,
        gateway: Arc<InMemoryGateway>,
        tracker: Arc<ChangeTracker>,
        engine: Arc<ReconciliationEngine>,
    }

    async fn setup(name: &str) -> Fixture {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
            .await
            .unwrap();
        let store = Arc::new(SqliteMirrorStore::initialize(pool).await.unwrap());
        let gateway = Arc::new(InMemoryGateway::new());
        let tracker = Arc::new(ChangeTracker::new(store.clone()));
        let status = Arc::new(StatusBroadcaster::new(store.clone(), true));
        let engine = Arc::new(ReconciliationEngine::new(
            store.clone(),
            gateway.clone(),
            tracker.clone(),
            status,
        ));
        Fixture {
            store,
            gateway,
            tracker,
            engine,
        }
    }

    fn student_payload(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "student_id": format!("STU-{id}"),
            "name": name,
            "roll_number": "12",
            "class": "5",
            "created_at": "2026-03-01T09:00:00.000Z",
            "updated_at": "2026-03-01T09:00:00.000Z",
            "created_by": "admin"
        })
    }

    #[tokio::test]
    async fn offline_create_is_pushed_once_on_sync() {
        let f = setup("engine_push_create").await;
        f.tracker
            .record_create(EntityKind::Students, student_payload("s1", "Asha Verma"))
            .await
            .unwrap();

        let report = f.engine.sync_all().await.unwrap();

        assert!(!report.skipped);
        assert_eq!(report.pushed_count, 1);
        assert_eq!(f.gateway.insert_count(), 1);
        assert!(f.gateway.record(EntityKind::Students, "s1").is_some());

        let record = f
            .store
            .get(EntityKind::Students, "s1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.sync.sync_pending, 0);
    }

    #[tokio::test]
    async fn update_of_known_record_is_pushed_as_update() {
        let f = setup("engine_push_update").await;
        f.gateway
            .seed(EntityKind::Students, vec![student_payload("s1", "Asha Verma")]);
        f.engine.sync_all().await.unwrap();

        f.tracker
            .record_update(EntityKind::Students, "s1", json!({"roll_number": "14"}))
            .await
            .unwrap();
        let report = f.engine.sync_all().await.unwrap();

        assert_eq!(report.pushed_count, 1);
        assert_eq!(f.gateway.insert_count(), 0);
        assert_eq!(f.gateway.update_count(), 1);
        assert_eq!(
            f.gateway.record(EntityKind::Students, "s1").unwrap()["roll_number"],
            "14"
        );
    }

    #[tokio::test]
    async fn marked_delete_is_pushed_and_purged() {
        let f = setup("engine_push_delete").await;
        f.gateway
            .seed(EntityKind::Students, vec![student_payload("s1", "Asha Verma")]);
        f.engine.sync_all().await.unwrap();

        f.tracker
            .record_delete(EntityKind::Students, "s1")
            .await
            .unwrap();
        // The remote copy must not resurrect the record mid-delete.
        let report = f.engine.sync_all().await.unwrap();

        assert_eq!(report.purged_count, 1);
        assert_eq!(f.gateway.delete_count(), 1);
        assert!(f.gateway.record(EntityKind::Students, "s1").is_none());
        assert!(f
            .store
            .get(EntityKind::Students, "s1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn pull_never_overwrites_a_pending_record() {
        let f = setup("engine_local_wins").await;
        f.gateway
            .seed(EntityKind::Students, vec![student_payload("s1", "Remote Name")]);
        f.tracker
            .record_create(EntityKind::Students, student_payload("s1", "Local Name"))
            .await
            .unwrap();
        f.gateway.set_writes_failing(true);

        let report = f.engine.sync_all().await.unwrap();

        // The push failed, so the record is still inside its local-wins
        // window and the pulled remote copy must be skipped.
        assert_eq!(report.failed_count, 1);
        let record = f
            .store
            .get(EntityKind::Students, "s1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.payload["name"], "Local Name");
        assert_eq!(record.sync.sync_pending, 1);

        // Next cycle with a healthy remote converges.
        f.gateway.set_writes_failing(false);
        f.engine.sync_all().await.unwrap();
        assert_eq!(
            f.gateway.record(EntityKind::Students, "s1").unwrap()["name"],
            "Local Name"
        );
        let record = f
            .store
            .get(EntityKind::Students, "s1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.sync.sync_pending, 0);
    }

    #[tokio::test]
    async fn second_cycle_with_stable_state_is_a_no_op() {
        let f = setup("engine_idempotent").await;
        f.gateway
            .seed(EntityKind::Students, vec![student_payload("s1", "Asha Verma")]);

        f.engine.sync_all().await.unwrap();
        let first_sync = f.store.last_sync().await.unwrap().unwrap();
        let inserts = f.gateway.insert_count();
        let updates = f.gateway.update_count();

        let report = f.engine.sync_all().await.unwrap();

        assert_eq!(report.pushed_count, 0);
        assert_eq!(f.gateway.insert_count(), inserts);
        assert_eq!(f.gateway.update_count(), updates);
        assert_eq!(f.store.pending_count().await.unwrap(), 0);
        assert!(f.store.last_sync().await.unwrap().unwrap() >= first_sync);
    }

    #[tokio::test]
    async fn concurrent_triggers_run_exactly_one_cycle() {
        let f = setup("engine_single_flight").await;
        f.gateway.set_delay(Duration::from_millis(20));

        let (first, second) = tokio::join!(f.engine.sync_all(), f.engine.sync_all());
        let first = first.unwrap();
        let second = second.unwrap();

        assert!(first.skipped != second.skipped);
        // One network round: each of the seven tables fetched once.
        assert_eq!(f.gateway.select_count(), 7);
    }

    #[tokio::test]
    async fn pull_failure_skips_the_last_sync_stamp() {
        let f = setup("engine_pull_failure").await;
        f.gateway.fail_select_for(EntityKind::Teachers);

        let err = f.engine.sync_all().await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert!(f.store.last_sync().await.unwrap().is_none());

        // The gate is released; a later healthy cycle completes and stamps.
        assert!(!f.engine.is_syncing().await);
        f.gateway.clear_select_failures();
        f.engine.sync_all().await.unwrap();
        assert!(f.store.last_sync().await.unwrap().is_some());
    }
}
