use crate::application::ports::mirror_store::MirrorStore;
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub is_online: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub pending_changes: u64,
    pub is_syncing: bool,
}

/// Recomputes a status snapshot on every notify-worthy event and publishes
/// it through a watch channel. Subscribing returns a receiver; dropping it
/// unsubscribes.
pub struct StatusBroadcaster {
    store: Arc<dyn MirrorStore>,
    online: AtomicBool,
    syncing: AtomicBool,
    tx: watch::Sender<SyncStatus>,
}

impl StatusBroadcaster {
    pub fn new(store: Arc<dyn MirrorStore>, initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(SyncStatus {
            is_online: initially_online,
            ..SyncStatus::default()
        });
        Self {
            store,
            online: AtomicBool::new(initially_online),
            syncing: AtomicBool::new(false),
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.tx.subscribe()
    }

    /// Current snapshot, recomputed against the mirror.
    pub async fn status(&self) -> Result<SyncStatus, AppError> {
        self.compute().await
    }

    pub async fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        self.notify().await;
    }

    pub async fn set_syncing(&self, syncing: bool) {
        self.syncing.store(syncing, Ordering::SeqCst);
        self.notify().await;
    }

    /// Recompute and publish. Store failures are logged, not propagated:
    /// status fan-out must never break the write path that triggered it.
    pub async fn notify(&self) {
        match self.compute().await {
            Ok(status) => {
                self.tx.send_replace(status);
            }
            Err(err) => {
                tracing::warn!("Failed to refresh sync status: {}", err);
            }
        }
    }

    async fn compute(&self) -> Result<SyncStatus, AppError> {
        let pending_changes = self.store.pending_count().await?;
        let last_sync = self.store.last_sync().await?;
        Ok(SyncStatus {
            is_online: self.online.load(Ordering::SeqCst),
            last_sync,
            pending_changes,
            is_syncing: self.syncing.load(Ordering::SeqCst),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::EntityKind;
    use crate::infrastructure::mirror::SqliteMirrorStore;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup(name: &str) -> (StatusBroadcaster, Arc<SqliteMirrorStore>) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
            .await
            .unwrap();
        let store = Arc::new(SqliteMirrorStore::initialize(pool).await.unwrap());
        (StatusBroadcaster::new(store.clone(), false), store)
    }

    #[tokio::test]
    async fn pending_count_tracks_the_mirror() {
        let (broadcaster, store) = setup("status_pending").await;

        let payload = json!({
            "id": "s1",
            "student_id": "STU-001",
            "name": "Asha Verma",
            "roll_number": "12",
            "class": "5",
            "created_at": "2026-03-01T09:00:00.000Z",
            "updated_at": "2026-03-01T09:00:00.000Z",
            "created_by": "admin"
        });
        store
            .insert_local(EntityKind::Students, payload)
            .await
            .unwrap();

        let status = broadcaster.status().await.unwrap();
        assert_eq!(status.pending_changes, 1);
        assert!(!status.is_online);
        assert!(!status.is_syncing);

        store.mark_synced(EntityKind::Students, "s1").await.unwrap();
        assert_eq!(broadcaster.status().await.unwrap().pending_changes, 0);
    }

    #[tokio::test]
    async fn subscribers_observe_state_changes() {
        let (broadcaster, _store) = setup("status_subscribe").await;
        let mut rx = broadcaster.subscribe();

        broadcaster.set_online(true).await;
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_online);

        broadcaster.set_syncing(true).await;
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_syncing);

        // Dropping the receiver unsubscribes; broadcasting keeps working.
        drop(rx);
        broadcaster.set_syncing(false).await;
    }
}
