use crate::application::ports::connectivity::Connectivity;
use crate::application::ports::mirror_store::MirrorStore;
use crate::application::ports::remote_gateway::RemoteGateway;
use crate::application::services::change_tracker::ChangeTracker;
use crate::application::services::status::StatusBroadcaster;
use crate::domain::entities::{MirrorRecord, Stored, SyncProvenance};
use crate::domain::sync_record::{iso_timestamp, SyncRecord};
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Entry point for UI collaborators. Reads answer from the remote service
/// when possible and fall back to the mirror; writes land in the mirror
/// first and are pushed remotely best-effort, with reconciliation picking
/// up whatever the immediate push missed.
pub struct Repository {
    store: Arc<dyn MirrorStore>,
    tracker: Arc<ChangeTracker>,
    gateway: Arc<dyn RemoteGateway>,
    connectivity: Arc<dyn Connectivity>,
    status: Arc<StatusBroadcaster>,
    config: SyncConfig,
}

impl Repository {
    pub fn new(
        store: Arc<dyn MirrorStore>,
        tracker: Arc<ChangeTracker>,
        gateway: Arc<dyn RemoteGateway>,
        connectivity: Arc<dyn Connectivity>,
        status: Arc<StatusBroadcaster>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            tracker,
            gateway,
            connectivity,
            status,
            config,
        }
    }

    pub async fn list<R: SyncRecord>(&self) -> Result<Vec<Stored<R>>, AppError> {
        if !self.read_remote() {
            return self.list_local(None).await;
        }
        match self.list_remote::<R>(None).await {
            Ok(records) => Ok(records),
            Err(err) => {
                tracing::warn!(table = %R::KIND, "Remote read failed, answering from mirror: {}", err);
                self.list_local(None).await
            }
        }
    }

    /// Records belonging to one parent entity, e.g. the fee payments of a
    /// single student.
    pub async fn list_by_parent<R: SyncRecord>(
        &self,
        parent_id: &str,
    ) -> Result<Vec<Stored<R>>, AppError> {
        let field = R::KIND.parent_field().ok_or_else(|| {
            AppError::InvalidInput(format!("{} has no parent attribute", R::KIND))
        })?;

        if !self.read_remote() {
            return self.list_local(Some(parent_id)).await;
        }
        match self.list_remote::<R>(Some((field, parent_id))).await {
            Ok(records) => Ok(records),
            Err(err) => {
                tracing::warn!(table = %R::KIND, "Remote read failed, answering from mirror: {}", err);
                self.list_local(Some(parent_id)).await
            }
        }
    }

    /// Create a record: assign its client-side identity, write it to the
    /// mirror, then push it remotely best-effort. The returned record
    /// carries the resulting `sync_pending` state.
    pub async fn create<R: SyncRecord>(&self, mut record: R) -> Result<Stored<R>, AppError> {
        if record.id().is_empty() {
            record.assign_identity(Uuid::new_v4().to_string(), Utc::now());
        }
        let payload = serde_json::to_value(&record)?;
        let stored = self.tracker.record_create(R::KIND, payload).await?;
        let mut sync = stored.sync.clone();

        if self.push_remote() {
            match self.gateway.insert(R::KIND, stored.payload.clone()).await {
                Ok(()) => {
                    self.tracker.mark_synced(R::KIND, &stored.id).await?;
                    sync.sync_pending = 0;
                    sync.last_sync_attempt = Some(Utc::now());
                }
                Err(err) => {
                    tracing::warn!(table = %R::KIND, id = %stored.id, "Immediate push failed, record stays pending: {}", err);
                }
            }
        }

        self.status.notify().await;
        Ok(Stored::new(record, sync))
    }

    /// Merge a partial update into the mirrored record, then push the
    /// changed fields remotely best-effort.
    pub async fn update<R: SyncRecord>(
        &self,
        id: &str,
        patch: Value,
    ) -> Result<Stored<R>, AppError> {
        let mut patch = match patch {
            Value::Object(map) => map,
            _ => {
                return Err(AppError::InvalidInput(
                    "partial update must be a JSON object".to_string(),
                ));
            }
        };

        let existing = self
            .store
            .get(R::KIND, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} record {}", R::KIND, id)))?;
        if existing.payload.get("updated_at").is_some() {
            patch.insert(
                "updated_at".to_string(),
                Value::String(iso_timestamp(Utc::now())),
            );
        }
        let patch = Value::Object(patch);

        let merged = self
            .tracker
            .record_update(R::KIND, id, patch.clone())
            .await?;
        let mut sync = merged.sync.clone();

        if self.push_remote() {
            match self.gateway.update(R::KIND, id, patch).await {
                Ok(()) => {
                    self.tracker.mark_synced(R::KIND, id).await?;
                    sync.sync_pending = 0;
                    sync.last_sync_attempt = Some(Utc::now());
                }
                Err(err) => {
                    tracing::warn!(table = %R::KIND, id = %id, "Immediate push failed, record stays pending: {}", err);
                }
            }
        }

        let record = decode_payload::<R>(&merged)?;
        self.status.notify().await;
        Ok(Stored::new(record, sync))
    }

    /// Mark a record for deletion, then attempt the remote delete; the
    /// mirror row is purged only once the remote side has confirmed.
    pub async fn delete<R: SyncRecord>(&self, id: &str) -> Result<(), AppError> {
        self.tracker.record_delete(R::KIND, id).await?;

        if self.push_remote() {
            match self.gateway.delete(R::KIND, id).await {
                Ok(()) => {
                    self.store.delete(R::KIND, id).await?;
                }
                Err(err) => {
                    tracing::warn!(table = %R::KIND, id = %id, "Immediate delete failed, record stays marked: {}", err);
                }
            }
        }

        self.status.notify().await;
        Ok(())
    }

    fn read_remote(&self) -> bool {
        self.connectivity.is_online() && !self.config.prefer_offline
    }

    fn push_remote(&self) -> bool {
        self.connectivity.is_online() && self.config.auto_sync
    }

    async fn list_local<R: SyncRecord>(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<Stored<R>>, AppError> {
        let records = match parent_id {
            Some(parent_id) => self.store.list_by_parent(R::KIND, parent_id).await?,
            None => self.store.list(R::KIND).await?,
        };
        records
            .iter()
            .filter(|record| !record.sync.locally_deleted)
            .map(|record| Ok(Stored::new(decode_payload::<R>(record)?, record.sync.clone())))
            .collect()
    }

    async fn list_remote<R: SyncRecord>(
        &self,
        parent: Option<(&str, &str)>,
    ) -> Result<Vec<Stored<R>>, AppError> {
        let fetched_at = Utc::now();
        let values = self.gateway.select_all(R::KIND).await?;
        values
            .into_iter()
            .filter(|value| match parent {
                Some((field, parent_id)) => value
                    .get(field)
                    .and_then(Value::as_str)
                    .map_or(false, |v| v == parent_id),
                None => true,
            })
            .map(|value| {
                let record: R = serde_json::from_value(value)
                    .map_err(|err| AppError::DeserializationError(err.to_string()))?;
                Ok(Stored::new(record, SyncProvenance::synced(fetched_at)))
            })
            .collect()
    }
}

fn decode_payload<R: SyncRecord>(record: &MirrorRecord) -> Result<R, AppError> {
    serde_json::from_value(record.payload.clone())
        .map_err(|err| AppError::DeserializationError(err.to_string()))
}
