use crate::application::ports::connectivity::Connectivity;
use crate::application::ports::mirror_store::MirrorStore;
use crate::application::ports::remote_gateway::RemoteGateway;
use crate::application::services::{
    ChangeTracker, ConnectivityMonitor, ReconciliationEngine, Repository, StatusBroadcaster,
};
use crate::domain::entities::{ChangeIntent, SyncReport};
use crate::infrastructure::connectivity::HostConnectivity;
use crate::infrastructure::mirror::SqliteMirrorStore;
use crate::shared::config::AppConfig;
use crate::shared::error::{AppError, Result};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Explicitly constructed service graph: mirror store, change tracker,
/// reconciliation engine, connectivity monitor, status broadcaster and the
/// repository facade, wired over one SQLite pool. The embedding host
/// supplies the remote gateway and feeds connectivity transitions through
/// `set_online`.
pub struct AppState {
    pub config: AppConfig,
    pub repository: Arc<Repository>,
    pub engine: Arc<ReconciliationEngine>,
    pub monitor: Arc<ConnectivityMonitor>,
    pub status: Arc<StatusBroadcaster>,
    connectivity: Arc<HostConnectivity>,
    store: Arc<dyn MirrorStore>,
}

impl AppState {
    pub async fn new(
        config: AppConfig,
        gateway: Arc<dyn RemoteGateway>,
        initially_online: bool,
    ) -> Result<Self> {
        config.validate().map_err(AppError::ConfigurationError)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.connection_timeout))
            .connect(&config.database.url)
            .await?;

        let store: Arc<dyn MirrorStore> = Arc::new(
            SqliteMirrorStore::initialize(pool)
                .await?
                .with_batch_size(config.sync.batch_size as usize),
        );

        let connectivity = Arc::new(HostConnectivity::new(initially_online));
        let tracker = Arc::new(ChangeTracker::new(store.clone()));
        let status = Arc::new(StatusBroadcaster::new(store.clone(), initially_online));
        let engine = Arc::new(ReconciliationEngine::new(
            store.clone(),
            gateway.clone(),
            tracker.clone(),
            status.clone(),
        ));
        let monitor = Arc::new(ConnectivityMonitor::new(
            connectivity.clone(),
            engine.clone(),
            status.clone(),
            Duration::from_secs(config.sync.sync_interval),
        ));
        let repository = Arc::new(Repository::new(
            store.clone(),
            tracker,
            gateway,
            connectivity.clone(),
            status.clone(),
            config.sync.clone(),
        ));

        Ok(Self {
            config,
            repository,
            engine,
            monitor,
            status,
            connectivity,
            store,
        })
    }

    /// Begin watching connectivity and running periodic sync cycles.
    pub fn start(&self) {
        self.monitor.start();
    }

    /// Stop triggering new cycles; an in-flight cycle finishes naturally.
    pub fn shutdown(&self) {
        self.monitor.stop();
    }

    /// Host bridge for platform online/offline transitions.
    pub fn set_online(&self, online: bool) {
        self.connectivity.set_online(online);
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// User-initiated sync: one cycle if online and idle.
    pub async fn sync_now(&self) -> Result<SyncReport> {
        if !self.is_online() {
            tracing::debug!("sync_now ignored while offline");
            return Ok(SyncReport::skipped());
        }
        self.engine.sync_all().await
    }

    /// Audit view of the change-intent log.
    pub async fn change_intents(&self) -> Result<Vec<ChangeIntent>> {
        self.store.change_intents().await
    }

    pub async fn clear_change_intents(&self) -> Result<()> {
        self.store.clear_change_intents().await
    }
}
