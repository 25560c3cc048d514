use crate::application::ports::connectivity::Connectivity;
use crate::application::services::reconciliation::ReconciliationEngine;
use crate::application::services::status::StatusBroadcaster;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

/// Watches online/offline transitions. Regaining connectivity triggers an
/// immediate reconciliation cycle and restarts the periodic timer; going
/// offline stops triggering new cycles while an in-flight cycle finishes
/// naturally.
pub struct ConnectivityMonitor {
    connectivity: Arc<dyn Connectivity>,
    engine: Arc<ReconciliationEngine>,
    status: Arc<StatusBroadcaster>,
    interval: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectivityMonitor {
    pub fn new(
        connectivity: Arc<dyn Connectivity>,
        engine: Arc<ReconciliationEngine>,
        status: Arc<StatusBroadcaster>,
        interval: Duration,
    ) -> Self {
        Self {
            connectivity,
            engine,
            status,
            interval,
            handle: Mutex::new(None),
        }
    }

    /// Spawn the watch task. Starting an already-started monitor is a no-op.
    pub fn start(&self) {
        let mut guard = self.handle.lock().unwrap();
        if guard.is_some() {
            return;
        }

        let connectivity = self.connectivity.clone();
        let engine = self.engine.clone();
        let status = self.status.clone();
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut rx = connectivity.watch();
            let mut online = connectivity.is_online();
            status.set_online(online).await;
            let mut ticker = interval_at(Instant::now() + period, period);

            loop {
                if online {
                    tokio::select! {
                        changed = rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            online = *rx.borrow();
                            status.set_online(online).await;
                        }
                        _ = ticker.tick() => {
                            spawn_cycle(engine.clone());
                        }
                    }
                } else {
                    if rx.changed().await.is_err() {
                        break;
                    }
                    online = *rx.borrow();
                    status.set_online(online).await;
                    if online {
                        tracing::info!("Connectivity restored, starting sync");
                        spawn_cycle(engine.clone());
                        ticker = interval_at(Instant::now() + period, period);
                    }
                }
            }
        });

        *guard = Some(handle);
    }

    /// Stop watching. An in-flight cycle keeps running to completion.
    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().unwrap().take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.lock().unwrap().is_some()
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

// Cycles are fired without awaiting so a slow remote never blocks the
// transition watch; the engine's gate serializes them.
fn spawn_cycle(engine: Arc<ReconciliationEngine>) {
    tokio::spawn(async move {
        if let Err(err) = engine.sync_all().await {
            tracing::error!("Background sync failed: {}", err);
        }
    });
}
