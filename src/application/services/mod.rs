pub mod change_tracker;
pub mod connectivity_monitor;
pub mod reconciliation;
pub mod repository;
pub mod status;

pub use change_tracker::ChangeTracker;
pub use connectivity_monitor::ConnectivityMonitor;
pub use reconciliation::ReconciliationEngine;
pub use repository::Repository;
pub use status::{StatusBroadcaster, SyncStatus};
