use tokio::sync::watch;

/// Network-availability source: a current snapshot plus a subscription for
/// online/offline transitions, fed by the embedding host.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;

    fn watch(&self) -> watch::Receiver<bool>;
}
