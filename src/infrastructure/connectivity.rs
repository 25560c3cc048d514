use crate::application::ports::connectivity::Connectivity;
use tokio::sync::watch;

/// Connectivity source fed by the embedding host: the host pushes the
/// platform's online/offline transitions into `set_online`, and the sync
/// services observe them through the watch channel.
pub struct HostConnectivity {
    tx: watch::Sender<bool>,
}

impl HostConnectivity {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        Self { tx }
    }

    pub fn set_online(&self, online: bool) {
        // send_replace keeps working with zero subscribers.
        self.tx.send_replace(online);
    }
}

impl Connectivity for HostConnectivity {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
