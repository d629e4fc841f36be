//! Process-wide "cart changed" notification.
//!
//! Built on `tokio::sync::watch`: the value is a version counter bumped on
//! every change. Subscribers see at least one wakeup after any change, but
//! a burst of changes may be observed as a single wakeup.

use std::sync::Arc;
use tokio::sync::watch;

/// Sender side. Cheap to clone; all clones share one channel.
#[derive(Clone)]
pub struct CartSignal {
    tx: Arc<watch::Sender<u64>>,
}

impl Default for CartSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CartSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Announce that the server-side cart changed.
    pub fn notify(&self) {
        self.tx.send_modify(|version| *version = version.wrapping_add(1));
        tracing::debug!("Cart changed, version: {}", *self.tx.borrow());
    }

    pub fn subscribe(&self) -> CartSubscription {
        CartSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of changes announced so far.
    pub fn version(&self) -> u64 {
        *self.tx.borrow()
    }
}

/// Receiver side, one per listener.
pub struct CartSubscription {
    rx: watch::Receiver<u64>,
}

impl CartSubscription {
    /// Wait for the next change. Returns `false` once every sender is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Whether a change arrived that has not been waited on yet.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}
