use projection_core::CollectionKey;
use tokio::sync::broadcast;
use tracing::trace;

/// Wake stream handed to drain loops.
pub type UpdateStream = broadcast::Receiver<CollectionKey>;

/// Broadcast channel announcing "operations are queued" per collection.
///
/// Wakes are idempotent pokes, not data: a receiver that lags only misses
/// wakes, and its next drain pass empties the queue regardless. The bus is
/// handed to every publisher and controller explicitly; there is no
/// process-wide instance.
#[derive(Clone, Debug)]
pub struct UpdateBus {
    tx: broadcast::Sender<CollectionKey>,
}

impl UpdateBus {
    /// Create a bus with the given wake capacity (`capacity >= 1`).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to queued-operation wakes.
    pub fn subscribe(&self) -> UpdateStream {
        self.tx.subscribe()
    }

    /// Announce queued operations for one collection.
    ///
    /// Delivery is best-effort; a bus without subscribers drops the wake.
    pub fn notify(&self, key: CollectionKey) {
        trace!(key = %key, "waking drain subscribers");
        let _ = self.tx.send(key);
    }
}
