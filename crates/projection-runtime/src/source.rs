use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use projection_core::{CollectionKey, ListOp};
use tracing::{trace, warn};

use crate::bus::UpdateBus;

/// Queue depth above which publishing logs a warning.
const QUEUE_DEPTH_WARN: usize = 1_024;

/// Producer of diff operations for exactly one collection.
///
/// Exactly one bound consumer drains a source at a time, in the order the
/// operations were enqueued. The initial snapshot arrives as the source's
/// first queued `Reset`/`Append`, not through a separate call.
pub trait DiffSource<T>: Send + Sync {
    /// Key of the collection this source feeds.
    fn collection_key(&self) -> CollectionKey;

    /// Whether operations are waiting to be drained.
    fn has_queued_op(&self) -> bool;

    /// Take the oldest queued operation, `None` when the queue is empty.
    fn drain_next(&self) -> Option<ListOp<T>>;
}

/// Ordered operation queue with wake notification.
///
/// Publishers enqueue operations and poke the bus; the bound controller
/// drains them in order on its own task. The queue itself is lossless,
/// since dropping an operation would desynchronize the projection; only
/// the wake channel is bounded.
pub struct DiffQueue<T> {
    key: CollectionKey,
    queue: Mutex<VecDeque<ListOp<T>>>,
    bus: UpdateBus,
}

impl<T> DiffQueue<T> {
    /// Create a queue feeding one collection over the given bus.
    pub fn new(key: CollectionKey, bus: UpdateBus) -> Arc<Self> {
        Arc::new(Self {
            key,
            queue: Mutex::new(VecDeque::new()),
            bus,
        })
    }

    /// Enqueue one operation and wake subscribers.
    pub fn publish(&self, op: ListOp<T>) {
        trace!(key = %self.key, op = op.kind(), "queueing operation");
        self.enqueue(std::iter::once(op));
        self.bus.notify(self.key.clone());
    }

    /// Enqueue a batch in order and wake subscribers once.
    pub fn publish_batch(&self, ops: Vec<ListOp<T>>) {
        if ops.is_empty() {
            return;
        }
        trace!(key = %self.key, batch = ops.len(), "queueing operation batch");
        self.enqueue(ops);
        self.bus.notify(self.key.clone());
    }

    fn enqueue(&self, ops: impl IntoIterator<Item = ListOp<T>>) {
        let mut queue = self.queue.lock().expect("diff queue lock poisoned");
        queue.extend(ops);
        if queue.len() >= QUEUE_DEPTH_WARN {
            warn!(
                key = %self.key,
                depth = queue.len(),
                "diff queue is unusually deep; is a consumer draining it?"
            );
        }
    }
}

impl<T: Send> DiffSource<T> for DiffQueue<T> {
    fn collection_key(&self) -> CollectionKey {
        self.key.clone()
    }

    fn has_queued_op(&self) -> bool {
        !self
            .queue
            .lock()
            .expect("diff queue lock poisoned")
            .is_empty()
    }

    fn drain_next(&self) -> Option<ListOp<T>> {
        self.queue
            .lock()
            .expect("diff queue lock poisoned")
            .pop_front()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;

    fn rooms_key() -> CollectionKey {
        CollectionKey::rooms("@alice:example.org")
    }

    #[test]
    fn drains_in_publish_order() {
        let bus = UpdateBus::new(8);
        let queue = DiffQueue::new(rooms_key(), bus);

        queue.publish(ListOp::PushBack {
            item: "a".to_owned(),
        });
        queue.publish(ListOp::PushBack {
            item: "b".to_owned(),
        });

        assert!(queue.has_queued_op());
        assert!(matches!(
            queue.drain_next(),
            Some(ListOp::PushBack { item }) if item == "a"
        ));
        assert!(matches!(
            queue.drain_next(),
            Some(ListOp::PushBack { item }) if item == "b"
        ));
        assert!(!queue.has_queued_op());
        assert!(queue.drain_next().is_none());
    }

    #[tokio::test]
    async fn publish_wakes_subscribers_with_the_queue_key() {
        let bus = UpdateBus::new(8);
        let mut updates = bus.subscribe();
        let queue = DiffQueue::new(rooms_key(), bus);

        queue.publish(ListOp::<String>::Clear);

        let woken = updates.recv().await.expect("wake should arrive");
        assert_eq!(woken, rooms_key());
    }

    #[tokio::test]
    async fn batch_publish_wakes_once() {
        let bus = UpdateBus::new(8);
        let mut updates = bus.subscribe();
        let queue = DiffQueue::new(rooms_key(), bus);

        queue.publish_batch(vec![
            ListOp::PushBack {
                item: "a".to_owned(),
            },
            ListOp::PushBack {
                item: "b".to_owned(),
            },
            ListOp::PopFront,
        ]);

        updates.try_recv().expect("one wake should be queued");
        assert!(matches!(updates.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn empty_batch_publishes_nothing() {
        let bus = UpdateBus::new(8);
        let mut updates = bus.subscribe();
        let queue = DiffQueue::<String>::new(rooms_key(), bus);

        queue.publish_batch(Vec::new());

        assert!(!queue.has_queued_op());
        assert!(matches!(updates.try_recv(), Err(TryRecvError::Empty)));
    }
}
