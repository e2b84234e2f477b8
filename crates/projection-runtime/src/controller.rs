use std::sync::{Arc, Mutex};

use projection_core::{ChangeNotifier, CollectionKey, NoticeSink, ProjectionStore};
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{
    bus::{UpdateBus, UpdateStream},
    source::DiffSource,
};

/// Store handle shared between the drain task and row-query callers.
pub type SharedStore<T> = Arc<Mutex<ProjectionStore<T>>>;

/// Lifecycle phase of a projection controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingPhase {
    /// No source attached; queries see an empty projection.
    Unbound,
    /// Previous binding torn down, new one not yet live.
    Binding,
    /// Drain task running against the bound source.
    Bound,
}

struct ActiveBinding<T> {
    key: CollectionKey,
    store: SharedStore<T>,
    stop: CancellationToken,
    task: JoinHandle<()>,
}

/// Wires one diff source to a projection store and change notifier.
///
/// At most one source is bound at a time. Rebinding tears the previous
/// binding down before the new store exists, so a notice can never arrive
/// against the wrong store: every binding owns a distinct store, stop
/// token, and bus subscription, and a cancelled drain task stops touching
/// its (now detached) store before the next operation.
pub struct ProjectionController<T> {
    bus: UpdateBus,
    phase: BindingPhase,
    binding: Option<ActiveBinding<T>>,
    generation: u64,
}

impl<T: Send + 'static> ProjectionController<T> {
    /// Create an unbound controller on the given bus.
    pub fn new(bus: UpdateBus) -> Self {
        Self {
            bus,
            phase: BindingPhase::Unbound,
            binding: None,
            generation: 0,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> BindingPhase {
        self.phase
    }

    /// Whether a source is currently bound.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Key of the bound collection.
    pub fn bound_key(&self) -> Option<&CollectionKey> {
        self.binding.as_ref().map(|binding| &binding.key)
    }

    /// Monotonic binding generation, bumped by every `bind`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Store handle of the active binding.
    pub fn store(&self) -> Option<SharedStore<T>> {
        self.binding
            .as_ref()
            .map(|binding| Arc::clone(&binding.store))
    }

    /// Attach a source, replacing any previous binding.
    ///
    /// A fresh empty store is created per binding. The collection's
    /// current contents arrive as the source's first queued operations
    /// and are applied like any later batch; there is no snapshot
    /// special case. Returns the new binding's store handle.
    pub fn bind(&mut self, source: Arc<dyn DiffSource<T>>, sink: NoticeSink) -> SharedStore<T> {
        self.set_phase(BindingPhase::Binding);
        self.release_binding();

        self.generation += 1;
        let generation = self.generation;
        let key = source.collection_key();
        let store: SharedStore<T> = Arc::new(Mutex::new(ProjectionStore::new()));
        let notifier = ChangeNotifier::new(sink);
        let stop = CancellationToken::new();

        debug!(key = %key, generation, "binding projection to source");

        let updates = self.bus.subscribe();
        let task = tokio::spawn(drain_worker(
            source,
            Arc::clone(&store),
            notifier,
            key.clone(),
            updates,
            stop.child_token(),
            generation,
        ));

        self.binding = Some(ActiveBinding {
            key,
            store: Arc::clone(&store),
            stop,
            task,
        });
        self.set_phase(BindingPhase::Bound);
        store
    }

    /// Detach the bound source and drop its store.
    ///
    /// Safe to call repeatedly; unbinding an unbound controller is a
    /// no-op.
    pub fn unbind(&mut self) {
        if self.binding.is_none() {
            return;
        }
        self.release_binding();
        self.set_phase(BindingPhase::Unbound);
    }

    fn release_binding(&mut self) {
        let Some(binding) = self.binding.take() else {
            return;
        };
        debug!(
            key = %binding.key,
            generation = self.generation,
            "releasing projection binding"
        );
        binding.stop.cancel();
        binding.task.abort();
    }

    fn set_phase(&mut self, next: BindingPhase) {
        if self.phase != next {
            trace!(from = ?self.phase, to = ?next, "binding phase change");
            self.phase = next;
        }
    }
}

impl<T> Drop for ProjectionController<T> {
    fn drop(&mut self) {
        if let Some(binding) = self.binding.take() {
            binding.stop.cancel();
            binding.task.abort();
        }
    }
}

async fn drain_worker<T: Send + 'static>(
    source: Arc<dyn DiffSource<T>>,
    store: SharedStore<T>,
    notifier: ChangeNotifier,
    key: CollectionKey,
    mut updates: UpdateStream,
    stop: CancellationToken,
    generation: u64,
) {
    debug!(key = %key, generation, "drain worker started");

    // Operations queued before this subscription existed get no further
    // wake; drain whatever is already waiting.
    drain_queued(source.as_ref(), &store, &notifier, &key, &stop);

    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            wake = updates.recv() => match wake {
                Ok(woken) if woken == key => {
                    drain_queued(source.as_ref(), &store, &notifier, &key, &stop);
                }
                Ok(other) => {
                    trace!(key = %key, woken = %other, "ignoring wake for unrelated collection");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(key = %key, skipped, "wake stream lagged; draining to resynchronize");
                    drain_queued(source.as_ref(), &store, &notifier, &key, &stop);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    debug!(key = %key, generation, "drain worker exiting");
}

/// Drain every queued operation in source order, one notice per operation.
///
/// The store lock is taken per operation and released before the notice is
/// emitted, so a sink may query the projection re-entrantly. Cancellation
/// is checked before every operation; a drain cut short leaves the
/// remaining operations queued for nobody, which is exactly what unbind
/// intends.
fn drain_queued<T>(
    source: &dyn DiffSource<T>,
    store: &SharedStore<T>,
    notifier: &ChangeNotifier,
    key: &CollectionKey,
    stop: &CancellationToken,
) {
    let mut applied = 0usize;
    while !stop.is_cancelled() && source.has_queued_op() {
        let Some(op) = source.drain_next() else {
            break;
        };
        trace!(key = %key, op = op.kind(), "applying queued operation");
        let change = {
            let mut store = store.lock().expect("projection store lock poisoned");
            store.apply(op)
        };
        notifier.notify(&change);
        applied += 1;
    }

    if applied > 0 {
        debug!(key = %key, applied, "drained queued operations");
    }
}
