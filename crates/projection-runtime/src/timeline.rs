use std::sync::Arc;

use projection_core::{CollectionKey, NoticeSink};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    bus::UpdateBus,
    controller::{BindingPhase, ProjectionController},
    source::DiffSource,
};

/// Default number of older events requested per pagination step.
pub const DEFAULT_FETCH_BATCH: u16 = 20;

/// Hard cap on a single pagination request.
pub const FETCH_LIMIT_CAP: u16 = 100;

/// One event as projected into a room timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineItem {
    /// Server-assigned event id; `None` while the event is a local echo.
    pub event_id: Option<String>,
    /// Sender's user id.
    pub sender: String,
    /// Message body.
    pub body: String,
    /// Origin timestamp, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

/// Data roles a timeline view can query per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineRole {
    EventId,
    Body,
    Timestamp,
}

impl TimelineRole {
    /// Stable role name as exposed to view bindings.
    pub fn name(self) -> &'static str {
        match self {
            TimelineRole::EventId => "eventId",
            TimelineRole::Body => "body",
            TimelineRole::Timestamp => "timestamp",
        }
    }
}

/// Callback asked to fetch older history; receives the bounded event count.
pub type PaginationHook = Arc<dyn Fn(u16) + Send + Sync + 'static>;

/// Timeline projection bound to at most one room's event stream.
///
/// Older history arrives through the same diff stream as live events
/// (the source prepends it), so pagination here is only a request hook;
/// the model never mutates its own rows.
pub struct TimelineModel {
    controller: ProjectionController<TimelineItem>,
    pagination: Option<PaginationHook>,
    fetch_batch: u16,
}

impl TimelineModel {
    /// Create an unbound model on the given bus.
    pub fn new(bus: UpdateBus) -> Self {
        Self {
            controller: ProjectionController::new(bus),
            pagination: None,
            fetch_batch: DEFAULT_FETCH_BATCH,
        }
    }

    /// Bind to a room's event stream, replacing any previous binding.
    pub fn bind(&mut self, source: Arc<dyn DiffSource<TimelineItem>>, sink: NoticeSink) {
        self.controller.bind(source, sink);
    }

    /// Detach from the bound stream; the model reads as empty afterwards.
    pub fn unbind(&mut self) {
        self.controller.unbind();
    }

    /// Current binding phase.
    pub fn phase(&self) -> BindingPhase {
        self.controller.phase()
    }

    /// Key of the bound collection.
    pub fn bound_key(&self) -> Option<&CollectionKey> {
        self.controller.bound_key()
    }

    /// Install the callback used to request older history.
    pub fn set_pagination_hook(&mut self, hook: PaginationHook) {
        self.pagination = Some(hook);
    }

    /// Set the per-request batch size, clamped to at least one event.
    pub fn set_fetch_batch(&mut self, batch: u16) {
        self.fetch_batch = batch.max(1);
    }

    /// Whether a pagination request would currently go anywhere.
    pub fn can_fetch_older(&self) -> bool {
        self.controller.is_bound() && self.pagination.is_some()
    }

    /// Ask the source for older history. A no-op while unbound or without
    /// a pagination hook.
    pub fn fetch_older(&self) {
        if !self.controller.is_bound() {
            debug!("ignoring pagination request on unbound timeline");
            return;
        }
        let Some(hook) = &self.pagination else {
            debug!("ignoring pagination request without a hook");
            return;
        };
        (hook)(bounded_fetch_limit(self.fetch_batch, FETCH_LIMIT_CAP));
    }

    /// Number of projected rows; zero while unbound.
    pub fn row_count(&self) -> usize {
        match self.controller.store() {
            Some(store) => store.lock().expect("timeline store lock poisoned").len(),
            None => 0,
        }
    }

    /// Clone of the row at `row`, if in range.
    pub fn item_at(&self, row: usize) -> Option<TimelineItem> {
        let store = self.controller.store()?;
        let store = store.lock().expect("timeline store lock poisoned");
        store.get(row).cloned()
    }

    /// Role data for one row, `None` when the row is out of range or the
    /// model is unbound.
    pub fn data(&self, row: usize, role: TimelineRole) -> Option<String> {
        let item = self.item_at(row)?;
        let value = match role {
            TimelineRole::EventId => item.event_id.unwrap_or_default(),
            TimelineRole::Body => item.body,
            TimelineRole::Timestamp => item.timestamp_ms.to_string(),
        };
        Some(value)
    }
}

/// Clamp a pagination request to something the source will accept.
///
/// The result is always in `1..=100`.
pub fn bounded_fetch_limit(requested: u16, source_cap: u16) -> u16 {
    requested.max(1).min(source_cap.max(1)).min(100)
}
