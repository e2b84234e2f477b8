//! Binding layer between diff streams and view-facing list models.
//!
//! A [`DiffQueue`] carries one collection's operation stream and pokes the
//! shared [`UpdateBus`] whenever work is queued. A [`ProjectionController`]
//! owns the bound side: it subscribes to the bus, drains the queue on a
//! later task turn, applies each operation to its store, and emits exactly
//! one change notice per operation. [`RoomListModel`] and [`TimelineModel`]
//! wrap controllers with the role-based row queries views consume.

/// Broadcast wake channel keyed by collection.
pub mod bus;
/// Binding lifecycle and the drain task.
pub mod controller;
/// Asynchronous avatar fetching.
pub mod images;
/// Room list projection and roles.
pub mod rooms;
/// Diff source trait and the queue-backed implementation.
pub mod source;
/// Timeline projection, roles, and pagination requests.
pub mod timeline;

pub use bus::{UpdateBus, UpdateStream};
pub use controller::{BindingPhase, ProjectionController, SharedStore};
pub use images::{AvatarLoader, ImageReady};
pub use rooms::{RoomItem, RoomListModel, RoomRole};
pub use source::{DiffQueue, DiffSource};
pub use timeline::{PaginationHook, TimelineItem, TimelineModel, TimelineRole};
