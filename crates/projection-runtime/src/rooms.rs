use std::sync::Arc;

use projection_core::{CollectionKey, NoticeSink};
use serde::{Deserialize, Serialize};

use crate::{
    bus::UpdateBus,
    controller::{BindingPhase, ProjectionController},
    source::DiffSource,
};

const AVATAR_URI_PREFIX: &str = "image://avatar/";

/// One joined room as projected into the room list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomItem {
    /// Canonical room id, unique per account.
    pub room_id: String,
    /// Resolved display name, if the room has one.
    pub name: Option<String>,
    /// Unread notification count.
    pub unread_notifications: u64,
    /// Unread highlight (mention) count.
    pub highlight_count: u64,
    /// Whether this is a direct chat.
    pub is_direct: bool,
}

/// Data roles a room list view can query per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomRole {
    RoomId,
    DisplayName,
    AvatarUrl,
}

impl RoomRole {
    /// Stable role name as exposed to view bindings.
    pub fn name(self) -> &'static str {
        match self {
            RoomRole::RoomId => "roomId",
            RoomRole::DisplayName => "displayName",
            RoomRole::AvatarUrl => "avatarUrl",
        }
    }
}

/// Room list projection bound to at most one account's room stream.
pub struct RoomListModel {
    controller: ProjectionController<RoomItem>,
}

impl RoomListModel {
    /// Create an unbound model on the given bus.
    pub fn new(bus: UpdateBus) -> Self {
        Self {
            controller: ProjectionController::new(bus),
        }
    }

    /// Bind to an account's room stream, replacing any previous binding.
    pub fn bind(&mut self, source: Arc<dyn DiffSource<RoomItem>>, sink: NoticeSink) {
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

    /// Number of projected rows; zero while unbound.
    pub fn row_count(&self) -> usize {
        match self.controller.store() {
            Some(store) => store.lock().expect("room list store lock poisoned").len(),
            None => 0,
        }
    }

    /// Clone of the row at `row`, if in range.
    pub fn item_at(&self, row: usize) -> Option<RoomItem> {
        let store = self.controller.store()?;
        let store = store.lock().expect("room list store lock poisoned");
        store.get(row).cloned()
    }

    /// Role data for one row, `None` when the row is out of range or the
    /// model is unbound.
    pub fn data(&self, row: usize, role: RoomRole) -> Option<String> {
        let item = self.item_at(row)?;
        let value = match role {
            RoomRole::RoomId => item.room_id,
            RoomRole::DisplayName => display_name(&item),
            RoomRole::AvatarUrl => avatar_url(&item.room_id),
        };
        Some(value)
    }
}

/// Display name for a room, falling back to the room id when the room has
/// no usable name.
pub fn display_name(item: &RoomItem) -> String {
    match item.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => item.room_id.clone(),
    }
}

/// Avatar URL for a room, routed through the image provider scheme.
pub fn avatar_url(room_id: &str) -> String {
    format!("{AVATAR_URI_PREFIX}{room_id}")
}

/// Image id embedded in an avatar URL, `None` for foreign URLs.
pub fn avatar_image_id(url: &str) -> Option<&str> {
    url.strip_prefix(AVATAR_URI_PREFIX)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use projection_core::ListOp;
    use tokio::time::{sleep, timeout};

    use super::*;
    use crate::source::DiffQueue;

    fn room(room_id: &str, name: Option<&str>) -> RoomItem {
        RoomItem {
            room_id: room_id.to_owned(),
            name: name.map(str::to_owned),
            unread_notifications: 0,
            highlight_count: 0,
            is_direct: false,
        }
    }

    fn quiet_sink() -> NoticeSink {
        Arc::new(|_notice| {})
    }

    async fn wait_until(description: &str, condition: impl Fn() -> bool) {
        timeout(Duration::from_secs(2), async {
            while !condition() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting until {description}"));
    }

    #[tokio::test]
    async fn projects_published_rooms_into_rows() {
        let bus = UpdateBus::new(8);
        let queue = DiffQueue::new(CollectionKey::rooms("@alice:example.org"), bus.clone());
        let mut model = RoomListModel::new(bus);
        model.bind(Arc::clone(&queue) as _, quiet_sink());

        queue.publish_batch(vec![
            ListOp::Reset {
                items: vec![room("!general:example.org", Some("General"))],
            },
            ListOp::PushBack {
                item: room("!noname:example.org", None),
            },
        ]);

        wait_until("both rooms are projected", || model.row_count() == 2).await;
        assert_eq!(
            model.data(0, RoomRole::RoomId).as_deref(),
            Some("!general:example.org")
        );
        assert_eq!(model.data(0, RoomRole::DisplayName).as_deref(), Some("General"));
        assert_eq!(
            model.data(0, RoomRole::AvatarUrl).as_deref(),
            Some("image://avatar/!general:example.org")
        );
        assert_eq!(
            model.bound_key(),
            Some(&CollectionKey::rooms("@alice:example.org"))
        );
    }

    #[test]
    fn display_name_falls_back_to_the_room_id() {
        let unnamed = room("!noname:example.org", None);
        let blank = room("!blank:example.org", Some("   "));
        let named = room("!named:example.org", Some("Rust Hackers"));

        assert_eq!(display_name(&unnamed), "!noname:example.org");
        assert_eq!(display_name(&blank), "!blank:example.org");
        assert_eq!(display_name(&named), "Rust Hackers");
    }

    #[test]
    fn avatar_urls_round_trip_to_image_ids() {
        let url = avatar_url("!general:example.org");
        assert_eq!(url, "image://avatar/!general:example.org");
        assert_eq!(avatar_image_id(&url), Some("!general:example.org"));
        assert_eq!(avatar_image_id("https://example.org/pic.png"), None);
    }

    #[tokio::test]
    async fn out_of_range_and_unbound_queries_read_empty() {
        let bus = UpdateBus::new(8);
        let mut model = RoomListModel::new(bus.clone());
        assert_eq!(model.row_count(), 0);
        assert!(model.data(0, RoomRole::RoomId).is_none());

        let queue = DiffQueue::new(CollectionKey::rooms("@alice:example.org"), bus);
        model.bind(Arc::clone(&queue) as _, quiet_sink());
        queue.publish(ListOp::Reset {
            items: vec![room("!only:example.org", Some("Only"))],
        });

        wait_until("the single room is projected", || model.row_count() == 1).await;
        assert!(model.item_at(1).is_none());
        assert!(model.data(7, RoomRole::DisplayName).is_none());

        model.unbind();
        assert_eq!(model.row_count(), 0);
        assert!(model.item_at(0).is_none());
    }

    #[test]
    fn keeps_role_names_stable() {
        assert_eq!(RoomRole::RoomId.name(), "roomId");
        assert_eq!(RoomRole::DisplayName.name(), "displayName");
        assert_eq!(RoomRole::AvatarUrl.name(), "avatarUrl");
    }
}
