use std::fmt;

use serde::{Deserialize, Serialize};

/// Routing identity of one remote collection.
///
/// A room list is keyed by account alone. A timeline needs the compound
/// account + room identity: one account serves many rooms, so the account
/// id by itself cannot route timeline wakes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CollectionKey {
    /// Owning account identifier.
    pub account_id: String,
    /// Room identifier for timeline collections; `None` for the room list.
    pub room_id: Option<String>,
}

impl CollectionKey {
    /// Key of an account's room-list collection.
    pub fn rooms(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            room_id: None,
        }
    }

    /// Key of one room's timeline collection.
    pub fn timeline(account_id: impl Into<String>, room_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            room_id: Some(room_id.into()),
        }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.room_id {
            Some(room_id) => write!(f, "{}/{}", self.account_id, room_id),
            None => f.write_str(&self.account_id),
        }
    }
}
