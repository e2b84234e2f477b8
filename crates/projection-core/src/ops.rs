use serde::{Deserialize, Serialize};

/// One mutation of an ordered remote collection.
///
/// Operations arrive in source order. Every index is relative to the
/// sequence as left by all earlier operations in the same stream; no
/// operation may be reordered or coalesced across that boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ListOp<T> {
    /// Extend the sequence at the end with one or more items.
    Append {
        /// New items in display order; must be non-empty.
        items: Vec<T>,
    },
    /// Remove all items.
    Clear,
    /// Insert one item at position 0.
    PushFront {
        /// Item taking position 0.
        item: T,
    },
    /// Insert one item at the end.
    PushBack {
        /// Item taking the last position.
        item: T,
    },
    /// Remove the item at position 0.
    PopFront,
    /// Remove the last item.
    PopBack,
    /// Insert one item at an arbitrary position.
    Insert {
        /// Target position; `index == len` inserts at the end.
        index: usize,
        /// Item taking the target position.
        item: T,
    },
    /// Replace the item at a position in place; the length does not change.
    Set {
        /// Position of the item being replaced.
        index: usize,
        /// Replacement item.
        item: T,
    },
    /// Remove the item at an arbitrary position.
    Remove {
        /// Position of the item being removed.
        index: usize,
    },
    /// Drop every item from a position to the end, inclusive.
    Truncate {
        /// New sequence length; equivalently the first removed position.
        len: usize,
    },
    /// Replace the entire contents.
    Reset {
        /// Replacement items in display order; may be empty.
        items: Vec<T>,
    },
}

impl<T> ListOp<T> {
    /// Stable lowercase label for logs and error text.
    pub fn kind(&self) -> &'static str {
        match self {
            ListOp::Append { .. } => "append",
            ListOp::Clear => "clear",
            ListOp::PushFront { .. } => "push_front",
            ListOp::PushBack { .. } => "push_back",
            ListOp::PopFront => "pop_front",
            ListOp::PopBack => "pop_back",
            ListOp::Insert { .. } => "insert",
            ListOp::Set { .. } => "set",
            ListOp::Remove { .. } => "remove",
            ListOp::Truncate { .. } => "truncate",
            ListOp::Reset { .. } => "reset",
        }
    }
}
