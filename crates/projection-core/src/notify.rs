use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::AppliedChange;

/// Callback delivering list-model notices to one frontend observer.
pub type NoticeSink = Arc<dyn Fn(ModelNotice) + Send + Sync + 'static>;

/// List-model notification emitted for exactly one applied operation.
///
/// Ranges are inclusive and match what a virtualized list view expects:
/// inserted ranges are post-insert indices, removed ranges are the indices
/// the rows occupied before the removal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModelNotice {
    /// Rows `first..=last` were inserted.
    RowsInserted {
        /// First inserted row.
        first: usize,
        /// Last inserted row.
        last: usize,
    },
    /// Rows `first..=last` (pre-removal indices) were removed.
    RowsRemoved {
        /// First removed row.
        first: usize,
        /// Last removed row.
        last: usize,
    },
    /// Row `index` changed in place; no structural change.
    RowChanged {
        /// Changed row.
        index: usize,
    },
    /// Every previously held row reference is invalid.
    ModelReset,
}

impl ModelNotice {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelNotice::RowsInserted { .. } => "rows_inserted",
            ModelNotice::RowsRemoved { .. } => "rows_removed",
            ModelNotice::RowChanged { .. } => "row_changed",
            ModelNotice::ModelReset => "model_reset",
        }
    }
}

impl From<&AppliedChange> for ModelNotice {
    fn from(change: &AppliedChange) -> Self {
        match *change {
            AppliedChange::Inserted { first, last } => ModelNotice::RowsInserted { first, last },
            AppliedChange::Removed { first, last } => ModelNotice::RowsRemoved { first, last },
            AppliedChange::Changed { index } => ModelNotice::RowChanged { index },
            AppliedChange::Reset => ModelNotice::ModelReset,
        }
    }
}

/// Translates applied changes into notices for one observer.
///
/// Notices are emitted one per change, in application order, and are never
/// merged; merging would shift the consumer-visible indices of later
/// notices. The sink runs with no store lock held, so it may query the
/// projection re-entrantly and observe the post-operation state.
pub struct ChangeNotifier {
    sink: NoticeSink,
}

impl ChangeNotifier {
    /// Create a notifier delivering through `sink`.
    pub fn new(sink: NoticeSink) -> Self {
        Self { sink }
    }

    /// Emit the notice for one applied change.
    pub fn notify(&self, change: &AppliedChange) {
        (self.sink)(ModelNotice::from(change));
    }
}
