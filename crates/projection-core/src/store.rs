use thiserror::Error;

use crate::ops::ListOp;

/// Errors describing a diff operation that does not fit the sequence it
/// was applied to.
///
/// These indicate a broken ordering/bounds guarantee in the upstream
/// source, not a condition the projection can recover from.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// An operation referenced an index outside the current sequence.
    #[error("{op} index {index} is out of bounds for length {len}")]
    OutOfBounds {
        /// Kind label of the offending operation.
        op: &'static str,
        /// Index the operation referenced.
        index: usize,
        /// Sequence length at the time of application.
        len: usize,
    },
    /// A boundary removal was applied to an empty sequence.
    #[error("{op} applied to an empty sequence")]
    EmptyPop {
        /// Kind label of the offending operation.
        op: &'static str,
    },
    /// An append carried no items.
    #[error("append carried no items")]
    EmptyAppend,
}

/// Description of what one applied operation changed.
///
/// Ranges are inclusive. `Inserted` carries post-insert indices; `Removed`
/// carries the indices the rows occupied before the removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedChange {
    /// New items now occupy `first..=last`.
    Inserted {
        /// First occupied index.
        first: usize,
        /// Last occupied index.
        last: usize,
    },
    /// The items at `first..=last` are gone.
    Removed {
        /// First removed index (pre-removal).
        first: usize,
        /// Last removed index (pre-removal).
        last: usize,
    },
    /// The item at one index was replaced in place.
    Changed {
        /// Index of the replaced item.
        index: usize,
    },
    /// The whole sequence was replaced or cleared.
    Reset,
}

/// Ordered local projection of a remote collection.
///
/// The store owns its items outright: removal drops them, `Set` replaces
/// them wholesale, and reads hand out references. Exactly one writer may
/// apply operations to a given store, in source order.
#[derive(Debug, Clone)]
pub struct ProjectionStore<T> {
    items: Vec<T>,
}

impl<T> ProjectionStore<T> {
    /// Create an empty projection.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Number of items currently projected.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the projection holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at `index`, or `None` when out of bounds.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Current items in display order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Apply one operation, trapping broken stream contracts.
    ///
    /// # Panics
    ///
    /// Panics when the operation does not fit the current sequence (see
    /// [`ApplyError`]). A source that emits such an operation has broken
    /// its ordering guarantee and the projection cannot be trusted
    /// afterwards, so no recovery is attempted.
    pub fn apply(&mut self, op: ListOp<T>) -> AppliedChange {
        match self.try_apply(op) {
            Ok(change) => change,
            Err(err) => panic!("diff stream contract violated: {err}"),
        }
    }

    /// Apply one operation, reporting contract violations as values.
    ///
    /// The sequence is left untouched when an error is returned.
    pub fn try_apply(&mut self, op: ListOp<T>) -> Result<AppliedChange, ApplyError> {
        let kind = op.kind();
        let len = self.items.len();

        match op {
            ListOp::Append { items } => {
                if items.is_empty() {
                    return Err(ApplyError::EmptyAppend);
                }
                let first = len;
                let last = len + items.len() - 1;
                self.items.extend(items);
                Ok(AppliedChange::Inserted { first, last })
            }
            ListOp::Clear => {
                self.items.clear();
                Ok(AppliedChange::Reset)
            }
            ListOp::PushFront { item } => {
                self.items.insert(0, item);
                Ok(AppliedChange::Inserted { first: 0, last: 0 })
            }
            ListOp::PushBack { item } => {
                self.items.push(item);
                Ok(AppliedChange::Inserted {
                    first: len,
                    last: len,
                })
            }
            ListOp::PopFront => {
                if self.items.is_empty() {
                    return Err(ApplyError::EmptyPop { op: kind });
                }
                self.items.remove(0);
                Ok(AppliedChange::Removed { first: 0, last: 0 })
            }
            ListOp::PopBack => {
                if self.items.pop().is_none() {
                    return Err(ApplyError::EmptyPop { op: kind });
                }
                Ok(AppliedChange::Removed {
                    first: len - 1,
                    last: len - 1,
                })
            }
            ListOp::Insert { index, item } => {
                if index > len {
                    return Err(ApplyError::OutOfBounds {
                        op: kind,
                        index,
                        len,
                    });
                }
                self.items.insert(index, item);
                Ok(AppliedChange::Inserted {
                    first: index,
                    last: index,
                })
            }
            ListOp::Set { index, item } => {
                let Some(slot) = self.items.get_mut(index) else {
                    return Err(ApplyError::OutOfBounds {
                        op: kind,
                        index,
                        len,
                    });
                };
                *slot = item;
                Ok(AppliedChange::Changed { index })
            }
            ListOp::Remove { index } => {
                if index >= len {
                    return Err(ApplyError::OutOfBounds {
                        op: kind,
                        index,
                        len,
                    });
                }
                self.items.remove(index);
                Ok(AppliedChange::Removed {
                    first: index,
                    last: index,
                })
            }
            ListOp::Truncate { len: new_len } => {
                // A truncate that removes nothing is outside the protocol.
                if new_len >= len {
                    return Err(ApplyError::OutOfBounds {
                        op: kind,
                        index: new_len,
                        len,
                    });
                }
                self.items.truncate(new_len);
                Ok(AppliedChange::Removed {
                    first: new_len,
                    last: len - 1,
                })
            }
            ListOp::Reset { items } => {
                self.items = items;
                Ok(AppliedChange::Reset)
            }
        }
    }
}

impl<T> Default for ProjectionStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
