//! Core projection contract shared by runtime and frontend consumers.
//!
//! This crate defines the diff-operation protocol for ordered remote
//! collections, the projection store that applies it, and the list-model
//! change notices a frontend observer consumes.

/// Collection routing identity (account, optional room).
pub mod key;
/// List-model change notices and the notifier sink.
pub mod notify;
/// Diff-operation protocol applied to ordered projections.
pub mod ops;
/// Ordered projection store and applied-change descriptions.
pub mod store;

pub use key::CollectionKey;
pub use notify::{ChangeNotifier, ModelNotice, NoticeSink};
pub use ops::ListOp;
pub use store::{AppliedChange, ApplyError, ProjectionStore};
