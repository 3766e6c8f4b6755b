//! # slicebridge-store
//!
//! The single shared state tree that bridged component slices live in.
//!
//! This crate provides:
//! - `Store`: a cloneable handle to one JSON state tree
//! - `ModuleDescriptor`: namespaced state + getters + named mutations
//! - `MutationContext`: the only write path, with reactive set/delete that
//!   record structural changes
//! - `MutationRecord` subscriptions and a monotonic revision counter
//!
//! ## Data model
//!
//! ```text
//! root
//!  ├─ <module>            registered once, owns its subtree
//!  │   └─ …               changed only by commit("<module>/<mutation>")
//!  └─ <plain subtree>     e.g. hydrated from a snapshot, not yet claimed
//! ```

pub mod error;
pub mod module;
pub mod path;
pub mod store;

pub use error::{MutationError, StoreError};
pub use module::{GetterFn, ModuleDescriptor, MutationContext, MutationFn, StructuralChange};
pub use path::ScopedName;
pub use store::{MutationRecord, Store, SubscriptionId};
