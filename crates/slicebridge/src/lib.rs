//! # slicebridge
//!
//! Keyed per-instance component state inside one shared store.
//!
//! Every instance of a bound component kind gets its own slice of the store,
//! chosen by a key generator. Instances that produce the same key share a
//! slice; different keys never see each other's writes. Field accessors read
//! through the instance's binding and write only by committing a namespaced
//! mutation, so every change is observable by store subscribers.
//!
//! ## Architecture
//!
//! ```text
//! Bridge<S>             ← initial slice shape, key generator, settings
//!     │ bind
//! BoundComponent<S>     ← one immutable BindConfig per component kind
//!     │ create(ctx)
//! Instance<S>           ← Binding + FieldProxy per declared field
//!     │ get / set
//! Store                 ← <namespace>/<kind>/<key>/<field>
//! ```

pub mod binding;
pub mod bridge;
pub mod config;
pub mod context;
pub mod error;
pub mod handle;
pub mod instance;
pub mod key;
pub mod lifecycle;
pub mod mutator;
pub mod proxy;
pub mod registry;
pub mod slice;

pub use binding::Binding;
pub use bridge::{Bridge, BoundComponent, ComponentDescriptor, Hook};
pub use config::{
    BridgeOptions, BridgeSettings, DEFAULT_BINDING_PROPERTY, DEFAULT_KEY, DEFAULT_NAMESPACE,
    ErrorPolicy, RenderMode,
};
pub use context::InstanceContext;
pub use error::BridgeError;
pub use handle::SliceHandle;
pub use instance::Instance;
pub use key::{ConstantKey, DefaultKey, KeyGenerator, PropKey, SequentialKey};
pub use lifecycle::LifecycleState;
pub use proxy::FieldProxy;
pub use registry::ensure_namespace;
pub use slice::{SliceState, ensure_slice, read_slice};
