//! Error types for bridge operations.

use crate::lifecycle::LifecycleState;
use slicebridge_store::StoreError;

/// Errors raised while binding, activating, or driving a bridged instance.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The bind configuration cannot work at all (e.g. no component kind).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The instance has no reachable store.
    #[error("integration error: component kind {kind:?} has no store to bind to")]
    Integration { kind: String },

    /// The key generator produced no key or an empty one.
    #[error("key generation error for component kind {kind:?}: {reason}")]
    KeyGeneration { kind: String, reason: String },

    /// A field outside the bind-time declaration was addressed.
    #[error("component kind {kind:?} declares no field {field:?}")]
    UnknownField { kind: String, field: String },

    /// A lifecycle step was requested out of order.
    #[error("invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },

    /// A write was attempted on an instance that is no longer active.
    #[error("instance {kind}/{key} is {state}; writes require an active instance")]
    Inactive {
        kind: String,
        key: String,
        state: LifecycleState,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
