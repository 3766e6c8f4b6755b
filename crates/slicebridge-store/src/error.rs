//! Error types for store operations.

/// Errors raised by the shared store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A module with this name is already registered.
    #[error("module already registered: {0}")]
    ModuleAlreadyRegistered(String),

    /// `commit` named a mutation no registered module provides.
    #[error("unknown mutation type: {0}")]
    UnknownMutation(String),

    /// A mutation handler refused the payload. The tree is unchanged.
    #[error("mutation {mutation} rejected: {reason}")]
    MutationRejected { mutation: String, reason: String },

    /// A `namespace/name` path could not be parsed.
    #[error("malformed path: {0:?}")]
    MalformedPath(String),

    /// Hydration input or a module subtree was not a JSON object.
    #[error("expected an object at {0}")]
    NotAnObject(String),
}

/// Reason a mutation handler gives for refusing a payload.
///
/// Handlers must check their preconditions before writing, so a rejected
/// mutation leaves the module state as it found it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MutationError(pub String);

impl MutationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl From<serde_json::Error> for MutationError {
    fn from(err: serde_json::Error) -> Self {
        Self(format!("invalid payload: {err}"))
    }
}
