//! Lazy slice creation and slice reads.

use crate::error::BridgeError;
use crate::mutator::{self, INITIALIZE, InitializePayload};
use serde::Serialize;
use serde_json::{Map, Value};
use slicebridge_store::Store;
use tracing::debug;

/// Anything usable as a slice record: it must serialize to a map of fields
/// and deserialize back from one.
pub trait SliceState: Serialize + serde::de::DeserializeOwned + Send + Sync + 'static {}

impl<T> SliceState for T where T: Serialize + serde::de::DeserializeOwned + Send + Sync + 'static {}

/// Create `namespace/kind/key` from a fresh copy of `initial` unless it
/// already exists. Returns whether `initialize` was committed.
///
/// Existing slices are never overwritten, so repeated construction of the
/// same (kind, key) keeps whatever the first instance left behind. The
/// `contains` check is only a fast path; `initialize` re-checks under the
/// commit lock, so a concurrent loser commits a no-op.
pub fn ensure_slice(
    store: &Store,
    namespace: &str,
    kind: &str,
    key: &str,
    initial: &Map<String, Value>,
) -> Result<bool, BridgeError> {
    if store.contains(&[namespace, kind, key]) {
        return Ok(false);
    }

    mutator::commit(
        store,
        namespace,
        INITIALIZE,
        &InitializePayload {
            component_kind: kind.to_string(),
            instance_key: key.to_string(),
            value: initial.clone(),
        },
    )?;
    debug!(namespace = %namespace, kind = %kind, key = %key, "slice initialized");
    Ok(true)
}

/// Current contents of `namespace/kind/key`, if it exists and is a map.
pub fn read_slice(
    store: &Store,
    namespace: &str,
    kind: &str,
    key: &str,
) -> Option<Map<String, Value>> {
    match store.read(&[namespace, kind, key])? {
        Value::Object(slice) => Some(slice),
        _ => None,
    }
}

/// Serialize `value` as a field map; `what` names it in the error.
pub(crate) fn to_field_map<T: Serialize + ?Sized>(
    value: &T,
    what: &str,
) -> Result<Map<String, Value>, BridgeError> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(BridgeError::Configuration(format!(
            "{what} must serialize to a map of fields, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}
