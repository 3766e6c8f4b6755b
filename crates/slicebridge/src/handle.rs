//! Slice access without an instance.

use crate::binding::Binding;
use crate::error::BridgeError;
use crate::mutator::{self, ASSIGN, AssignPayload, REPLACE, ReplacePayload};
use crate::slice::{SliceState, read_slice, to_field_map};
use serde::Serialize;
use serde_json::{Map, Value};
use slicebridge_store::Store;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

/// One initialized slice plus the store it lives in. Every write is a
/// commit, so subscribers see handle writes the same as instance writes.
pub struct SliceHandle<S> {
    store: Store,
    binding: Binding,
    _slice: PhantomData<fn() -> S>,
}

impl<S: SliceState> SliceHandle<S> {
    pub(crate) fn new(store: Store, binding: Binding) -> Self {
        Self {
            store,
            binding,
            _slice: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        self.binding.instance_key()
    }

    pub fn kind(&self) -> &str {
        self.binding.component_kind()
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn raw_state(&self) -> Option<Map<String, Value>> {
        let [namespace, kind, key] = self.binding.slice_path();
        read_slice(&self.store, namespace, kind, key)
    }

    pub fn state(&self) -> Result<Option<S>, BridgeError> {
        self.raw_state()
            .map(|slice| serde_json::from_value(Value::Object(slice)))
            .transpose()
            .map_err(BridgeError::from)
    }

    /// Replace the slice with `value`: its fields become exactly `value`'s.
    pub fn replace(&self, value: &S) -> Result<u64, BridgeError> {
        self.replace_raw(to_field_map(value, "replacement state")?)
    }

    pub fn replace_raw(&self, value: Map<String, Value>) -> Result<u64, BridgeError> {
        mutator::commit(
            &self.store,
            self.binding.namespace(),
            REPLACE,
            &ReplacePayload {
                component_kind: self.kind().to_string(),
                instance_key: self.key().to_string(),
                value,
            },
        )
    }

    /// Overwrite the fields of `values` the slice already has; others are ignored.
    pub fn assign(&self, values: impl Serialize) -> Result<u64, BridgeError> {
        mutator::commit(
            &self.store,
            self.binding.namespace(),
            ASSIGN,
            &AssignPayload {
                component_kind: self.kind().to_string(),
                instance_key: self.key().to_string(),
                values: to_field_map(&values, "assigned values")?,
            },
        )
    }
}

impl<S> Debug for SliceHandle<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SliceHandle")
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}
