//! A live component instance bound to its slice.

use crate::binding::Binding;
use crate::bridge::{BindConfig, Hook};
use crate::error::BridgeError;
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::mutator::{self, REMOVE, RemovePayload};
use crate::proxy::FieldProxy;
use crate::slice::{SliceState, read_slice};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use slicebridge_store::Store;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

pub struct Instance<S> {
    config: Arc<BindConfig>,
    binding: Arc<Binding>,
    fields: BTreeMap<String, FieldProxy>,
    store: Option<Store>,
    props: Map<String, Value>,
    lifecycle: Lifecycle,
    destroyed: Option<Hook<S>>,
    _slice: PhantomData<fn() -> S>,
}

impl<S: SliceState> Instance<S> {
    pub(crate) fn new(
        config: Arc<BindConfig>,
        binding: Arc<Binding>,
        fields: BTreeMap<String, FieldProxy>,
        store: Option<Store>,
        props: Map<String, Value>,
        lifecycle: Lifecycle,
        destroyed: Option<Hook<S>>,
    ) -> Self {
        Self {
            config,
            binding,
            fields,
            store,
            props,
            lifecycle,
            destroyed,
            _slice: PhantomData,
        }
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn key(&self) -> &str {
        self.binding.instance_key()
    }

    pub fn kind(&self) -> &str {
        self.binding.component_kind()
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.current()
    }

    /// True when activation found no store and the fields are no-ops.
    pub fn is_detached(&self) -> bool {
        self.store.is_none()
    }

    pub fn field(&self, name: &str) -> Result<&FieldProxy, BridgeError> {
        self.fields
            .get(name)
            .ok_or_else(|| BridgeError::UnknownField {
                kind: self.config.kind.clone(),
                field: name.to_string(),
            })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldProxy> {
        self.fields.values()
    }

    pub fn get(&self, name: &str) -> Result<Option<Value>, BridgeError> {
        Ok(self.field(name)?.get())
    }

    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, BridgeError> {
        self.field(name)?.get_as()
    }

    pub fn set(&self, name: &str, value: impl Serialize) -> Result<(), BridgeError> {
        self.field(name)?.set(value)
    }

    /// The whole slice as the bind-time record type. `None` once the slice is
    /// gone or when detached.
    pub fn state(&self) -> Result<Option<S>, BridgeError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let [namespace, kind, key] = self.binding.slice_path();
        read_slice(store, namespace, kind, key)
            .map(|slice| serde_json::from_value(Value::Object(slice)))
            .transpose()
            .map_err(BridgeError::from)
    }

    /// Property lookup the way a host template sees the instance: the binding
    /// property yields the key, declared fields read through their proxy,
    /// anything else falls back to the instance's props.
    pub fn property(&self, name: &str) -> Option<Value> {
        if name == self.binding.prop_name() {
            return Some(Value::String(self.key().to_string()));
        }
        if let Some(proxy) = self.fields.get(name) {
            return proxy.get();
        }
        self.props.get(name).cloned()
    }

    pub fn props(&self) -> &Map<String, Value> {
        &self.props
    }

    /// Tear the instance down.
    ///
    /// With remove-on-destroy the instance's own slice is deleted through
    /// `remove`; sibling keys stay. The `destroyed` hook runs either way.
    /// If the `remove` commit fails the instance stays active, so the call
    /// can be retried.
    pub fn destroy(&self) -> Result<(), BridgeError> {
        let current = self.lifecycle.current();
        if !current.can_advance_to(LifecycleState::Destroyed) {
            return Err(BridgeError::InvalidTransition {
                from: current,
                to: LifecycleState::Destroyed,
            });
        }

        if self.config.remove_on_destroy
            && let Some(store) = &self.store
        {
            mutator::commit(
                store,
                self.binding.namespace(),
                REMOVE,
                &RemovePayload {
                    component_kind: self.kind().to_string(),
                    instance_key: self.key().to_string(),
                },
            )?;
            debug!(kind = %self.kind(), key = %self.key(), "slice removed on destroy");
        }

        self.lifecycle.advance(LifecycleState::Destroyed)?;
        if let Some(hook) = &self.destroyed {
            hook(self);
        }
        Ok(())
    }
}

impl<S> Debug for Instance<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("binding", &self.binding)
            .field("state", &self.lifecycle.current())
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("detached", &self.store.is_none())
            .finish_non_exhaustive()
    }
}
