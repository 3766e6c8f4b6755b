//! Field accessors attached to an instance.
//!
//! A proxy reads `<namespace>/<kind>/<key>/<field>` through the instance's
//! binding and writes by committing `mutate`; it never touches the tree
//! directly. In interactive render mode reads are memoized until the store's
//! revision moves.

use crate::binding::Binding;
use crate::config::RenderMode;
use crate::error::BridgeError;
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::mutator::{self, MUTATE, MutatePayload};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use slicebridge_store::Store;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone)]
struct CachedRead {
    revision: u64,
    value: Option<Value>,
}

pub struct FieldProxy {
    field: String,
    binding: Arc<Binding>,
    store: Option<Store>,
    lifecycle: Lifecycle,
    cache: Option<Mutex<Option<CachedRead>>>,
}

impl FieldProxy {
    pub(crate) fn new(
        field: String,
        binding: Arc<Binding>,
        store: Option<Store>,
        lifecycle: Lifecycle,
        render_mode: RenderMode,
    ) -> Self {
        Self {
            field,
            binding,
            store,
            lifecycle,
            cache: render_mode.caches_reads().then(|| Mutex::new(None)),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn caches_reads(&self) -> bool {
        self.cache.is_some()
    }

    /// Current value, or `None` when the slice or field is gone or the
    /// instance is detached from any store.
    pub fn get(&self) -> Option<Value> {
        let store = self.store.as_ref()?;
        let path = self.binding.field_path(&self.field);

        let Some(cache) = &self.cache else {
            return store.read(&path);
        };
        let mut cached = cache.lock();
        if let Some(hit) = cached.as_ref()
            && hit.revision == store.revision()
        {
            return hit.value.clone();
        }
        let (revision, value) = store.read_at_revision(&path);
        *cached = Some(CachedRead {
            revision,
            value: value.clone(),
        });
        value
    }

    pub fn get_as<T: DeserializeOwned>(&self) -> Result<Option<T>, BridgeError> {
        self.get()
            .map(serde_json::from_value)
            .transpose()
            .map_err(BridgeError::from)
    }

    /// Commit `mutate` for this field. Detached instances drop the write.
    pub fn set(&self, value: impl Serialize) -> Result<(), BridgeError> {
        let state = self.lifecycle.current();
        if state != LifecycleState::Active {
            return Err(BridgeError::Inactive {
                kind: self.binding.component_kind().to_string(),
                key: self.binding.instance_key().to_string(),
                state,
            });
        }

        let Some(store) = &self.store else {
            warn!(
                kind = %self.binding.component_kind(),
                key = %self.binding.instance_key(),
                field = %self.field,
                "write dropped: instance is not attached to a store"
            );
            return Ok(());
        };

        let payload = MutatePayload {
            component_kind: self.binding.component_kind().to_string(),
            instance_key: self.binding.instance_key().to_string(),
            field: self.field.clone(),
            value: serde_json::to_value(value)?,
        };
        mutator::commit(store, self.binding.namespace(), MUTATE, &payload)?;
        Ok(())
    }
}

impl Debug for FieldProxy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldProxy")
            .field("field", &self.field)
            .field("binding", &self.binding)
            .field("attached", &self.store.is_some())
            .field("caches_reads", &self.caches_reads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ensure_namespace;
    use crate::slice::ensure_slice;
    use serde_json::{Map, json};

    fn active_lifecycle() -> Lifecycle {
        let lifecycle = Lifecycle::new("Card");
        lifecycle
            .advance(LifecycleState::Activating)
            .expect("activating");
        lifecycle.advance(LifecycleState::Active).expect("active");
        lifecycle
    }

    fn attached(mode: RenderMode) -> (Store, FieldProxy) {
        let store = Store::new();
        ensure_namespace(&store, "bridge").expect("namespace");
        let mut initial = Map::new();
        initial.insert("foo".into(), json!(100));
        ensure_slice(&store, "bridge", "Card", "default", &initial).expect("slice");

        let binding = Arc::new(Binding::new("Card", "bridge", "$bridge", "default"));
        let proxy = FieldProxy::new(
            "foo".into(),
            binding,
            Some(store.clone()),
            active_lifecycle(),
            mode,
        );
        (store, proxy)
    }

    #[test]
    fn set_goes_through_commit() {
        let (store, proxy) = attached(RenderMode::Interactive);
        assert_eq!(proxy.get(), Some(json!(100)));

        let before = store.revision();
        proxy.set(200).expect("set commits");
        assert_eq!(store.revision(), before + 1);
        assert_eq!(proxy.get(), Some(json!(200)));
        assert_eq!(proxy.get_as::<u32>().expect("number"), Some(200));
    }

    #[test]
    fn cached_reads_refresh_after_any_commit() {
        let (store, proxy) = attached(RenderMode::Interactive);
        assert!(proxy.caches_reads());
        assert_eq!(proxy.get(), Some(json!(100)));

        mutator::commit(
            &store,
            "bridge",
            MUTATE,
            &MutatePayload {
                component_kind: "Card".into(),
                instance_key: "default".into(),
                field: "foo".into(),
                value: json!(1),
            },
        )
        .expect("external write");
        assert_eq!(proxy.get(), Some(json!(1)));
    }

    #[test]
    fn one_shot_mode_skips_the_cache() {
        let (_store, proxy) = attached(RenderMode::OneShot);
        assert!(!proxy.caches_reads());
        assert_eq!(proxy.get(), Some(json!(100)));
    }

    #[test]
    fn detached_proxy_reads_none_and_drops_writes() {
        let binding = Arc::new(Binding::new("Card", "bridge", "$bridge", "default"));
        let proxy = FieldProxy::new(
            "foo".into(),
            binding,
            None,
            active_lifecycle(),
            RenderMode::Interactive,
        );
        assert_eq!(proxy.get(), None);
        proxy.set(1).expect("detached write is a no-op");
    }

    #[test]
    fn writes_after_teardown_are_rejected() {
        let (_store, proxy) = attached(RenderMode::Interactive);
        proxy
            .lifecycle
            .advance(LifecycleState::Destroyed)
            .expect("destroyed");
        assert!(matches!(
            proxy.set(5),
            Err(BridgeError::Inactive {
                state: LifecycleState::Destroyed,
                ..
            })
        ));
        assert_eq!(proxy.get(), Some(json!(100)));
    }
}
