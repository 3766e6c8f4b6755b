//! Namespace registration.
//!
//! The namespace module is registered at most once per store. Whether that
//! already happened is answered by the module's own `installed` getter, so
//! the check is a single lookup.

use crate::error::BridgeError;
use crate::mutator;
use serde_json::{Map, Value};
use slicebridge_store::{ModuleDescriptor, Store, StoreError};
use tracing::debug;

pub const INSTALLED_GETTER: &str = "installed";

pub fn is_installed(store: &Store, namespace: &str) -> bool {
    store.getter(&format!("{namespace}/{INSTALLED_GETTER}")) == Some(Value::Bool(true))
}

/// The namespace module: `seed` as its state, the `installed` getter, and
/// every slice mutation.
pub fn namespace_module(seed: Map<String, Value>) -> ModuleDescriptor {
    mutator::install(ModuleDescriptor::new(seed).getter(INSTALLED_GETTER, |_| Value::Bool(true)))
}

/// Register `namespace` unless it is already installed.
///
/// A subtree already stored under the namespace name (a rehydrated snapshot)
/// seeds the module state instead of being replaced by an empty map.
/// Returns whether this call performed the registration.
pub fn ensure_namespace(store: &Store, namespace: &str) -> Result<bool, BridgeError> {
    if is_installed(store, namespace) {
        return Ok(false);
    }

    let seed = match store.read(&[namespace]) {
        Some(Value::Object(existing)) => existing,
        _ => Map::new(),
    };
    let seeded_kinds = seed.len();

    match store.register_module(namespace, namespace_module(seed)) {
        Ok(()) => {
            debug!(namespace = %namespace, seeded_kinds, "namespace registered");
            Ok(true)
        }
        // Someone registered it between the check and here; theirs stands.
        Err(StoreError::ModuleAlreadyRegistered(_)) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registers_once() {
        let store = Store::new();
        assert!(!is_installed(&store, "bridge"));
        assert!(ensure_namespace(&store, "bridge").expect("first ensure"));
        assert!(is_installed(&store, "bridge"));
        assert!(!ensure_namespace(&store, "bridge").expect("second ensure"));
        assert_eq!(store.read(&["bridge"]), Some(json!({})));
    }

    #[test]
    fn second_ensure_keeps_existing_content() {
        let store = Store::new();
        ensure_namespace(&store, "bridge").expect("first ensure");
        mutator::commit(
            &store,
            "bridge",
            mutator::INITIALIZE,
            &mutator::InitializePayload {
                component_kind: "Card".into(),
                instance_key: "default".into(),
                value: Map::new(),
            },
        )
        .expect("initialize commits");

        ensure_namespace(&store, "bridge").expect("second ensure");
        assert_eq!(
            store.read(&["bridge"]),
            Some(json!({ "Card": { "default": {} } }))
        );
    }

    #[test]
    fn seeds_from_rehydrated_subtree() {
        let store = Store::hydrate(json!({
            "bridge": { "Card": { "default": { "foo": 7 } } },
            "unrelated": true,
        }))
        .expect("snapshot hydrates");

        assert!(ensure_namespace(&store, "bridge").expect("ensure"));
        assert_eq!(
            store.read(&["bridge", "Card", "default", "foo"]),
            Some(json!(7))
        );
        assert_eq!(store.read(&["unrelated"]), Some(json!(true)));
    }

    #[test]
    fn non_object_subtree_is_replaced_by_empty_namespace() {
        let store = Store::hydrate(json!({ "bridge": 3 })).expect("snapshot hydrates");
        ensure_namespace(&store, "bridge").expect("ensure");
        assert_eq!(store.read(&["bridge"]), Some(json!({})));
    }

    #[test]
    fn registration_lost_to_another_writer_is_not_an_error() {
        let store = Store::new();
        // Registered without the `installed` getter, so the fast check misses it.
        store
            .register_module("bridge", ModuleDescriptor::new(Map::new()))
            .expect("plain module registers");

        assert!(!is_installed(&store, "bridge"));
        assert!(!ensure_namespace(&store, "bridge").expect("falls back"));
        assert!(store.has_module("bridge"));
    }

    #[test]
    fn namespaces_are_independent() {
        let store = Store::new();
        ensure_namespace(&store, "left").expect("left");
        assert!(!is_installed(&store, "right"));
        assert!(ensure_namespace(&store, "right").expect("right"));
    }
}
