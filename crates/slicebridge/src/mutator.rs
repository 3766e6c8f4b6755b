//! Namespace-scoped mutations over slices.
//!
//! Every operation addresses exactly one `(component kind, instance key)`
//! slice named in its payload and never touches sibling kinds or keys.
//! Preconditions are checked before anything is written, so a rejected
//! mutation leaves the namespace unchanged.

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use slicebridge_store::{ModuleDescriptor, MutationContext, MutationError, Store};

pub const INITIALIZE: &str = "initialize";
pub const MUTATE: &str = "mutate";
pub const REPLACE: &str = "replace";
pub const ASSIGN: &str = "assign";
pub const REMOVE: &str = "remove";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializePayload {
    pub component_kind: String,
    pub instance_key: String,
    pub value: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutatePayload {
    pub component_kind: String,
    pub instance_key: String,
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacePayload {
    pub component_kind: String,
    pub instance_key: String,
    pub value: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignPayload {
    pub component_kind: String,
    pub instance_key: String,
    pub values: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovePayload {
    pub component_kind: String,
    pub instance_key: String,
}

/// Attach the slice mutations to a namespace module.
pub fn install(module: ModuleDescriptor) -> ModuleDescriptor {
    module
        .mutation(INITIALIZE, initialize)
        .mutation(MUTATE, mutate)
        .mutation(REPLACE, replace)
        .mutation(ASSIGN, assign)
        .mutation(REMOVE, remove)
}

/// Serialize `payload` and commit `<namespace>/<operation>`.
pub fn commit<P: Serialize>(
    store: &Store,
    namespace: &str,
    operation: &str,
    payload: &P,
) -> Result<u64, BridgeError> {
    let payload = serde_json::to_value(payload)?;
    Ok(store.commit(&format!("{namespace}/{operation}"), payload)?)
}

/// Create the slice, creating the kind's slice map first if needed.
///
/// An existing slice is left as it is. The check runs under the commit lock,
/// so two instances racing to initialize the same key cannot reset it.
fn initialize(ctx: &mut MutationContext<'_>, payload: &Value) -> Result<(), MutationError> {
    let InitializePayload {
        component_kind,
        instance_key,
        value,
    } = InitializePayload::deserialize(payload)?;

    if ctx
        .get(&[component_kind.as_str(), instance_key.as_str()])
        .is_some()
    {
        return Ok(());
    }
    match ctx.get(&[component_kind.as_str()]).map(Value::is_object) {
        None => {
            let mut slices = Map::new();
            slices.insert(instance_key, Value::Object(value));
            ctx.set(&[], &component_kind, Value::Object(slices))
        }
        Some(true) => ctx.set(&[component_kind.as_str()], &instance_key, Value::Object(value)),
        Some(false) => Err(MutationError::new(format!(
            "{component_kind} holds a non-object value, not a slice map"
        ))),
    }
}

fn mutate(ctx: &mut MutationContext<'_>, payload: &Value) -> Result<(), MutationError> {
    let MutatePayload {
        component_kind,
        instance_key,
        field,
        value,
    } = MutatePayload::deserialize(payload)?;
    let path = [component_kind.as_str(), instance_key.as_str()];

    let exists = match ctx.get(&path) {
        Some(Value::Object(slice)) => slice.contains_key(&field),
        _ => return Err(missing_slice(&component_kind, &instance_key)),
    };
    if !exists {
        return ctx.set(&path, &field, value);
    }
    if let Some(slice) = ctx.object_mut(&path) {
        slice.insert(field, value);
    }
    Ok(())
}

fn replace(ctx: &mut MutationContext<'_>, payload: &Value) -> Result<(), MutationError> {
    let ReplacePayload {
        component_kind,
        instance_key,
        value,
    } = ReplacePayload::deserialize(payload)?;
    reconcile(ctx, &component_kind, &instance_key, value)
}

/// Merge-only update: keys the slice does not already hold are ignored.
fn assign(ctx: &mut MutationContext<'_>, payload: &Value) -> Result<(), MutationError> {
    let AssignPayload {
        component_kind,
        instance_key,
        values,
    } = AssignPayload::deserialize(payload)?;

    let mut merged = match ctx.get(&[component_kind.as_str(), instance_key.as_str()]) {
        Some(Value::Object(slice)) => slice.clone(),
        _ => return Err(missing_slice(&component_kind, &instance_key)),
    };
    for (field, value) in values {
        if let Some(slot) = merged.get_mut(&field) {
            *slot = value;
        }
    }
    reconcile(ctx, &component_kind, &instance_key, merged)
}

fn remove(ctx: &mut MutationContext<'_>, payload: &Value) -> Result<(), MutationError> {
    let RemovePayload {
        component_kind,
        instance_key,
    } = RemovePayload::deserialize(payload)?;
    ctx.delete(&[component_kind.as_str()], &instance_key);
    Ok(())
}

/// Make the slice's field set exactly `next`: stale fields are deleted,
/// everything in `next` is assigned (new fields are inserted).
fn reconcile(
    ctx: &mut MutationContext<'_>,
    component_kind: &str,
    instance_key: &str,
    next: Map<String, Value>,
) -> Result<(), MutationError> {
    let path = [component_kind, instance_key];
    let stale: Vec<String> = match ctx.get(&path) {
        Some(Value::Object(slice)) => slice
            .keys()
            .filter(|field| !next.contains_key(*field))
            .cloned()
            .collect(),
        _ => return Err(missing_slice(component_kind, instance_key)),
    };

    for field in &stale {
        ctx.delete(&path, field);
    }
    for (field, value) in next {
        ctx.set(&path, &field, value)?;
    }
    Ok(())
}

fn missing_slice(component_kind: &str, instance_key: &str) -> MutationError {
    MutationError::new(format!(
        "no slice for {component_kind}/{instance_key}; initialize it first"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use slicebridge_store::{StoreError, StructuralChange};
    use std::sync::{Arc, Mutex};

    fn store_with(seed: Value) -> Store {
        let store = Store::new();
        let seed = match seed {
            Value::Object(map) => map,
            other => panic!("seed must be an object, got {other}"),
        };
        store
            .register_module("bridge", install(ModuleDescriptor::new(seed)))
            .expect("module registers");
        store
    }

    fn payload_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn initialize_creates_kind_map_then_adds_siblings() {
        let store = store_with(json!({}));
        for key in ["a", "b"] {
            commit(
                &store,
                "bridge",
                INITIALIZE,
                &InitializePayload {
                    component_kind: "Card".into(),
                    instance_key: key.into(),
                    value: payload_map(json!({ "foo": 1 })),
                },
            )
            .expect("initialize commits");
        }
        assert_eq!(
            store.read(&["bridge", "Card"]),
            Some(json!({ "a": { "foo": 1 }, "b": { "foo": 1 } }))
        );
    }

    #[test]
    fn initialize_keeps_an_existing_slice() {
        let store = store_with(json!({ "Card": { "a": { "foo": 5 } } }));
        commit(
            &store,
            "bridge",
            INITIALIZE,
            &InitializePayload {
                component_kind: "Card".into(),
                instance_key: "a".into(),
                value: payload_map(json!({ "foo": 100 })),
            },
        )
        .expect("initialize commits");
        assert_eq!(
            store.read(&["bridge", "Card"]),
            Some(json!({ "a": { "foo": 5 } }))
        );
    }

    #[test]
    fn mutate_touches_only_the_named_slice() {
        let store = store_with(json!({
            "Card": { "a": { "foo": 1 }, "b": { "foo": 1 } },
            "Other": { "a": { "foo": 1 } },
        }));
        commit(
            &store,
            "bridge",
            MUTATE,
            &MutatePayload {
                component_kind: "Card".into(),
                instance_key: "a".into(),
                field: "foo".into(),
                value: json!(2),
            },
        )
        .expect("mutate commits");

        assert_eq!(store.read(&["bridge", "Card", "a", "foo"]), Some(json!(2)));
        assert_eq!(store.read(&["bridge", "Card", "b", "foo"]), Some(json!(1)));
        assert_eq!(store.read(&["bridge", "Other", "a", "foo"]), Some(json!(1)));
    }

    #[test]
    fn mutate_without_slice_is_rejected() {
        let store = store_with(json!({}));
        let err = commit(
            &store,
            "bridge",
            MUTATE,
            &MutatePayload {
                component_kind: "Card".into(),
                instance_key: "a".into(),
                field: "foo".into(),
                value: json!(2),
            },
        )
        .expect_err("missing slice must fail");
        assert!(matches!(
            err,
            BridgeError::Store(StoreError::MutationRejected { ref reason, .. })
                if reason.contains("Card/a")
        ));
        assert_eq!(store.read(&["bridge"]), Some(json!({})));
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn replace_reconciles_field_set() {
        let store = store_with(json!({ "Card": { "k": { "a": 1, "b": 2 } } }));
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        store.subscribe(move |record, _| {
            sink.lock()
                .expect("test mutex")
                .extend(record.changes.iter().cloned());
        });

        commit(
            &store,
            "bridge",
            REPLACE,
            &ReplacePayload {
                component_kind: "Card".into(),
                instance_key: "k".into(),
                value: payload_map(json!({ "a": 9, "c": 3 })),
            },
        )
        .expect("replace commits");

        assert_eq!(
            store.read(&["bridge", "Card", "k"]),
            Some(json!({ "a": 9, "c": 3 }))
        );
        let path = |field: &str| -> Vec<String> {
            vec!["bridge".into(), "Card".into(), "k".into(), field.into()]
        };
        assert_eq!(
            *changes.lock().expect("test mutex"),
            vec![
                StructuralChange::Removed { path: path("b") },
                StructuralChange::Inserted { path: path("c") },
            ]
        );
    }

    #[test]
    fn assign_ignores_unknown_fields() {
        let store = store_with(json!({ "Card": { "k": { "a": 1, "b": 2 } } }));
        commit(
            &store,
            "bridge",
            ASSIGN,
            &AssignPayload {
                component_kind: "Card".into(),
                instance_key: "k".into(),
                values: payload_map(json!({ "a": 5, "z": 0 })),
            },
        )
        .expect("assign commits");
        assert_eq!(
            store.read(&["bridge", "Card", "k"]),
            Some(json!({ "a": 5, "b": 2 }))
        );
    }

    #[test]
    fn remove_deletes_one_key() {
        let store = store_with(json!({ "Card": { "a": {}, "b": {} } }));
        commit(
            &store,
            "bridge",
            REMOVE,
            &RemovePayload {
                component_kind: "Card".into(),
                instance_key: "a".into(),
            },
        )
        .expect("remove commits");
        assert_eq!(store.read(&["bridge", "Card"]), Some(json!({ "b": {} })));
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let store = store_with(json!({}));
        assert!(matches!(
            store.commit("bridge/mutate", json!({ "field": "foo" })),
            Err(StoreError::MutationRejected { .. })
        ));
    }
}
