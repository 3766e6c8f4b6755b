//! What the host hands the bridge when it constructs an instance.

use serde_json::{Map, Value};
use slicebridge_store::Store;

/// The instance under construction: its reachable store (if any) and its
/// configured props, e.g. route parameters a key generator can derive from.
#[derive(Debug, Clone, Default)]
pub struct InstanceContext {
    store: Option<Store>,
    props: Map<String, Value>,
}

impl InstanceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Store) -> Self {
        Self {
            store: Some(store),
            props: Map::new(),
        }
    }

    pub fn store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn props(&self) -> &Map<String, Value> {
        &self.props
    }

    pub fn get_prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    pub fn reachable_store(&self) -> Option<&Store> {
        self.store.as_ref()
    }
}
