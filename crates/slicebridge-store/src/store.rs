//! The shared store handle.
//!
//! One [`Store`] is a cheap clone around a single locked state tree. All
//! writes go through [`Store::commit`], which runs a registered mutation under
//! the write lock, bumps the revision, and then notifies subscribers after
//! the lock is released.

use crate::error::StoreError;
use crate::module::{GetterFn, ModuleDescriptor, MutationContext, MutationFn, StructuralChange};
use crate::path::ScopedName;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::debug;

/// What a subscriber sees for every successful commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationRecord {
    /// Full mutation type, e.g. `bridge/mutate`.
    pub mutation: String,
    pub payload: Value,
    /// Keys inserted or removed by the mutation.
    pub changes: Vec<StructuralChange>,
    /// Store revision after the commit.
    pub revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&MutationRecord, &Value) + Send + Sync>;

struct RegisteredModule {
    getters: HashMap<String, GetterFn>,
    mutations: HashMap<String, MutationFn>,
}

#[derive(Default)]
struct StoreInner {
    root: Map<String, Value>,
    modules: HashMap<String, RegisteredModule>,
    revision: u64,
    next_subscription: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

/// Shared handle to one state tree.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<StoreInner>>,
}

impl Store {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose root starts as `state`, e.g. a snapshot from a previous
    /// run. Existing subtrees are kept as-is until a module claims them.
    pub fn from_state(state: Map<String, Value>) -> Self {
        let inner = StoreInner {
            root: state,
            ..StoreInner::default()
        };
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Rehydrate from a JSON snapshot. The snapshot must be an object.
    pub fn hydrate(snapshot: Value) -> Result<Self, StoreError> {
        match snapshot {
            Value::Object(state) => Ok(Self::from_state(state)),
            _ => Err(StoreError::NotAnObject("<root>".to_string())),
        }
    }

    /// Register a namespaced module. Its state replaces whatever subtree was
    /// stored under `name`.
    pub fn register_module(
        &self,
        name: &str,
        descriptor: ModuleDescriptor,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.modules.contains_key(name) {
            return Err(StoreError::ModuleAlreadyRegistered(name.to_string()));
        }

        let ModuleDescriptor {
            state,
            getters,
            mutations,
        } = descriptor;
        debug!(
            module = %name,
            getters = getters.len(),
            mutations = mutations.len(),
            "registering module"
        );
        inner.root.insert(name.to_string(), Value::Object(state));
        inner
            .modules
            .insert(name.to_string(), RegisteredModule { getters, mutations });
        Ok(())
    }

    pub fn has_module(&self, name: &str) -> bool {
        self.inner.read().modules.contains_key(name)
    }

    /// Evaluate a `namespace/getter` against the module's current state.
    ///
    /// Unknown namespaces, unknown getters, and malformed paths all read as
    /// `None`, the same as an undefined getter.
    pub fn getter(&self, path: &str) -> Option<Value> {
        let scoped = ScopedName::parse(path).ok()?;
        let inner = self.inner.read();
        let getter = inner
            .modules
            .get(&scoped.namespace)?
            .getters
            .get(&scoped.name)?;
        let empty = Map::new();
        let state = inner
            .root
            .get(&scoped.namespace)
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        Some(getter(state))
    }

    /// Apply the named mutation synchronously. Returns the new revision.
    pub fn commit(&self, path: &str, payload: Value) -> Result<u64, StoreError> {
        let scoped = ScopedName::parse(path)?;

        let (record, subscribers, snapshot) = {
            let mut guard = self.inner.write();
            let inner = &mut *guard;

            let mutation = inner
                .modules
                .get(&scoped.namespace)
                .and_then(|module| module.mutations.get(&scoped.name))
                .cloned()
                .ok_or_else(|| StoreError::UnknownMutation(path.to_string()))?;

            let state = inner
                .root
                .get_mut(&scoped.namespace)
                .and_then(Value::as_object_mut)
                .ok_or_else(|| StoreError::NotAnObject(scoped.namespace.clone()))?;

            let mut ctx = MutationContext::new(&scoped.namespace, state);
            mutation(&mut ctx, &payload).map_err(|err| StoreError::MutationRejected {
                mutation: path.to_string(),
                reason: err.0,
            })?;
            let changes = ctx.into_changes();

            inner.revision += 1;
            debug!(
                mutation = %path,
                revision = inner.revision,
                structural_changes = changes.len(),
                "committed"
            );

            let record = MutationRecord {
                mutation: path.to_string(),
                payload,
                changes,
                revision: inner.revision,
            };
            let subscribers: Vec<Subscriber> = inner
                .subscribers
                .iter()
                .map(|(_, subscriber)| Arc::clone(subscriber))
                .collect();
            let snapshot = if subscribers.is_empty() {
                Value::Null
            } else {
                Value::Object(inner.root.clone())
            };
            (record, subscribers, snapshot)
        };

        for subscriber in &subscribers {
            subscriber(&record, &snapshot);
        }
        Ok(record.revision)
    }

    /// Observe every successful commit with the tree as it stands afterwards.
    pub fn subscribe<F>(&self, subscriber: F) -> SubscriptionId
    where
        F: Fn(&MutationRecord, &Value) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        inner.next_subscription += 1;
        let id = SubscriptionId(inner.next_subscription);
        inner.subscribers.push((id, Arc::new(subscriber)));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.write();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(existing, _)| *existing != id);
        inner.subscribers.len() != before
    }

    /// Number of successful commits so far.
    pub fn revision(&self) -> u64 {
        self.inner.read().revision
    }

    /// Clone of the value at `path` from the root.
    pub fn read(&self, path: &[&str]) -> Option<Value> {
        let inner = self.inner.read();
        lookup(&inner.root, path).cloned()
    }

    /// Like [`read`](Self::read), paired with the revision it was read at.
    pub fn read_at_revision(&self, path: &[&str]) -> (u64, Option<Value>) {
        let inner = self.inner.read();
        (inner.revision, lookup(&inner.root, path).cloned())
    }

    /// Whether a value exists at `path`, without cloning it.
    pub fn contains(&self, path: &[&str]) -> bool {
        let inner = self.inner.read();
        lookup(&inner.root, path).is_some()
    }

    /// Run `f` against the root without cloning the tree.
    pub fn with_state<R>(&self, f: impl FnOnce(&Map<String, Value>) -> R) -> R {
        let inner = self.inner.read();
        f(&inner.root)
    }

    /// Full copy of the tree, suitable for persisting and later [`hydrate`](Self::hydrate).
    pub fn snapshot(&self) -> Value {
        Value::Object(self.inner.read().root.clone())
    }
}

impl Debug for Store {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        let mut modules: Vec<&str> = inner.modules.keys().map(String::as_str).collect();
        modules.sort_unstable();
        f.debug_struct("Store")
            .field("modules", &modules)
            .field("revision", &inner.revision)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

fn lookup<'m>(root: &'m Map<String, Value>, path: &[&str]) -> Option<&'m Value> {
    let (first, rest) = path.split_first()?;
    let mut current = root.get(*first)?;
    for segment in rest {
        current = current.as_object()?.get(*segment)?;
    }
    Some(current)
}
