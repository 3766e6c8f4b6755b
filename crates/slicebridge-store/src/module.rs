//! Module descriptors and the mutation-time view of a module's state.
//!
//! A module owns one top-level subtree of the store. Its mutations are the
//! only sanctioned way to change that subtree, and structural changes (keys
//! appearing or disappearing) must go through [`MutationContext::set`] and
//! [`MutationContext::delete`] so subscribers can observe them.

use crate::error::MutationError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub type GetterFn = Arc<dyn Fn(&Map<String, Value>) -> Value + Send + Sync>;
pub type MutationFn =
    Arc<dyn Fn(&mut MutationContext<'_>, &Value) -> Result<(), MutationError> + Send + Sync>;

/// State, getters, and mutations for one namespaced module.
#[derive(Clone, Default)]
pub struct ModuleDescriptor {
    pub(crate) state: Map<String, Value>,
    pub(crate) getters: HashMap<String, GetterFn>,
    pub(crate) mutations: HashMap<String, MutationFn>,
}

impl ModuleDescriptor {
    pub fn new(state: Map<String, Value>) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// Add a derived getter evaluated against the module's state.
    pub fn getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Value + Send + Sync + 'static,
    {
        self.getters.insert(name.into(), Arc::new(getter));
        self
    }

    /// Add a named mutation reachable through `commit("<module>/<name>")`.
    pub fn mutation<F>(mut self, name: impl Into<String>, mutation: F) -> Self
    where
        F: Fn(&mut MutationContext<'_>, &Value) -> Result<(), MutationError>
            + Send
            + Sync
            + 'static,
    {
        self.mutations.insert(name.into(), Arc::new(mutation));
        self
    }

    pub fn getter_names(&self) -> Vec<&str> {
        sorted_names(self.getters.keys())
    }

    pub fn mutation_names(&self) -> Vec<&str> {
        sorted_names(self.mutations.keys())
    }
}

impl Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("state", &self.state)
            .field("getters", &self.getter_names())
            .field("mutations", &self.mutation_names())
            .finish()
    }
}

fn sorted_names<'a>(names: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    let mut names: Vec<&str> = names.map(String::as_str).collect();
    names.sort_unstable();
    names
}

/// A key appearing in or disappearing from the tree during a commit.
///
/// Paths are absolute: the first segment is the module namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StructuralChange {
    Inserted { path: Vec<String> },
    Removed { path: Vec<String> },
}

/// Mutable access to one module's state for the duration of a commit.
pub struct MutationContext<'a> {
    namespace: &'a str,
    state: &'a mut Map<String, Value>,
    changes: Vec<StructuralChange>,
}

impl<'a> MutationContext<'a> {
    pub(crate) fn new(namespace: &'a str, state: &'a mut Map<String, Value>) -> Self {
        Self {
            namespace,
            state,
            changes: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        self.namespace
    }

    pub fn state(&self) -> &Map<String, Value> {
        &*self.state
    }

    /// Value at `path` relative to the module root.
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (last, parent) = path.split_last()?;
        object_at(&*self.state, parent)?.get(*last)
    }

    /// The object at `path`, for in-place assignment of existing keys.
    ///
    /// Inserting or removing keys through this reference bypasses change
    /// tracking; use [`set`](Self::set) and [`delete`](Self::delete) for that.
    pub fn object_mut(&mut self, path: &[&str]) -> Option<&mut Map<String, Value>> {
        object_at_mut(self.state, path)
    }

    /// Reactive set: assign `key` on the object at `parent`, recording an
    /// insertion when the key did not exist before.
    pub fn set(&mut self, parent: &[&str], key: &str, value: Value) -> Result<(), MutationError> {
        let target = object_at_mut(self.state, parent).ok_or_else(|| {
            MutationError::new(format!("no object at {}", display_path(parent)))
        })?;
        let inserted = target.insert(key.to_string(), value).is_none();
        if inserted {
            let path = self.absolute(parent, key);
            self.changes.push(StructuralChange::Inserted { path });
        }
        Ok(())
    }

    /// Reactive delete: remove `key` from the object at `parent`, recording
    /// the removal. Missing parents or keys are a no-op.
    pub fn delete(&mut self, parent: &[&str], key: &str) -> Option<Value> {
        let removed = object_at_mut(self.state, parent)?.remove(key)?;
        let path = self.absolute(parent, key);
        self.changes.push(StructuralChange::Removed { path });
        Some(removed)
    }

    pub(crate) fn into_changes(self) -> Vec<StructuralChange> {
        self.changes
    }

    fn absolute(&self, parent: &[&str], key: &str) -> Vec<String> {
        std::iter::once(self.namespace)
            .chain(parent.iter().copied())
            .chain(std::iter::once(key))
            .map(ToOwned::to_owned)
            .collect()
    }
}

fn object_at<'m>(root: &'m Map<String, Value>, path: &[&str]) -> Option<&'m Map<String, Value>> {
    let mut current = root;
    for segment in path {
        current = current.get(*segment)?.as_object()?;
    }
    Some(current)
}

fn object_at_mut<'m>(
    root: &'m mut Map<String, Value>,
    path: &[&str],
) -> Option<&'m mut Map<String, Value>> {
    let mut current = root;
    for segment in path {
        current = current.get_mut(*segment)?.as_object_mut()?;
    }
    Some(current)
}

fn display_path(path: &[&str]) -> String {
    if path.is_empty() {
        "<module root>".to_string()
    } else {
        path.join(".")
    }
}
