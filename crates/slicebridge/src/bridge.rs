//! Binding component kinds to the shared store.
//!
//! `Bridge::new` fixes the slice shape and error policy once. `Bridge::bind`
//! turns a host `ComponentDescriptor` into a `BoundComponent`: an immutable
//! per-kind configuration plus the wrapped hooks. Each `create` runs the
//! activation sequence:
//!
//! ```text
//! key ─▶ ensure_namespace ─▶ ensure_slice ─▶ attach binding + proxies ─▶ before_create hook
//! ```

use crate::binding::Binding;
use crate::config::{BridgeOptions, BridgeSettings, ErrorPolicy, RenderMode};
use crate::context::InstanceContext;
use crate::error::BridgeError;
use crate::handle::SliceHandle;
use crate::instance::Instance;
use crate::key::{KeyGenerator, resolve_key};
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::proxy::FieldProxy;
use crate::registry::ensure_namespace;
use crate::slice::{SliceState, ensure_slice, to_field_map};
use serde_json::{Map, Value};
use slicebridge_store::Store;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

/// Host hook run with the instance after the bridge's own work.
pub type Hook<S> = Arc<dyn Fn(&Instance<S>) + Send + Sync>;

/// Slice shape, key generator, and settings shared by every kind bound
/// through this bridge.
pub struct Bridge<S> {
    initial_state: Map<String, Value>,
    key_generator: Arc<dyn KeyGenerator>,
    settings: BridgeSettings,
    _slice: PhantomData<fn() -> S>,
}

impl<S: SliceState> Bridge<S> {
    pub fn new(options: BridgeOptions<S>) -> Result<Self, BridgeError> {
        let initial_state = to_field_map(&options.initial_state, "initial state")?;
        Ok(Self {
            initial_state,
            key_generator: options.key_generator,
            settings: options.settings.normalized(),
            _slice: PhantomData,
        })
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    pub fn namespace(&self) -> &str {
        &self.settings.namespace_name
    }

    pub fn binding_property(&self) -> &str {
        &self.settings.binding_property_name
    }

    pub fn key_generator(&self) -> &dyn KeyGenerator {
        self.key_generator.as_ref()
    }

    /// Declared field names, in the slice's stored order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.initial_state.keys().map(String::as_str)
    }

    pub fn initial_state(&self) -> &Map<String, Value> {
        &self.initial_state
    }

    /// Bind one component kind. Fails if the descriptor has no kind name.
    pub fn bind(
        &self,
        descriptor: ComponentDescriptor<S>,
    ) -> Result<BoundComponent<S>, BridgeError> {
        let kind = descriptor.name.trim();
        if kind.is_empty() {
            return Err(BridgeError::Configuration(
                "component kind name must be set".to_string(),
            ));
        }

        let config = BindConfig {
            kind: kind.to_string(),
            namespace: self.settings.namespace_name.clone(),
            binding_property: self.settings.binding_property_name.clone(),
            fields: self.initial_state.keys().cloned().collect(),
            initial_state: self.initial_state.clone(),
            key_generator: Arc::clone(&self.key_generator),
            remove_on_destroy: self.settings.remove_on_destroy,
            error_policy: self.settings.error_policy,
            render_mode: self.settings.render_mode,
        };

        Ok(BoundComponent {
            config: Arc::new(config),
            before_create: descriptor.before_create,
            destroyed: descriptor.destroyed,
        })
    }
}

impl<S> Debug for Bridge<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("initial_state", &self.initial_state)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// What the host supplies for one component kind.
pub struct ComponentDescriptor<S> {
    name: String,
    before_create: Option<Hook<S>>,
    destroyed: Option<Hook<S>>,
}

impl<S> ComponentDescriptor<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            before_create: None,
            destroyed: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs once the instance's fields are live.
    pub fn before_create<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance<S>) + Send + Sync + 'static,
    {
        self.before_create = Some(Arc::new(hook));
        self
    }

    /// Runs after teardown (and after slice removal, if enabled).
    pub fn destroyed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance<S>) + Send + Sync + 'static,
    {
        self.destroyed = Some(Arc::new(hook));
        self
    }
}

impl<S> Default for ComponentDescriptor<S> {
    fn default() -> Self {
        Self::new(String::new())
    }
}

/// Immutable per-kind configuration threaded through every operation.
pub(crate) struct BindConfig {
    pub(crate) kind: String,
    pub(crate) namespace: String,
    pub(crate) binding_property: String,
    pub(crate) fields: Vec<String>,
    pub(crate) initial_state: Map<String, Value>,
    pub(crate) key_generator: Arc<dyn KeyGenerator>,
    pub(crate) remove_on_destroy: bool,
    pub(crate) error_policy: ErrorPolicy,
    pub(crate) render_mode: RenderMode,
}

impl BindConfig {
    pub(crate) fn binding(&self, key: String) -> Binding {
        Binding::new(&self.kind, &self.namespace, &self.binding_property, key)
    }
}

/// A component kind ready to be instantiated against a store.
pub struct BoundComponent<S> {
    config: Arc<BindConfig>,
    before_create: Option<Hook<S>>,
    destroyed: Option<Hook<S>>,
}

impl<S: SliceState> BoundComponent<S> {
    pub fn kind(&self) -> &str {
        &self.config.kind
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn binding_property(&self) -> &str {
        &self.config.binding_property
    }

    /// Names of the injected field accessors.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.config.fields.iter().map(String::as_str)
    }

    pub fn remove_on_destroy(&self) -> bool {
        self.config.remove_on_destroy
    }

    /// The key an instance with `ctx` would get, after validation.
    pub fn key(&self, ctx: &InstanceContext) -> Result<String, BridgeError> {
        resolve_key(
            self.config.key_generator.as_ref(),
            ctx,
            &self.config.kind,
            self.config.error_policy,
        )
    }

    /// Construct and activate an instance.
    ///
    /// Nothing partially initialized escapes: any failure before the
    /// instance reaches `Active` is returned instead of an instance.
    pub fn create(&self, ctx: InstanceContext) -> Result<Instance<S>, BridgeError> {
        let config = &self.config;
        let lifecycle = Lifecycle::new(&config.kind);
        lifecycle.advance(LifecycleState::Activating)?;

        let store = match ctx.reachable_store() {
            Some(store) => Some(store.clone()),
            None if config.error_policy == ErrorPolicy::Lenient => {
                warn!(
                    kind = %config.kind,
                    "no store reachable; instance fields are detached"
                );
                None
            }
            None => {
                return Err(BridgeError::Integration {
                    kind: config.kind.clone(),
                });
            }
        };

        let key = self.key(&ctx)?;
        if let Some(store) = &store {
            ensure_namespace(store, &config.namespace)?;
            ensure_slice(
                store,
                &config.namespace,
                &config.kind,
                &key,
                &config.initial_state,
            )?;
        }

        let binding = Arc::new(config.binding(key));
        let fields: BTreeMap<String, FieldProxy> = config
            .fields
            .iter()
            .map(|field| {
                let proxy = FieldProxy::new(
                    field.clone(),
                    Arc::clone(&binding),
                    store.clone(),
                    lifecycle.clone(),
                    config.render_mode,
                );
                (field.clone(), proxy)
            })
            .collect();

        lifecycle.advance(LifecycleState::Active)?;
        let instance = Instance::new(
            Arc::clone(config),
            binding,
            fields,
            store,
            ctx.props().clone(),
            lifecycle,
            self.destroyed.clone(),
        );

        if let Some(hook) = &self.before_create {
            hook(&instance);
        }
        Ok(instance)
    }

    /// Direct slice access outside any instance, e.g. to pre-populate state
    /// before anything mounts. Uses the same key and initialization path as
    /// [`create`](Self::create).
    pub fn slice_handle(
        &self,
        store: &Store,
        ctx: &InstanceContext,
    ) -> Result<SliceHandle<S>, BridgeError> {
        let config = &self.config;
        let key = self.key(ctx)?;
        ensure_namespace(store, &config.namespace)?;
        ensure_slice(
            store,
            &config.namespace,
            &config.kind,
            &key,
            &config.initial_state,
        )?;
        Ok(SliceHandle::new(store.clone(), config.binding(key)))
    }
}

impl<S> Clone for BoundComponent<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            before_create: self.before_create.clone(),
            destroyed: self.destroyed.clone(),
        }
    }
}

impl<S> Debug for BoundComponent<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundComponent")
            .field("kind", &self.config.kind)
            .field("namespace", &self.config.namespace)
            .field("fields", &self.config.fields)
            .field("remove_on_destroy", &self.config.remove_on_destroy)
            .field("error_policy", &self.config.error_policy)
            .finish_non_exhaustive()
    }
}
