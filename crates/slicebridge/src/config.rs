//! Bind configuration.
//!
//! `BridgeSettings` is the serializable part (it deserializes from TOML or
//! JSON with every field optional); `BridgeOptions` adds the parts that only
//! exist in code: the typed initial state and the key generator.

use crate::key::{DefaultKey, KeyGenerator};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub const DEFAULT_NAMESPACE: &str = "bridge";
pub const DEFAULT_BINDING_PROPERTY: &str = "$bridge";
pub const DEFAULT_KEY: &str = "default";

/// How activation handles an invalid generated key or a missing store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Invalid keys and missing stores abort activation.
    #[default]
    Strict,
    /// Invalid keys fall back to [`DEFAULT_KEY`]; a missing store yields a
    /// detached instance. Both are logged.
    Lenient,
}

/// Where instances are rendered; decides whether field reads are memoized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Long-lived instances; field reads are cached per store revision.
    #[default]
    Interactive,
    /// Render once and discard (server/snapshot rendering); no read cache.
    OneShot,
}

impl RenderMode {
    pub fn caches_reads(self) -> bool {
        matches!(self, Self::Interactive)
    }
}

impl Display for ErrorPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeSettings {
    pub namespace_name: String,
    pub binding_property_name: String,
    pub remove_on_destroy: bool,
    pub error_policy: ErrorPolicy,
    pub render_mode: RenderMode,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            namespace_name: DEFAULT_NAMESPACE.to_string(),
            binding_property_name: DEFAULT_BINDING_PROPERTY.to_string(),
            remove_on_destroy: false,
            error_policy: ErrorPolicy::default(),
            render_mode: RenderMode::default(),
        }
    }
}

impl BridgeSettings {
    /// Empty names fall back to the defaults.
    pub fn normalized(mut self) -> Self {
        if self.namespace_name.trim().is_empty() {
            self.namespace_name = DEFAULT_NAMESPACE.to_string();
        }
        if self.binding_property_name.trim().is_empty() {
            self.binding_property_name = DEFAULT_BINDING_PROPERTY.to_string();
        }
        self
    }
}

/// Everything `Bridge::new` needs.
#[derive(Clone)]
pub struct BridgeOptions<S> {
    pub initial_state: S,
    pub key_generator: Arc<dyn KeyGenerator>,
    pub settings: BridgeSettings,
}

impl<S> BridgeOptions<S> {
    pub fn new(initial_state: S) -> Self {
        Self {
            initial_state,
            key_generator: Arc::new(DefaultKey),
            settings: BridgeSettings::default(),
        }
    }

    pub fn key_generator(mut self, generator: impl KeyGenerator + 'static) -> Self {
        self.key_generator = Arc::new(generator);
        self
    }

    pub fn settings(mut self, settings: BridgeSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn namespace(mut self, name: impl Into<String>) -> Self {
        self.settings.namespace_name = name.into();
        self
    }

    pub fn binding_property(mut self, name: impl Into<String>) -> Self {
        self.settings.binding_property_name = name.into();
        self
    }

    pub fn remove_on_destroy(mut self, remove: bool) -> Self {
        self.settings.remove_on_destroy = remove;
        self
    }

    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.settings.error_policy = policy;
        self
    }

    pub fn render_mode(mut self, mode: RenderMode) -> Self {
        self.settings.render_mode = mode;
        self
    }
}

impl<S: Default> Default for BridgeOptions<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
