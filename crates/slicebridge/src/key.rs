//! Instance key generation and validation.
//!
//! A key partitions slices within one component kind: instances with equal
//! keys share a slice, instances with distinct keys are isolated. The default
//! generator returns [`DEFAULT_KEY`] for every instance, so a kind behaves as
//! a singleton until a generator says otherwise.

use crate::config::{DEFAULT_KEY, ErrorPolicy};
use crate::context::InstanceContext;
use crate::error::BridgeError;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Produces the key for an instance under construction.
///
/// `None` stands for "did not produce a string"; it is validated exactly like
/// an empty key.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self, ctx: &InstanceContext) -> Option<String>;
}

impl<F> KeyGenerator for F
where
    F: Fn(&InstanceContext) -> Option<String> + Send + Sync,
{
    fn generate(&self, ctx: &InstanceContext) -> Option<String> {
        self(ctx)
    }
}

/// Always [`DEFAULT_KEY`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKey;

impl KeyGenerator for DefaultKey {
    fn generate(&self, _ctx: &InstanceContext) -> Option<String> {
        Some(DEFAULT_KEY.to_string())
    }
}

/// Always the given key.
#[derive(Debug, Clone)]
pub struct ConstantKey(pub String);

impl KeyGenerator for ConstantKey {
    fn generate(&self, _ctx: &InstanceContext) -> Option<String> {
        Some(self.0.clone())
    }
}

/// The instance's string prop `name`, e.g. a route parameter.
///
/// Numeric props are rendered as strings; anything else produces no key.
#[derive(Debug, Clone)]
pub struct PropKey {
    prop: String,
}

impl PropKey {
    pub fn new(prop: impl Into<String>) -> Self {
        Self { prop: prop.into() }
    }
}

impl KeyGenerator for PropKey {
    fn generate(&self, ctx: &InstanceContext) -> Option<String> {
        match ctx.get_prop(&self.prop)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// `"1"`, `"2"`, … one fresh key per instance.
#[derive(Debug)]
pub struct SequentialKey {
    next: AtomicU64,
}

impl SequentialKey {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialKey {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyGenerator for SequentialKey {
    fn generate(&self, _ctx: &InstanceContext) -> Option<String> {
        Some(self.next.fetch_add(1, Ordering::Relaxed).to_string())
    }
}

/// Check a generated value: it must be a non-empty string.
pub fn validate_key(generated: Option<String>) -> Result<String, String> {
    match generated {
        None => Err("key generator returned no string".to_string()),
        Some(key) if key.is_empty() => Err("key generator returned an empty string".to_string()),
        Some(key) => Ok(key),
    }
}

/// Run `generator` for `ctx` and apply `policy` to an invalid result.
pub fn resolve_key(
    generator: &dyn KeyGenerator,
    ctx: &InstanceContext,
    kind: &str,
    policy: ErrorPolicy,
) -> Result<String, BridgeError> {
    match validate_key(generator.generate(ctx)) {
        Ok(key) => Ok(key),
        Err(reason) => match policy {
            ErrorPolicy::Strict => Err(BridgeError::KeyGeneration {
                kind: kind.to_string(),
                reason,
            }),
            ErrorPolicy::Lenient => {
                warn!(
                    kind = %kind,
                    reason = %reason,
                    fallback = DEFAULT_KEY,
                    "invalid instance key, using default"
                );
                Ok(DEFAULT_KEY.to_string())
            }
        },
    }
}
