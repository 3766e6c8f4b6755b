//! Instance lifecycle state machine.
//!
//! ```text
//! Unbound ──construct──▶ Activating ──store+key+slice──▶ Active ──teardown──▶ Destroyed
//! ```
//!
//! Transitions never skip a state. The state is shared between an instance
//! and its field proxies so a destroyed instance stops accepting writes.

use crate::error::BridgeError;
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Unbound,
    Activating,
    Active,
    Destroyed,
}

impl LifecycleState {
    pub fn can_advance_to(self, next: LifecycleState) -> bool {
        matches!(
            (self, next),
            (Self::Unbound, Self::Activating)
                | (Self::Activating, Self::Active)
                | (Self::Active, Self::Destroyed)
        )
    }
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Unbound => "unbound",
            Self::Activating => "activating",
            Self::Active => "active",
            Self::Destroyed => "destroyed",
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Lifecycle {
    kind: Arc<str>,
    state: Arc<RwLock<LifecycleState>>,
}

impl Lifecycle {
    pub(crate) fn new(kind: &str) -> Self {
        Self {
            kind: Arc::from(kind),
            state: Arc::new(RwLock::new(LifecycleState::Unbound)),
        }
    }

    pub(crate) fn current(&self) -> LifecycleState {
        *self.state.read()
    }

    pub(crate) fn advance(&self, next: LifecycleState) -> Result<(), BridgeError> {
        let mut state = self.state.write();
        if !state.can_advance_to(next) {
            return Err(BridgeError::InvalidTransition {
                from: *state,
                to: next,
            });
        }
        debug!(kind = %self.kind, from = %*state, to = %next, "lifecycle transition");
        *state = next;
        Ok(())
    }
}
