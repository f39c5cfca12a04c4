mod builtins;

pub use builtins::{CaptureField, IncrementVar};

use std::collections::BTreeMap;
use std::sync::Arc;

use quiver_core::store::VariableStore;

use crate::executor::{HttpOutcome, ResolvedRequest};

/// A named post-response hook. Receives the resolved request (so it can read
/// back values it just sent) and the response, and mutates the live store.
///
/// Callbacks must be deterministic and must not perform I/O; their only
/// allowed effect is `store.set` calls. This keeps the mutation step
/// replayable in tests.
pub trait Callback: Send + Sync {
    fn invoke(
        &self,
        request: &ResolvedRequest,
        response: &HttpOutcome,
        store: &mut VariableStore,
    ) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackError {
    #[error("callback `{0}` is not registered")]
    NotRegistered(String),
    #[error("callback `{name}` failed: {message}")]
    Failed { name: String, message: String },
}

/// Name → callback mapping for one project. Populated by the hosting
/// application before the session starts; request definitions are validated
/// against `names()` at load time.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    callbacks: BTreeMap<String, Arc<dyn Callback>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, callback: impl Callback + 'static) {
        self.callbacks.insert(name.into(), Arc::new(callback));
    }

    pub fn names(&self) -> Vec<String> {
        self.callbacks.keys().cloned().collect()
    }

    /// Runs the named callback. All-or-nothing: mutations are staged on a
    /// snapshot and committed only if the callback returns `Ok`, so a failing
    /// callback leaves the store exactly as it was.
    pub fn invoke(
        &self,
        name: &str,
        request: &ResolvedRequest,
        response: &HttpOutcome,
        store: &mut VariableStore,
    ) -> Result<(), CallbackError> {
        let callback = self
            .callbacks
            .get(name)
            .ok_or_else(|| CallbackError::NotRegistered(name.to_string()))?;

        let mut staged = store.snapshot();
        callback
            .invoke(request, response, &mut staged)
            .map_err(|message| CallbackError::Failed {
                name: name.to_string(),
                message,
            })?;
        *store = staged;
        Ok(())
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("names", &self.names())
            .finish()
    }
}
