use quiver_core::store::VariableStore;

use crate::callback::Callback;
use crate::executor::{HttpOutcome, ResolvedRequest};

/// Parses a variable as an integer and stores it incremented by one.
/// The classic use is a `next_id` counter bumped after each successful POST.
#[derive(Debug, Clone)]
pub struct IncrementVar {
    pub variable: String,
}

impl IncrementVar {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl Callback for IncrementVar {
    fn invoke(
        &self,
        _request: &ResolvedRequest,
        _response: &HttpOutcome,
        store: &mut VariableStore,
    ) -> Result<(), String> {
        let current = store
            .get(&self.variable)
            .ok_or_else(|| format!("variable `{}` is not set", self.variable))?;
        let value: i64 = current
            .parse()
            .map_err(|_| format!("variable `{}` is not an integer: `{current}`", self.variable))?;
        store.set(&self.variable, (value + 1).to_string());
        Ok(())
    }
}

/// Copies a field of the JSON response body (addressed by JSON pointer, e.g.
/// `/token` or `/items/0/id`) into a variable for later requests to use.
#[derive(Debug, Clone)]
pub struct CaptureField {
    pub variable: String,
    pub pointer: String,
}

impl CaptureField {
    pub fn new(variable: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            pointer: pointer.into(),
        }
    }
}

impl Callback for CaptureField {
    fn invoke(
        &self,
        _request: &ResolvedRequest,
        response: &HttpOutcome,
        store: &mut VariableStore,
    ) -> Result<(), String> {
        let body = response
            .body
            .as_ref()
            .ok_or_else(|| "response body is not JSON".to_string())?;
        let value = body
            .pointer(&self.pointer)
            .ok_or_else(|| format!("response body has no field at `{}`", self.pointer))?;
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        store.set(&self.variable, text);
        Ok(())
    }
}
