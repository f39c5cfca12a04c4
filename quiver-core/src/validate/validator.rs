use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ValidationError, Violation};
use crate::template::malformed_placeholder;
use crate::types::{AnyValue, Project};

use super::rules;

pub(crate) static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid"));

pub struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.violations))
        }
    }

    pub fn validate_project(&mut self, project: &Project, callbacks: &[String]) {
        rules::validate_project(self, project, callbacks);
    }

    pub(crate) fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    pub(crate) fn validate_template_string(&mut self, path: &str, input: &str) {
        if let Some(snippet) = malformed_placeholder(input) {
            self.push(
                path,
                format!("malformed placeholder starting at `{snippet}` (expected {{{{identifier}}}})"),
            );
        }
    }

    pub(crate) fn validate_template_value(&mut self, path: &str, value: &AnyValue) {
        match value {
            AnyValue::Null | AnyValue::Bool(_) | AnyValue::Number(_) => {}
            AnyValue::String(s) => self.validate_template_string(path, s),
            AnyValue::Array(arr) => {
                for (idx, v) in arr.iter().enumerate() {
                    self.validate_template_value(&format!("{path}[{idx}]"), v);
                }
            }
            AnyValue::Object(map) => {
                for (k, v) in map {
                    self.validate_template_value(&format!("{path}.{k}"), v);
                }
            }
        }
    }
}
