mod rules;
mod validator;

use crate::error::ValidationError;
use crate::types::Project;
use validator::Validator;

/// Load-time validation of a project against the host's registered callbacks.
///
/// A request naming an unregistered callback is rejected here, before any
/// request can run, so a bad name can never surface as a runtime lookup
/// failure mid-session.
pub fn validate_project(project: &Project, callbacks: &[String]) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    v.validate_project(project, callbacks);
    v.finish()
}
