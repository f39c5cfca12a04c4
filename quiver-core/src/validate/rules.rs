use crate::template::{parse_template, Segment};
use crate::types::{Project, RequestDefinition};

use super::validator::{Validator, IDENT_RE};

pub(crate) fn validate_project(v: &mut Validator, project: &Project, callbacks: &[String]) {
    if project.name.trim().is_empty() {
        v.push("name", "must not be empty");
    }

    v.validate_template_string("output_path", &project.output_path);
    v.validate_template_string("api_base", &project.api_base);
    let base_is_literal = parse_template(&project.api_base)
        .iter()
        .all(|s| matches!(s, Segment::Literal(_)));
    if !project.api_base.is_empty() && base_is_literal {
        // Fully-literal base URLs can be checked now; templated ones only at
        // resolution time.
        if let Err(e) = url::Url::parse(&project.api_base) {
            v.push("api_base", format!("not a valid URL: {e}"));
        }
    }

    for (name, _) in &project.variables {
        if !IDENT_RE.is_match(name) {
            v.push(
                format!("variables.{name}"),
                "variable names must be alphanumeric/underscore",
            );
        }
    }

    for (idx, request) in project.requests.iter().enumerate() {
        validate_request(v, request, &format!("requests[{idx}]"), callbacks);
    }
}

fn validate_request(
    v: &mut Validator,
    request: &RequestDefinition,
    path: &str,
    callbacks: &[String],
) {
    if request.endpoint.trim().is_empty() {
        v.push(format!("{path}.endpoint"), "must not be empty");
    }
    v.validate_template_string(&format!("{path}.endpoint"), &request.endpoint);

    for (name, value) in &request.headers {
        v.validate_template_string(&format!("{path}.headers.{name}"), value);
    }
    for (name, value) in &request.params {
        v.validate_template_string(&format!("{path}.params.{name}"), value);
    }
    if let Some(body) = &request.body {
        v.validate_template_value(&format!("{path}.body"), body);
    }

    if let Some(callback) = &request.callback {
        if !callbacks.iter().any(|c| c == callback) {
            v.push(
                format!("{path}.callback"),
                format!("callback `{callback}` is not registered"),
            );
        }
    }
}
