use std::collections::BTreeMap;

use quiver_core::store::VariableStore;
use quiver_core::template::{resolve_str, resolve_value, FieldPath, ResolveError};
use quiver_core::types::{AnyValue, RequestDefinition, Verb};

/// A request definition with every `{{var}}` placeholder substituted.
/// Ephemeral: built fresh from a store snapshot per execution, handed to the
/// callback afterwards, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub desc: String,
    pub method: Verb,
    pub base: String,
    pub endpoint: String,
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub body: Option<AnyValue>,
}

/// Resolves one definition against a store snapshot. All-or-nothing: the
/// first unbound variable aborts with its field path, and no HTTP call is
/// made from a partially resolved request.
pub fn resolve_request(
    definition: &RequestDefinition,
    api_base: &str,
    store: &VariableStore,
) -> Result<ResolvedRequest, ResolveError> {
    let desc = resolve_str(&definition.desc, store, &FieldPath::root("desc"))?;
    let base = resolve_str(api_base, store, &FieldPath::root("api_base"))?;
    let endpoint = resolve_str(&definition.endpoint, store, &FieldPath::root("endpoint"))?;

    let headers_path = FieldPath::root("headers");
    let mut headers = BTreeMap::new();
    for (name, value) in &definition.headers {
        headers.insert(
            name.clone(),
            resolve_str(value, store, &headers_path.key(name))?,
        );
    }

    let params_path = FieldPath::root("params");
    let mut params = BTreeMap::new();
    for (name, value) in &definition.params {
        params.insert(
            name.clone(),
            resolve_str(value, store, &params_path.key(name))?,
        );
    }

    let body = match &definition.body {
        Some(body) => Some(resolve_value(body, store, &FieldPath::root("body"))?),
        None => None,
    };

    Ok(ResolvedRequest {
        desc,
        method: definition.method,
        base,
        endpoint,
        headers,
        params,
        body,
    })
}

/// Composes the full request URL: project base + endpoint, with resolved
/// params appended as query pairs for every verb, non-GET included.
pub fn build_url(request: &ResolvedRequest) -> Result<url::Url, String> {
    if request.base.is_empty() {
        return Err("project has no api_base".to_string());
    }
    let mut url = url::Url::parse(&format!("{}{}", request.base, request.endpoint))
        .map_err(|e| e.to_string())?;
    if !request.params.is_empty() {
        let mut qp = url.query_pairs_mut();
        for (k, v) in &request.params {
            qp.append_pair(k, v);
        }
    }
    Ok(url)
}
