use std::collections::BTreeMap;

use crate::types::RequestDefinition;

/// A loaded project document: variables, requests, and where responses go.
///
/// Immutable once loaded. The mutable counterpart is the session's
/// [`VariableStore`](crate::store::VariableStore), seeded from `variables`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Project {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_project: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output_path: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_base: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<RequestDefinition>,
}
