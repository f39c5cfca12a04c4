use std::collections::BTreeMap;

/// Mutable variable state for one project session.
///
/// Values are always strings. Mutation is last-write-wins and only ever
/// happens between requests (the executor holds the session exclusively), so
/// no interior locking is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct VariableStore {
    values: BTreeMap<String, String>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Sets `name` to `value`, creating the variable if absent.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// An immutable copy of the current state. Template resolution reads a
    /// snapshot so a single resolve call never observes intra-call mutation.
    pub fn snapshot(&self) -> VariableStore {
        self.clone()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<BTreeMap<String, String>> for VariableStore {
    fn from(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for VariableStore {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}
