use crate::store::VariableStore;
use crate::types::AnyValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Var(String),
}

/// Dotted location of a value inside a request definition, e.g. `body.price`
/// or `params.sort`. Carried through resolution so an unbound variable can be
/// reported with the field that referenced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn root(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn key(&self, key: &str) -> Self {
        if self.0.is_empty() {
            Self(key.to_string())
        } else {
            Self(format!("{}.{}", self.0, key))
        }
    }

    pub fn index(&self, idx: usize) -> Self {
        Self(format!("{}[{}]", self.0, idx))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("unbound variable `{{{{{variable}}}}}` at {path}")]
    UnboundVariable { variable: String, path: String },
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Splits a template string into literal and `{{identifier}}` segments.
///
/// Scanning is a single left-to-right pass; a `{{` that is not followed by an
/// identifier and a closing `}}` is ordinary text. Identifiers are
/// case-sensitive `[A-Za-z0-9_]+`. Total: never fails.
pub fn parse_template(input: &str) -> Vec<Segment> {
    let bytes = input.as_bytes();
    let mut segments = Vec::new();
    let mut lit_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'{' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            let ident_start = i + 2;
            let mut j = ident_start;
            while j < bytes.len() && is_ident_byte(bytes[j]) {
                j += 1;
            }
            let closed = j > ident_start && j + 1 < bytes.len() && &bytes[j..j + 2] == b"}}";
            if closed {
                if lit_start < i {
                    segments.push(Segment::Literal(input[lit_start..i].to_string()));
                }
                segments.push(Segment::Var(input[ident_start..j].to_string()));
                i = j + 2;
                lit_start = i;
                continue;
            }
        }
        i += 1;
    }

    if lit_start < input.len() {
        segments.push(Segment::Literal(input[lit_start..].to_string()));
    }
    segments
}

/// Reports the first `{{` in `input` that does not form a valid placeholder,
/// for load-time validation. Resolution itself treats such text as literal.
pub fn malformed_placeholder(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            let ident_start = i + 2;
            let mut j = ident_start;
            while j < bytes.len() && is_ident_byte(bytes[j]) {
                j += 1;
            }
            if j > ident_start && j + 1 < bytes.len() && &bytes[j..j + 2] == b"}}" {
                i = j + 2;
                continue;
            }
            let end = (i + 24).min(input.len());
            return Some(input[i..end].to_string());
        }
        i += 1;
    }
    None
}

/// Substitutes every `{{identifier}}` in `input` with the store's current
/// value for that identifier.
///
/// Inserted values are taken literally: a value that itself contains `{{...}}`
/// is never re-scanned, so resolution always terminates in one pass.
pub fn resolve_str(
    input: &str,
    store: &VariableStore,
    path: &FieldPath,
) -> Result<String, ResolveError> {
    let mut out = String::with_capacity(input.len());
    for segment in parse_template(input) {
        match segment {
            Segment::Literal(lit) => out.push_str(&lit),
            Segment::Var(name) => match store.get(&name) {
                Some(value) => out.push_str(value),
                None => {
                    return Err(ResolveError::UnboundVariable {
                        variable: name,
                        path: path.to_string(),
                    })
                }
            },
        }
    }
    Ok(out)
}

/// Resolves every string in a value tree against the store.
///
/// Numbers, booleans and null pass through unchanged; arrays keep their
/// order; object keys are never templated. All-or-nothing: the first unbound
/// variable aborts the whole resolution.
pub fn resolve_value(
    value: &AnyValue,
    store: &VariableStore,
    path: &FieldPath,
) -> Result<AnyValue, ResolveError> {
    match value {
        AnyValue::Null | AnyValue::Bool(_) | AnyValue::Number(_) => Ok(value.clone()),
        AnyValue::String(s) => Ok(AnyValue::String(resolve_str(s, store, path)?)),
        AnyValue::Array(arr) => {
            let mut out = Vec::with_capacity(arr.len());
            for (idx, v) in arr.iter().enumerate() {
                out.push(resolve_value(v, store, &path.index(idx))?);
            }
            Ok(AnyValue::Array(out))
        }
        AnyValue::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                out.insert(k.clone(), resolve_value(v, store, &path.key(k))?);
            }
            Ok(AnyValue::Object(out))
        }
    }
}
