#![forbid(unsafe_code)]

pub mod error;
pub mod parser;
pub mod store;
pub mod template;
pub mod types;
pub mod validate;

pub use crate::error::{ParseError, ProjectError, ValidationError, Violation};
pub use crate::parser::{merge_documents, parse_project_str, ParsedProject, ProjectFormat};
pub use crate::store::VariableStore;
pub use crate::template::{resolve_str, resolve_value, FieldPath, ResolveError};
pub use crate::types::{Project, RequestDefinition, Verb};
pub use crate::validate::validate_project;
