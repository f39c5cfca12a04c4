mod common;
mod project;
mod request;

pub use common::AnyValue;
pub use project::Project;
pub use request::{RequestDefinition, Verb};
