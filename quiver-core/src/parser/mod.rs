use crate::error::ParseError;
use crate::types::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFormat {
    Json,
    Yaml,
    Auto,
}

#[derive(Debug, Clone)]
pub struct ParsedProject {
    pub project: Project,
    pub format: ProjectFormat,
}

pub fn parse_project_str(input: &str, format: ProjectFormat) -> Result<ParsedProject, ParseError> {
    match format {
        ProjectFormat::Json => Ok(ParsedProject {
            project: serde_json::from_str::<Project>(input)?,
            format,
        }),
        ProjectFormat::Yaml => Ok(ParsedProject {
            project: serde_yaml::from_str::<Project>(input)?,
            format,
        }),
        ProjectFormat::Auto => parse_project_auto(input),
    }
}

fn parse_project_auto(input: &str) -> Result<ParsedProject, ParseError> {
    // Heuristic: JSON always starts with `{` after trimming.
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') {
        match serde_json::from_str::<Project>(input) {
            Ok(project) => {
                return Ok(ParsedProject {
                    project,
                    format: ProjectFormat::Json,
                });
            }
            Err(e) => {
                if let Ok(project) = serde_yaml::from_str::<Project>(input) {
                    return Ok(ParsedProject {
                        project,
                        format: ProjectFormat::Yaml,
                    });
                }
                return Err(ParseError::Json(e));
            }
        }
    }

    match serde_yaml::from_str::<Project>(input) {
        Ok(project) => Ok(ParsedProject {
            project,
            format: ProjectFormat::Yaml,
        }),
        Err(e) => {
            if let Ok(project) = serde_json::from_str::<Project>(input) {
                return Ok(ParsedProject {
                    project,
                    format: ProjectFormat::Json,
                });
            }
            Err(ParseError::Yaml(e))
        }
    }
}

/// Merges a child project document over its base.
///
/// Objects merge recursively with the child winning on conflicts. The child's
/// `requests` array replaces the base's entirely when present, so a child
/// never inherits requests it meant to redefine.
pub fn merge_documents(
    base: serde_json::Value,
    child: serde_json::Value,
) -> serde_json::Value {
    match (base, child) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(child_map)) => {
            let mut merged = base_map;
            for (key, child_val) in child_map {
                match merged.remove(&key) {
                    Some(base_val) if key != "requests" => {
                        merged.insert(key, merge_documents(base_val, child_val));
                    }
                    _ => {
                        merged.insert(key, child_val);
                    }
                }
            }
            serde_json::Value::Object(merged)
        }
        // Arrays and scalars are not merged element-wise: the child replaces.
        (_, child) => child,
    }
}
