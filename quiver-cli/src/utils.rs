use std::path::{Path, PathBuf};

use quiver_core::template::FieldPath;
use quiver_core::{merge_documents, resolve_str, Project, VariableStore};
use quiver_exec::{CallbackRegistry, CaptureField, IncrementVar};

/// Parses file content as a JSON value, falling back to YAML.
fn parse_value(content: &str) -> Result<serde_json::Value, String> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('{') {
        return serde_json::from_str(content).map_err(|e| format!("JSON parse failed: {e}"));
    }
    serde_yaml::from_str(content).map_err(|e| format!("YAML parse failed: {e}"))
}

/// Loads a project file, applying the base-project merge when the document
/// names one. `base_project` may point at a project file or at a directory
/// containing `project.json`.
pub fn load_project(path: &Path) -> Result<Project, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let child = parse_value(&content)?;

    let merged = match child.get("base_project").and_then(|v| v.as_str()) {
        Some(base) => {
            let base_path = resolve_base_path(path, base);
            let base_content = std::fs::read_to_string(&base_path)
                .map_err(|e| format!("failed to read base project {}: {e}", base_path.display()))?;
            merge_documents(parse_value(&base_content)?, child)
        }
        None => child,
    };

    serde_json::from_value::<Project>(merged).map_err(|e| format!("invalid project: {e}"))
}

fn resolve_base_path(project_path: &Path, base: &str) -> PathBuf {
    let base = PathBuf::from(base);
    let base = if base.is_relative() {
        project_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(base)
    } else {
        base
    };
    if base.is_dir() {
        base.join("project.json")
    } else {
        base
    }
}

/// Where the project's JSONL log goes: `output_path` resolved against the
/// initial variables, relative to the project file.
pub fn log_file_path(project_path: &Path, project: &Project) -> Result<PathBuf, String> {
    let store = VariableStore::from(project.variables.clone());
    let resolved = resolve_str(
        &project.output_path,
        &store,
        &FieldPath::root("output_path"),
    )
    .map_err(|e| e.to_string())?;
    let dir = project_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(resolved);
    Ok(dir.join("log.jsonl"))
}

/// Builds the callback registry from repeated `--callback NAME=SPEC` flags.
pub fn parse_callback_specs(specs: &[String]) -> Result<CallbackRegistry, String> {
    let mut registry = CallbackRegistry::new();
    for spec in specs {
        let (name, rest) = spec
            .split_once('=')
            .ok_or_else(|| format!("invalid --callback `{spec}` (expected NAME=SPEC)"))?;
        match rest.split_once(':') {
            Some(("increment", variable)) if !variable.is_empty() => {
                registry.register(name, IncrementVar::new(variable));
            }
            Some(("capture", target)) => {
                let (variable, pointer) = target
                    .split_once(':')
                    .ok_or_else(|| format!("invalid capture spec `{rest}` (expected capture:VAR:/pointer)"))?;
                registry.register(name, CaptureField::new(variable, pointer));
            }
            _ => {
                return Err(format!(
                    "unknown callback spec `{rest}` (expected increment:VAR or capture:VAR:/pointer)"
                ));
            }
        }
    }
    Ok(registry)
}
