use std::path::Path;

use quiver_core::validate_project;
use serde::Serialize;

use crate::args::CallbackArgs;
use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::utils::{load_project, parse_callback_specs};
use crate::OutputArgs;

#[derive(Serialize)]
struct ValidateResult {
    valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

pub async fn validate_cmd(path: &Path, callbacks: &CallbackArgs, output: OutputArgs) -> i32 {
    let registry = match parse_callback_specs(&callbacks.callbacks) {
        Ok(r) => r,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let project = match load_project(path) {
        Ok(p) => p,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::VALIDATION_FAILED;
        }
    };

    match validate_project(&project, &registry.names()) {
        Ok(()) => {
            if output.format == OutputFormat::Text && !output.quiet {
                println!("ok: valid project `{}`", project.name);
            } else {
                print_result(
                    output.format,
                    output.quiet,
                    &ValidateResult {
                        valid: true,
                        errors: vec![],
                    },
                );
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            let errors: Vec<String> = e
                .violations
                .iter()
                .map(|v| format!("{}: {}", v.path, v.message))
                .collect();
            if output.format == OutputFormat::Text && !output.quiet {
                eprintln!("invalid project ({} violations):", errors.len());
                for err in &errors {
                    eprintln!("  {err}");
                }
            } else {
                print_result(
                    output.format,
                    output.quiet,
                    &ValidateResult {
                        valid: false,
                        errors,
                    },
                );
            }
            exit_codes::VALIDATION_FAILED
        }
    }
}
