use std::path::Path;

use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::utils::load_project;
use crate::OutputArgs;

#[derive(Serialize)]
struct RequestRow {
    index: usize,
    method: String,
    endpoint: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    desc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback: Option<String>,
}

#[derive(Serialize)]
struct RequestsResult {
    project: String,
    requests: Vec<RequestRow>,
}

pub async fn requests_cmd(path: &Path, output: OutputArgs) -> i32 {
    let project = match load_project(path) {
        Ok(p) => p,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let rows: Vec<RequestRow> = project
        .requests
        .iter()
        .enumerate()
        .map(|(index, r)| RequestRow {
            index,
            method: r.method.to_string(),
            endpoint: r.endpoint.clone(),
            desc: r.desc.clone(),
            callback: r.callback.clone(),
        })
        .collect();

    if output.format == OutputFormat::Text && !output.quiet {
        println!("{} ({} requests)", project.name, rows.len());
        for row in &rows {
            let desc = if row.desc.is_empty() {
                String::new()
            } else {
                format!(" - {}", row.desc)
            };
            println!("  [{}] {} {}{}", row.index, row.method, row.endpoint, desc);
        }
    } else {
        print_result(
            output.format,
            output.quiet,
            &RequestsResult {
                project: project.name.clone(),
                requests: rows,
            },
        );
    }
    exit_codes::SUCCESS
}
