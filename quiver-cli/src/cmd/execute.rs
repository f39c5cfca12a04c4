use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use quiver_exec::{
    CompositeSink, ExecutionError, JsonlSink, LogRecord, Outcome, RecordSink, ReqwestHttpClient,
    Session, SessionConfig, StdoutSink,
};

use crate::args::CallbackArgs;
use crate::exit_codes;
use crate::output::print_error;
use crate::utils::{load_project, log_file_path, parse_callback_specs};
use crate::OutputArgs;

pub async fn execute_cmd(
    path: &Path,
    request: &str,
    repeat: u32,
    callbacks: &CallbackArgs,
    timeout_ms: Option<u64>,
    no_log_file: bool,
    output: OutputArgs,
) -> i32 {
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

    let mut sink = CompositeSink::new();
    if !output.quiet {
        sink.add(Box::new(StdoutSink));
    }
    if !no_log_file && !project.output_path.is_empty() {
        let log_path = match log_file_path(path, &project) {
            Ok(p) => p,
            Err(e) => {
                print_error(output.format, output.quiet, &e);
                return exit_codes::RUNTIME_ERROR;
            }
        };
        match JsonlSink::create(&log_path) {
            Ok(file_sink) => sink.add(Box::new(file_sink)),
            Err(e) => {
                print_error(
                    output.format,
                    output.quiet,
                    &format!("failed to open log {}: {e}", log_path.display()),
                );
                return exit_codes::RUNTIME_ERROR;
            }
        }
    }
    let sink: Arc<dyn RecordSink> = Arc::new(sink);

    let index = match find_request(&project.requests, request) {
        Some(index) => index,
        None => {
            print_error(
                output.format,
                output.quiet,
                &format!("no request matching `{request}`"),
            );
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let config = SessionConfig {
        timeout: timeout_ms.map(Duration::from_millis),
    };
    let mut session =
        match Session::new(project, registry, Arc::new(ReqwestHttpClient::default()), config) {
            Ok(s) => s,
            Err(ExecutionError::Config(e)) => {
                for violation in &e.violations {
                    print_error(
                        output.format,
                        output.quiet,
                        &format!("{}: {}", violation.path, violation.message),
                    );
                }
                return exit_codes::VALIDATION_FAILED;
            }
            Err(e) => {
                print_error(output.format, output.quiet, &e.to_string());
                return exit_codes::RUNTIME_ERROR;
            }
        };

    // One at a time, each to completion, in order.
    for _ in 0..repeat {
        let report = match session.execute(index).await {
            Ok(report) => report,
            Err(e) => {
                print_error(output.format, output.quiet, &e.to_string());
                return exit_codes::RUN_FAILED;
            }
        };

        let failed = !matches!(report.record.outcome, Outcome::Http(_));
        sink.append(LogRecord::Execution(report.record)).await;

        if let Some(e) = report.callback_error {
            print_error(output.format, output.quiet, &e.to_string());
        }
        if failed {
            return exit_codes::RUN_FAILED;
        }
    }

    exit_codes::SUCCESS
}

fn find_request(
    requests: &[quiver_core::RequestDefinition],
    selector: &str,
) -> Option<usize> {
    if let Ok(index) = selector.parse::<usize>() {
        return (index < requests.len()).then_some(index);
    }
    requests
        .iter()
        .position(|r| r.desc.contains(selector))
}
