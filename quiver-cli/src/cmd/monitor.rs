use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use quiver_exec::{CompositeSink, JsonlSink, MonitorConfig, RecordSink, SocketMonitor, StdoutSink};

use crate::exit_codes;
use crate::output::print_error;
use crate::OutputArgs;

pub async fn monitor_cmd(
    endpoint: &str,
    namespace: &str,
    params: &[String],
    emit: Option<&str>,
    log: Option<&Path>,
    output: OutputArgs,
) -> i32 {
    let mut config = MonitorConfig::new(endpoint);
    config.namespace = namespace.to_string();

    let mut query = BTreeMap::new();
    for param in params {
        let Some((key, value)) = param.split_once('=') else {
            print_error(
                output.format,
                output.quiet,
                &format!("invalid --param `{param}` (expected KEY=VALUE)"),
            );
            return exit_codes::RUNTIME_ERROR;
        };
        query.insert(key.to_string(), value.to_string());
    }
    config.params = query;

    if let Some(emit) = emit {
        let Some((event, json)) = emit.split_once('=') else {
            print_error(
                output.format,
                output.quiet,
                &format!("invalid --emit `{emit}` (expected EVENT=JSON)"),
            );
            return exit_codes::RUNTIME_ERROR;
        };
        let payload = match serde_json::from_str(json) {
            Ok(p) => p,
            Err(e) => {
                print_error(
                    output.format,
                    output.quiet,
                    &format!("invalid --emit payload: {e}"),
                );
                return exit_codes::RUNTIME_ERROR;
            }
        };
        config.emit_on_connect = Some((event.to_string(), payload));
    }

    let mut sink = CompositeSink::new();
    if !output.quiet {
        sink.add(Box::new(StdoutSink));
    }
    if let Some(log) = log {
        match JsonlSink::create(log) {
            Ok(file_sink) => sink.add(Box::new(file_sink)),
            Err(e) => {
                print_error(
                    output.format,
                    output.quiet,
                    &format!("failed to open log {}: {e}", log.display()),
                );
                return exit_codes::RUNTIME_ERROR;
            }
        }
    }
    let sink: Arc<dyn RecordSink> = Arc::new(sink);

    let handle = SocketMonitor::start(config, sink);

    // Runs until ctrl-c; the monitor then gets a clean stop.
    let interrupted = tokio::signal::ctrl_c().await.is_ok();
    if !interrupted {
        print_error(output.format, output.quiet, "failed to wait for ctrl-c");
    }
    match handle.stop().await {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            exit_codes::RUN_FAILED
        }
    }
}
