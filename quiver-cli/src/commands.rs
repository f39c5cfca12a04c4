use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a project file and check it against the registered callbacks.
    Validate {
        path: PathBuf,
        #[command(flatten)]
        callbacks: CallbackArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List the requests a project defines, with their indices.
    Requests {
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Execute one request from a project, by index or description.
    Execute {
        path: PathBuf,
        /// Request index (`2`) or a substring of its description.
        request: String,
        /// Run the request this many times, sequentially.
        #[arg(long, default_value_t = 1)]
        repeat: u32,
        #[command(flatten)]
        callbacks: CallbackArgs,
        /// Per-request timeout in milliseconds. No timeout when omitted.
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Skip the project's JSONL log file; records go to stdout only.
        #[arg(long)]
        no_log_file: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Watch a Socket.IO endpoint and log every received event.
    Monitor {
        /// Endpoint base URL, e.g. https://example.com
        endpoint: String,
        #[arg(long, default_value = "/")]
        namespace: String,
        /// Extra query parameters for the handshake, KEY=VALUE.
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
        /// Event to emit once after connecting, EVENT=JSON.
        #[arg(long, value_name = "EVENT=JSON")]
        emit: Option<String>,
        /// Also append records to this JSONL file.
        #[arg(long)]
        log: Option<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
    },
}
