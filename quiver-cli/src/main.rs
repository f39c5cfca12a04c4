use clap::Parser;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;
mod utils;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "quiver", version, about = "API request exploration tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    std::process::exit(exit_code);
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Validate {
            path,
            callbacks,
            output,
        } => cmd::validate::validate_cmd(&path, &callbacks, output).await,
        Command::Requests { path, output } => cmd::requests::requests_cmd(&path, output).await,
        Command::Execute {
            path,
            request,
            repeat,
            callbacks,
            timeout_ms,
            no_log_file,
            output,
        } => {
            cmd::execute::execute_cmd(
                &path,
                &request,
                repeat,
                &callbacks,
                timeout_ms,
                no_log_file,
                output,
            )
            .await
        }
        Command::Monitor {
            endpoint,
            namespace,
            params,
            emit,
            log,
            output,
        } => {
            cmd::monitor::monitor_cmd(
                &endpoint,
                &namespace,
                &params,
                emit.as_deref(),
                log.as_deref(),
                output,
            )
            .await
        }
    }
}
