use clap::Args;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct CallbackArgs {
    /// Register a callback, NAME=SPEC. SPEC is `increment:VAR` or
    /// `capture:VAR:/json/pointer`.
    #[arg(long = "callback", value_name = "NAME=SPEC")]
    pub callbacks: Vec<String>,
}
