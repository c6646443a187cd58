//! CLI commands

mod check;
mod completion;
mod run;

pub use check::CheckCommand;
pub use completion::CompletionCommand;
pub use run::RunCommand;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CRM query - OpenAI-compatible natural-language queries over the CRM database
#[derive(Parser, Debug)]
#[command(name = "crm-query")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Dotenv file loaded before reading `CRM_*` variables (skipped if missing)
    #[arg(long = "env-file", global = true, default_value = ".env")]
    pub env_file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Run(RunCommand),

    /// Check configuration and database connectivity
    Check(CheckCommand),

    /// Generate shell completions
    #[command(hide = true)]
    Completion(CompletionCommand),
}
