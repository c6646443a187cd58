//! CRM query CLI
//!
//! Command-line interface for the CRM natural-language query backend.

use clap::Parser;
use crm_query_cli::{logging, Cli, Commands};
use crm_query_config::EnvSource;
use crm_query_core::CrmError;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CrmError> {
    let cli = Cli::parse();

    if let Commands::Completion(cmd) = &cli.command {
        cmd.execute();
        return Ok(());
    }

    // Seed the environment before reading CRM_DEBUG for the log level
    EnvSource::load_dotenv(&cli.env_file)?;
    let source = EnvSource::from_env();

    logging::init(logging::default_level(cli.verbose, &source), cli.log_format);

    let settings = crm_query_config::load_from(&source)?;

    match cli.command {
        Commands::Run(cmd) => {
            cmd.execute(settings).await?;
        }
        Commands::Check(cmd) => {
            cmd.execute(settings).await?;
        }
        Commands::Completion(_) => {}
    }

    Ok(())
}
