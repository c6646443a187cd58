//! Check command implementation

use clap::Args;
use crm_query_core::{CrmError, Settings};
use crm_query_runtime::Runtime;
use tracing::info;

/// Check command arguments
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Also describe the configured tables
    #[arg(long)]
    pub schema: bool,
}

impl CheckCommand {
    /// Execute the check command
    ///
    /// Fails when the database cannot be reached, so the exit status can gate
    /// deployments.
    pub async fn execute(&self, settings: Settings) -> Result<(), CrmError> {
        let address = settings.database.address();
        let database = settings.database.database.clone();
        info!("Checking database {} ({})", address, database);

        let runtime = Runtime::new(settings)?;
        let result = self.check(&runtime, &address, &database).await;
        runtime.shutdown().await;
        result
    }

    async fn check(&self, runtime: &Runtime, address: &str, database: &str) -> Result<(), CrmError> {
        let delegate = runtime.delegate();
        if !delegate.health_check().await {
            return Err(CrmError::Database(format!(
                "Database '{}' at {} is unreachable",
                database, address
            )));
        }
        println!("Database '{}' at {}: connected", database, address);

        if self.schema {
            let context = delegate.engine().schema_context().await?;
            println!("{}", context);
        }

        println!(
            "Model: {} ({})",
            runtime.settings().llm.model,
            runtime.settings().llm.base_url
        );
        Ok(())
    }
}
