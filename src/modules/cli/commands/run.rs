//! Run command implementation

use clap::Args;
use crm_query_core::{CrmError, Settings};
use crm_query_runtime::Runtime;
use tracing::debug;

/// Run command arguments
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Override the bind host (`CRM_HOST`)
    #[arg(long)]
    pub host: Option<String>,

    /// Override the server port (`CRM_PORT`)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl RunCommand {
    /// Execute the run command
    pub async fn execute(&self, settings: Settings) -> Result<(), CrmError> {
        let settings = settings.with_bind_override(self.host.clone(), self.port);
        debug!("Settings: {:?}", settings);

        let runtime = Runtime::new(settings)?;
        runtime.run().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_run_command_args() {
        let cli = Cli::try_parse_from(["crm-query", "run", "--host", "127.0.0.1", "-p", "9000"])
            .unwrap();
        let Commands::Run(cmd) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(cmd.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cmd.port, Some(9000));
    }
}
