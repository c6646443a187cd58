//! Configuration loading for the CRM query backend
//!
//! Settings come from `CRM_`-prefixed environment variables, optionally
//! seeded from a `.env` file, and are validated before use.

pub mod env;
pub mod validator;

pub use env::{EnvSource, ENV_PREFIX};
pub use validator::ConfigValidator;

use crm_query_core::{CrmError, Settings};
use std::path::Path;
use tracing::warn;

/// Load settings from `dotenv_path` (if it exists) and the process environment
pub fn load(dotenv_path: &Path) -> Result<Settings, CrmError> {
    EnvSource::load_dotenv(dotenv_path)?;
    load_from(&EnvSource::from_env())
}

/// Resolve and validate settings from an explicit source
pub fn load_from(source: &EnvSource) -> Result<Settings, CrmError> {
    let settings = source.settings()?;

    let validator = ConfigValidator::new();
    validator.validate(&settings)?;
    for warning in validator.warnings(&settings) {
        warn!("{}", warning);
    }

    Ok(settings)
}
