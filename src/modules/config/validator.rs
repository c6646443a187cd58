//! Settings validation

use crm_query_core::{CrmError, Settings};
use once_cell::sync::Lazy;
use regex::Regex;

/// Regex pattern for valid table names
static TABLE_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Settings validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate the settings record, failing on the first problem found
    pub fn validate(&self, settings: &Settings) -> Result<(), CrmError> {
        self.validate_database(settings)?;
        self.validate_llm(settings)?;
        self.validate_server(settings)?;
        Ok(())
    }

    /// Problems that do not prevent startup but limit functionality
    pub fn warnings(&self, settings: &Settings) -> Vec<String> {
        let mut warnings = Vec::new();
        if settings.llm.api_key.trim().is_empty() {
            warnings.push(
                "CRM_OPENAI_API_KEY is not set; chat completions and segment generation will fail"
                    .to_string(),
            );
        }
        warnings
    }

    fn validate_database(&self, settings: &Settings) -> Result<(), CrmError> {
        let db = &settings.database;

        if db.host.trim().is_empty() {
            return Err(CrmError::Validation(
                "Database host cannot be empty".to_string(),
            ));
        }
        if db.port == 0 {
            return Err(CrmError::Validation(
                "Database port must be non-zero".to_string(),
            ));
        }
        if db.database.trim().is_empty() {
            return Err(CrmError::Validation(
                "Database name cannot be empty".to_string(),
            ));
        }
        if db.tables.is_empty() {
            return Err(CrmError::Validation(
                "At least one table must be listed in CRM_DB_TABLES".to_string(),
            ));
        }
        for table in &db.tables {
            if !TABLE_NAME_PATTERN.is_match(table) {
                return Err(CrmError::Validation(format!(
                    "Invalid table name '{}': must be a plain SQL identifier",
                    table
                )));
            }
        }
        if db.pool.min_connections() > db.pool.max_connections() {
            return Err(CrmError::Validation(format!(
                "Pool minimum ({}) exceeds maximum ({})",
                db.pool.min_connections(),
                db.pool.max_connections()
            )));
        }
        Ok(())
    }

    fn validate_llm(&self, settings: &Settings) -> Result<(), CrmError> {
        let llm = &settings.llm;

        if llm.model.trim().is_empty() {
            return Err(CrmError::Validation(
                "Language model name cannot be empty".to_string(),
            ));
        }
        if !(llm.base_url.starts_with("http://") || llm.base_url.starts_with("https://")) {
            return Err(CrmError::Validation(format!(
                "Invalid language model base URL '{}': must start with http:// or https://",
                llm.base_url
            )));
        }
        Ok(())
    }

    fn validate_server(&self, settings: &Settings) -> Result<(), CrmError> {
        if settings.server.port == 0 {
            return Err(CrmError::Validation(
                "Server port must be non-zero".to_string(),
            ));
        }
        if settings.server.request_timeout_secs == 0 {
            return Err(CrmError::Validation(
                "Request timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(ConfigValidator::new().validate(&Settings::default()).is_ok());
    }

    #[test]
    fn test_rejects_bad_table_names() {
        let mut settings = Settings::default();
        settings.database.tables = vec!["customer".into(), "invoice; DROP".into()];
        let err = ConfigValidator::new().validate(&settings).unwrap_err();
        assert!(err.to_string().contains("invoice; DROP"));
    }

    #[test]
    fn test_rejects_empty_table_list() {
        let mut settings = Settings::default();
        settings.database.tables.clear();
        assert!(ConfigValidator::new().validate(&settings).is_err());
    }

    #[test]
    fn test_rejects_zero_ports() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(ConfigValidator::new().validate(&settings).is_err());

        let mut settings = Settings::default();
        settings.database.port = 0;
        assert!(ConfigValidator::new().validate(&settings).is_err());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let mut settings = Settings::default();
        settings.llm.base_url = "api.openai.com".into();
        assert!(ConfigValidator::new().validate(&settings).is_err());
    }

    #[test]
    fn test_missing_api_key_is_a_warning() {
        let validator = ConfigValidator::new();
        let settings = Settings::default();
        assert!(validator.validate(&settings).is_ok());
        assert_eq!(validator.warnings(&settings).len(), 1);

        let mut settings = Settings::default();
        settings.llm.api_key = "sk-test".into();
        assert!(validator.warnings(&settings).is_empty());
    }
}
