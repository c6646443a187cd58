//! Environment variable source
//!
//! Reads `CRM_`-prefixed variables (case-insensitively) and turns them into
//! a [`Settings`] record, falling back to the defaults for anything unset.

use crm_query_core::{CrmError, PoolConfig, SegmentSqlPolicy, Settings};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Prefix shared by every configuration variable
pub const ENV_PREFIX: &str = "CRM_";

/// Snapshot of the prefixed environment
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    /// Upper-cased variable names with the prefix removed
    vars: HashMap<String, String>,
}

impl EnvSource {
    /// Snapshot the current process environment
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build from an explicit list of variables (prefixed names)
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let vars = vars
            .into_iter()
            .filter_map(|(key, value)| {
                let key = key.as_ref().to_uppercase();
                key.strip_prefix(ENV_PREFIX)
                    .map(|name| (name.to_string(), value.into()))
            })
            .collect();
        Self { vars }
    }

    /// Load a dotenv file into the process environment
    ///
    /// Variables already set in the environment win. Returns `false` when the
    /// file does not exist.
    pub fn load_dotenv(path: &Path) -> Result<bool, CrmError> {
        match dotenvy::from_path(path) {
            Ok(()) => {
                debug!("Loaded environment from {}", path.display());
                Ok(true)
            }
            Err(e) if e.not_found() => Ok(false),
            Err(e) => Err(CrmError::Config(format!(
                "Failed to read '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    /// Raw value of `CRM_<name>`, if set
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(&name.to_uppercase()).map(String::as_str)
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or(default).to_string()
    }

    fn parse<T>(&self, name: &str, default: T) -> Result<T, CrmError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        Ok(self.parse_opt(name, None)?.unwrap_or(default))
    }

    fn parse_opt<T>(&self, name: &str, default: Option<T>) -> Result<Option<T>, CrmError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name).map(str::trim) {
            None | Some("") => Ok(default),
            Some(raw) => raw.parse().map(Some).map_err(|e| {
                CrmError::Config(format!("Invalid value for {}{}: {}", ENV_PREFIX, name, e))
            }),
        }
    }

    fn boolean(&self, name: &str, default: bool) -> Result<bool, CrmError> {
        match self.get(name).map(|v| v.trim().to_lowercase()) {
            None => Ok(default),
            Some(v) => match v.as_str() {
                "" => Ok(default),
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                other => Err(CrmError::Config(format!(
                    "Invalid value for {}{}: '{}' is not a boolean",
                    ENV_PREFIX, name, other
                ))),
            },
        }
    }

    fn list(&self, name: &str, default: &[String]) -> Vec<String> {
        match self.get(name) {
            None => default.to_vec(),
            Some(raw) => split_list(raw),
        }
    }

    /// Resolve the full settings record
    pub fn settings(&self) -> Result<Settings, CrmError> {
        let defaults = Settings::default();
        let mut settings = defaults.clone();

        let db = &mut settings.database;
        db.host = self.string("DB_HOST", &defaults.database.host);
        db.port = self.parse("DB_PORT", defaults.database.port)?;
        db.user = self.string("DB_USER", &defaults.database.user);
        db.password = self.string("DB_PASSWORD", &defaults.database.password);
        db.database = self.string("DB_DATABASE", &defaults.database.database);
        db.tables = self.list("DB_TABLES", &defaults.database.tables);
        db.pool = PoolConfig {
            max_connections: self
                .parse_opt("DB_MAX_CONNECTIONS", defaults.database.pool.max_connections)?,
            min_connections: self
                .parse_opt("DB_MIN_CONNECTIONS", defaults.database.pool.min_connections)?,
            acquire_timeout_secs: self.parse_opt(
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults.database.pool.acquire_timeout_secs,
            )?,
            ..defaults.database.pool.clone()
        };

        let llm = &mut settings.llm;
        llm.api_key = self.string("OPENAI_API_KEY", &defaults.llm.api_key);
        llm.model = self.string("OPENAI_MODEL", &defaults.llm.model);
        llm.base_url = self
            .string("OPENAI_BASE_URL", &defaults.llm.base_url)
            .trim_end_matches('/')
            .to_string();

        let server = &mut settings.server;
        server.host = self.string("HOST", &defaults.server.host);
        server.port = self.parse("PORT", defaults.server.port)?;
        server.debug = self.boolean("DEBUG", defaults.server.debug)?;
        server.request_timeout_secs =
            self.parse("REQUEST_TIMEOUT_SECS", defaults.server.request_timeout_secs)?;

        settings.segment_sql_policy =
            self.parse::<SegmentSqlPolicy>("SEGMENT_SQL_POLICY", defaults.segment_sql_policy)?;

        Ok(settings)
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
