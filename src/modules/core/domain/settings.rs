//! Process-wide settings
//!
//! Built once at startup (see the `crm-query-config` crate) and shared behind
//! an `Arc` for the lifetime of the process.

use std::fmt;
use std::time::Duration;

use super::{PoolConfig, SegmentSqlPolicy};

/// Tables the query engine is allowed to see by default
pub const DEFAULT_TABLES: &[&str] = &[
    "branch",
    "customer",
    "lead",
    "invoice",
    "product",
    "productdtl",
    "city",
    "customertype",
    "customertypedtl",
];

/// Database connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Tables exposed to the text-to-SQL engine
    pub tables: Vec<String>,
    pub pool: PoolConfig,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "clonecrm".to_string(),
            tables: DEFAULT_TABLES.iter().map(|t| t.to_string()).collect(),
            pool: PoolConfig::default(),
        }
    }
}

impl DatabaseSettings {
    /// `host:port`, safe to log
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &redact(&self.password))
            .field("database", &self.database)
            .field("tables", &self.tables)
            .field("pool", &self.pool)
            .finish()
    }
}

/// Language model settings
#[derive(Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub api_key: String,
    pub model: String,
    /// Base URL of the chat-completions API, without the `/chat/completions` suffix
    pub base_url: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            debug: false,
            request_timeout_secs: 120,
        }
    }
}

impl ServerSettings {
    /// `host:port` bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Root settings record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub llm: LlmSettings,
    pub server: ServerSettings,
    /// Trust policy for caller-supplied segment SQL
    pub segment_sql_policy: SegmentSqlPolicy,
}

impl Settings {
    /// Apply CLI overrides for the bind address
    pub fn with_bind_override(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.database.address(), "localhost:3306");
        assert_eq!(settings.database.database, "clonecrm");
        assert_eq!(settings.database.tables.len(), 9);
        assert_eq!(settings.llm.model, "gpt-4o-mini");
        assert_eq!(settings.server.bind_address(), "0.0.0.0:8000");
        assert!(!settings.server.debug);
        assert_eq!(settings.segment_sql_policy, SegmentSqlPolicy::Unrestricted);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut settings = Settings::default();
        settings.database.password = "hunter2".to_string();
        settings.llm.api_key = "sk-secret".to_string();

        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_bind_override() {
        let settings = Settings::default().with_bind_override(Some("127.0.0.1".into()), Some(9000));
        assert_eq!(settings.server.bind_address(), "127.0.0.1:9000");

        let settings = Settings::default().with_bind_override(None, None);
        assert_eq!(settings.server.port, 8000);
    }
}
