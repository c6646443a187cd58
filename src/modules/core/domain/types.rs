//! Additional configuration types

use std::time::Duration;

/// Connection pool configuration for the database connector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool (default: 10)
    pub max_connections: Option<u32>,

    /// Minimum number of connections to maintain (default: 0, keeps the pool lazy)
    pub min_connections: Option<u32>,

    /// Connection acquire timeout in seconds (default: 30)
    pub acquire_timeout_secs: Option<u64>,

    /// Idle connection timeout in seconds (default: 600)
    pub idle_timeout_secs: Option<u64>,

    /// Maximum lifetime of a connection in seconds (default: 1800)
    pub max_lifetime_secs: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: Some(10),
            min_connections: Some(0),
            acquire_timeout_secs: Some(30),
            idle_timeout_secs: Some(600),
            max_lifetime_secs: Some(1800),
        }
    }
}

impl PoolConfig {
    /// Get max connections with default fallback
    pub fn max_connections(&self) -> u32 {
        self.max_connections.unwrap_or(10)
    }

    /// Get min connections with default fallback
    pub fn min_connections(&self) -> u32 {
        self.min_connections.unwrap_or(0)
    }

    /// Get acquire timeout with default fallback
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs.unwrap_or(30))
    }

    /// Get idle timeout with default fallback
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.unwrap_or(600))
    }

    /// Get max lifetime with default fallback
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs.unwrap_or(1800))
    }
}
