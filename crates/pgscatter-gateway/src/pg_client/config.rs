//! Backend connection configuration
//!
//! All values can be overridden via environment variables for flexible deployment.

use super::codec::DEFAULT_MAX_MESSAGE_SIZE;
use std::time::Duration;
use tracing::info;

/// Settings shared by every backend connection the gateway opens
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Role sent in the StartupMessage
    pub user: String,
    /// Database sent in the StartupMessage; the backend defaults it to the user
    pub database: Option<String>,
    /// application_name reported to the backend unless the client sets one
    pub application_name: String,
    /// Connect plus handshake timeout in seconds
    pub connect_timeout_secs: u64,
    /// Largest backend frame accepted
    pub max_message_size: usize,
    /// TCP keepalive time in seconds (detects dead backends)
    pub tcp_keepalive_secs: u64,
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            user: std::env::var("PGSCATTER_USER").unwrap_or_else(|_| "postgres".to_string()),
            database: std::env::var("PGSCATTER_DATABASE").ok(),
            application_name: std::env::var("PGSCATTER_APPLICATION_NAME")
                .unwrap_or_else(|_| "pgscatter".to_string()),
            connect_timeout_secs: env_parse("PGSCATTER_CONNECT_TIMEOUT_SECS").unwrap_or(10),
            max_message_size: env_parse("PGSCATTER_MAX_MESSAGE_SIZE")
                .unwrap_or(DEFAULT_MAX_MESSAGE_SIZE),
            tcp_keepalive_secs: env_parse("PGSCATTER_TCP_KEEPALIVE_SECS").unwrap_or(10),
        }
    }
}

impl BackendConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Log configuration on startup
    pub fn log_config(&self) {
        info!(
            "Backend config: user={}, database={}, connect_timeout={}s, max_message={}KB, keepalive={}s",
            self.user,
            self.database.as_deref().unwrap_or("<user>"),
            self.connect_timeout_secs,
            self.max_message_size / 1024,
            self.tcp_keepalive_secs
        );
    }
}
