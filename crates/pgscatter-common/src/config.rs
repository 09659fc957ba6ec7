//! Configuration types for the gateway
//!
//! Loaded from a JSON file by the gateway binary; every field except the
//! shard list has a default.

use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One backend shard the gateway can connect to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardTarget {
    /// Shard name used in logs and as the connection key
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    5432
}

impl ShardTarget {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
        }
    }

    /// "host:port" for connecting
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parse "name=host:port" or "name=host"
    pub fn parse(s: &str) -> Result<Self> {
        let (name, addr) = s.split_once('=').ok_or_else(|| {
            GatewayError::Config(format!("shard '{}' must look like name=host:port", s))
        })?;
        if name.is_empty() {
            return Err(GatewayError::Config(format!("shard '{}' has an empty name", s)));
        }
        let (host, port) = match addr.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse().map_err(|_| {
                    GatewayError::Config(format!("shard '{}' has an invalid port '{}'", s, port))
                })?;
                (host, port)
            }
            None => (addr, default_port()),
        };
        if host.is_empty() {
            return Err(GatewayError::Config(format!("shard '{}' has an empty host", s)));
        }
        Ok(Self::new(name, host, port))
    }
}

impl std::fmt::Display for ShardTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.name, self.host, self.port)
    }
}

/// Gateway configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Backend shards
    pub shards: Vec<ShardTarget>,
    /// Role used for backend connections
    #[serde(default)]
    pub user: Option<String>,
    /// Database used for backend connections
    #[serde(default)]
    pub database: Option<String>,
    /// Startup parameters to present as if a client had sent them
    #[serde(default)]
    pub startup_params: HashMap<String, String>,
}

impl GatewayConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}
