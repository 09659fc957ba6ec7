//! Per-client session state
//!
//! Startup parameters are fixed once the client's handshake completes.
//! Session settings (from SET) change over the connection's life and always
//! take precedence over startup parameters with the same name. Every change
//! bumps a version so backends can tell whether they are behind.

use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct SessionSettings {
    values: HashMap<String, String>,
    version: u64,
}

/// Consistent copy of the session settings at one version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsSnapshot {
    pub values: HashMap<String, String>,
    pub version: u64,
}

/// State of one client session
#[derive(Debug, Default)]
pub struct SessionState {
    startup_params: HashMap<String, String>,
    settings: RwLock<SessionSettings>,
}

impl SessionState {
    pub fn new(startup_params: HashMap<String, String>) -> Self {
        Self {
            startup_params,
            settings: RwLock::new(SessionSettings::default()),
        }
    }

    pub fn startup_params(&self) -> &HashMap<String, String> {
        &self.startup_params
    }

    /// Set an override; returns the new version
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) -> u64 {
        let mut settings = self.settings.write();
        settings.values.insert(name.into(), value.into());
        settings.version += 1;
        settings.version
    }

    /// Drop one override; returns the new version, unchanged if there was
    /// nothing to drop
    pub fn reset(&self, name: &str) -> u64 {
        let mut settings = self.settings.write();
        if settings.values.remove(name).is_some() {
            settings.version += 1;
        }
        settings.version
    }

    /// Drop every override
    pub fn reset_all(&self) -> u64 {
        let mut settings = self.settings.write();
        if !settings.values.is_empty() {
            settings.values.clear();
            settings.version += 1;
        }
        settings.version
    }

    #[allow(dead_code)]
    pub fn get(&self, name: &str) -> Option<String> {
        self.settings.read().values.get(name).cloned()
    }

    #[allow(dead_code)]
    pub fn version(&self) -> u64 {
        self.settings.read().version
    }

    /// Settings and their version, read under one lock
    pub fn snapshot(&self) -> SettingsSnapshot {
        let settings = self.settings.read();
        SettingsSnapshot {
            values: settings.values.clone(),
            version: settings.version,
        }
    }
}
