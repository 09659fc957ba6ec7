//! Server parameter tracking
//!
//! Backends report run-time parameters (TimeZone, DateStyle, work_mem after
//! a SET, ...) with ParameterStatus messages. The tracker keeps the latest
//! value of each one for lookups, plus a buffer of changes not yet relayed
//! to the client.

use super::protocol::messages::parse_parameter_status;
use bytes::Bytes;
use parking_lot::Mutex;
use pgscatter_common::Result;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Inner {
    current: HashMap<String, String>,
    pending: HashMap<String, String>,
}

/// Latest server parameters plus changes pending relay
#[derive(Debug, Default)]
pub struct ParameterTracker {
    inner: Mutex<Inner>,
}

impl ParameterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reported parameter in both maps
    pub fn record(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let mut inner = self.inner.lock();
        inner.pending.insert(name.clone(), value.clone());
        inner.current.insert(name, value);
    }

    /// Parse a ParameterStatus body and record it
    #[allow(dead_code)]
    pub fn handle_parameter_status(&self, mut body: Bytes) -> Result<()> {
        let (name, value) = parse_parameter_status(&mut body)?;
        self.record(name, value);
        Ok(())
    }

    /// Take the changes recorded since the last drain.
    ///
    /// Returns `None` when nothing changed; the current values are kept.
    pub fn drain_pending(&self) -> Option<HashMap<String, String>> {
        let mut inner = self.inner.lock();
        if inner.pending.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut inner.pending))
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.inner.lock().current.get(name).cloned()
    }
}
