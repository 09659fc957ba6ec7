//! pgscatter Common Library
//!
//! Shared types for the pgscatter gateway and anything that talks to it over
//! the remote-procedure transport:
//! - `diagnostic` - PostgreSQL errors and notices with all 14 protocol fields
//! - `sqltypes` - NULL-safe rows, values, and query results
//! - `proto` / `transport` - transport messages and lossless conversions
//! - `error` - the gateway error taxonomy
//! - `config` - serializable shard and gateway configuration

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod proto;
pub mod sqltypes;
pub mod transport;

// Re-export commonly used types
pub use config::{GatewayConfig, ShardTarget};
pub use diagnostic::{Diagnostic, DiagnosticIssue, MessageKind};
pub use error::{find_diagnostic, GatewayError, Result};
pub use sqltypes::{Field, QueryResult, Row, Value};
