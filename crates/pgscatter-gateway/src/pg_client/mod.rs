//! PostgreSQL client side of the gateway
//!
//! Connections from the gateway to backend shards:
//! - `protocol`: message encoding, parsing, and diagnostic fields
//! - `codec`: tokio framing for backend streams
//! - `auth`: authentication negotiation and password policy
//! - `params`: ParameterStatus tracking
//! - `connection`: handshake, simple queries, and settings sync
//! - `connector`: opening connections over TCP

pub mod auth;
pub mod codec;
pub mod config;
pub mod connection;
pub mod connector;
pub mod params;
pub mod protocol;

#[cfg(test)]
pub(crate) mod testing;

pub use config::BackendConfig;
pub use connection::BackendConn;
pub use connector::{BackendConnector, TcpConnector};
