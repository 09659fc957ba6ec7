//! PostgreSQL wire protocol definitions
//!
//! Contains constants, message builders and parsers, and diagnostic field
//! encoding for the gateway's side of a backend connection.

pub mod constants;
pub mod diagnostic;
pub mod messages;

pub use messages::{BackendMessage, FrontendMessage};
