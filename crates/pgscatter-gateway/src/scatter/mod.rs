//! Session state and the per-session scatter coordinator

pub mod scatter_conn;
pub mod session;

pub use scatter_conn::{ScatterConn, ShardResult};
pub use session::SessionState;
