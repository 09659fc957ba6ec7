//! PostgreSQL wire protocol constants
//!
//! Message type bytes and authentication codes for the frontend side of the
//! protocol, i.e. the gateway talking to a backend shard.

/// Protocol version 3.0 as sent in the StartupMessage
pub const PROTOCOL_VERSION_3_0: i32 = 196_608;

// Frontend (gateway -> backend) message types
pub const MSG_QUERY: u8 = b'Q';
pub const MSG_TERMINATE: u8 = b'X';

// Backend (backend -> gateway) message types
pub const MSG_AUTHENTICATION: u8 = b'R';
pub const MSG_PARAMETER_STATUS: u8 = b'S';
pub const MSG_BACKEND_KEY_DATA: u8 = b'K';
pub const MSG_READY_FOR_QUERY: u8 = b'Z';
pub const MSG_ROW_DESCRIPTION: u8 = b'T';
pub const MSG_DATA_ROW: u8 = b'D';
pub const MSG_COMMAND_COMPLETE: u8 = b'C';
pub const MSG_EMPTY_QUERY_RESPONSE: u8 = b'I';
pub const MSG_ERROR_RESPONSE: u8 = b'E';
pub const MSG_NOTICE_RESPONSE: u8 = b'N';

// Authentication request codes carried in 'R' messages
pub const AUTH_OK: i32 = 0;
pub const AUTH_CLEARTEXT_PASSWORD: i32 = 3;
pub const AUTH_MD5_PASSWORD: i32 = 5;

/// Transaction status: Idle (not in a transaction)
pub const TRANSACTION_STATUS_IDLE: u8 = b'I';

/// Transaction status: In a transaction block
#[allow(dead_code)]
pub const TRANSACTION_STATUS_IN_TRANSACTION: u8 = b'T';

/// Transaction status: In a failed transaction block
#[allow(dead_code)]
pub const TRANSACTION_STATUS_FAILED: u8 = b'E';

/// Startup keys owned by the connection itself, never taken from settings
pub const RESERVED_STARTUP_KEYS: &[&str] = &["user", "database", "replication"];
