//! Error types for the pgscatter gateway

use crate::diagnostic::{sqlstate, Diagnostic};
use crate::proto;
use prost::Message;
use tonic::Status;

/// Result type alias using GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the gateway
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Error or fatal notice reported by PostgreSQL. Displays exactly like
    /// the diagnostic so user-visible text is unchanged.
    #[error("{0}")]
    Pg(#[from] Diagnostic),

    /// Truncated or inconsistent protocol data
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Backend requested an authentication method the gateway refuses
    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    /// Unexpected message for the current protocol state
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The connection was closed or is no longer usable
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level failure that carries no diagnostic
    #[error("transport error: {0}")]
    Transport(String),

    /// I/O error on the backend stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        GatewayError::MalformedMessage(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        GatewayError::Protocol(msg.into())
    }

    /// The PostgreSQL diagnostic, if this error is one
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            GatewayError::Pg(diag) => Some(diag),
            _ => None,
        }
    }

    /// Whether the backend connection that produced this error must be
    /// discarded
    pub fn is_connection_fatal(&self) -> bool {
        match self {
            GatewayError::Pg(diag) => diag.is_fatal(),
            GatewayError::MalformedMessage(_)
            | GatewayError::AuthRejected(_)
            | GatewayError::Protocol(_)
            | GatewayError::ConnectionClosed(_)
            | GatewayError::Io(_) => true,
            GatewayError::Config(_) | GatewayError::Transport(_) => false,
        }
    }

    /// SQLSTATE to report to the client for this error
    pub fn sqlstate(&self) -> &str {
        match self {
            GatewayError::Pg(diag) => &diag.code,
            GatewayError::MalformedMessage(_) | GatewayError::Protocol(_) => {
                sqlstate::PROTOCOL_VIOLATION
            }
            GatewayError::AuthRejected(_) => sqlstate::INVALID_AUTHORIZATION,
            GatewayError::ConnectionClosed(_) | GatewayError::Io(_) => {
                sqlstate::CONNECTION_FAILURE
            }
            GatewayError::Config(_) | GatewayError::Transport(_) => sqlstate::INTERNAL_ERROR,
        }
    }

    /// The diagnostic to relay to the client: the backend's own for `Pg`,
    /// otherwise an ERROR built from this error's text.
    pub fn to_client_diagnostic(&self) -> Diagnostic {
        match self {
            GatewayError::Pg(diag) => diag.clone(),
            other => Diagnostic::error(other.sqlstate(), other.to_string()),
        }
    }

    /// Get the transport code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Pg(_) => "UNKNOWN",
            GatewayError::MalformedMessage(_) => "INVALID_ARGUMENT",
            GatewayError::AuthRejected(_) => "UNAUTHENTICATED",
            GatewayError::Protocol(_) => "INTERNAL",
            GatewayError::ConnectionClosed(_) => "UNAVAILABLE",
            GatewayError::Config(_) => "FAILED_PRECONDITION",
            GatewayError::Transport(_) => "UNAVAILABLE",
            GatewayError::Io(_) => "UNAVAILABLE",
        }
    }
}

/// Find a [`Diagnostic`] anywhere in an error's source chain.
///
/// Works through `GatewayError::Pg`, `anyhow` contexts, and any other
/// wrapper that reports its cause via `source()`.
pub fn find_diagnostic<'a>(
    err: &'a (dyn std::error::Error + 'static),
) -> Option<&'a Diagnostic> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(diag) = e.downcast_ref::<Diagnostic>() {
            return Some(diag);
        }
        if let Some(GatewayError::Pg(diag)) = e.downcast_ref::<GatewayError>() {
            return Some(diag);
        }
        current = e.source();
    }
    None
}

/// Convert GatewayError to gRPC Status for transport responses.
///
/// The full diagnostic travels in the status details as an encoded
/// [`proto::RpcError`], so the receiving side can rebuild it field for field.
impl From<GatewayError> for Status {
    fn from(err: GatewayError) -> Self {
        let code = match &err {
            // SQLSTATE carries the categorization for PostgreSQL errors
            GatewayError::Pg(_) => tonic::Code::Unknown,
            GatewayError::MalformedMessage(_) => tonic::Code::InvalidArgument,
            GatewayError::AuthRejected(_) => tonic::Code::Unauthenticated,
            GatewayError::Protocol(_) => tonic::Code::Internal,
            GatewayError::ConnectionClosed(_) => tonic::Code::Unavailable,
            GatewayError::Config(_) => tonic::Code::FailedPrecondition,
            GatewayError::Transport(_) => tonic::Code::Unavailable,
            GatewayError::Io(_) => tonic::Code::Unavailable,
        };

        let rpc_error = proto::RpcError {
            code: err.code().to_string(),
            message: err.to_string(),
            pg_diagnostic: err.diagnostic().map(proto::PgDiagnostic::from),
        };

        Status::with_details(code, err.to_string(), rpc_error.encode_to_vec().into())
    }
}

/// Rebuild a GatewayError from a gRPC Status.
///
/// A status carrying a diagnostic becomes `GatewayError::Pg` again; anything
/// else becomes `GatewayError::Transport` with the status message.
impl From<Status> for GatewayError {
    fn from(status: Status) -> Self {
        if !status.details().is_empty() {
            if let Ok(rpc_error) = proto::RpcError::decode(status.details()) {
                if let Some(pd) = rpc_error.pg_diagnostic {
                    return GatewayError::Pg(Diagnostic::from(pd));
                }
                return GatewayError::Transport(rpc_error.message);
            }
        }
        GatewayError::Transport(format!("{}: {}", status.code(), status.message()))
    }
}

// Implement conversions from common error types
impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Config(err.to_string())
    }
}
