//! Backend authentication negotiation
//!
//! The gateway only accepts backends that trust it (AuthenticationOk).
//! Password methods are refused in [`password_policy`]; the negotiator reads
//! the method code and nothing else, so a password prompt's salt or any
//! other payload is never consumed or forwarded.

use super::protocol::constants::{AUTH_CLEARTEXT_PASSWORD, AUTH_MD5_PASSWORD, AUTH_OK};
use bytes::{Buf, Bytes};
use pgscatter_common::{GatewayError, Result};
use tracing::{debug, warn};

/// Why a negotiation ended in rejection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The request could not be interpreted
    Malformed(String),
    /// The backend asked for a method the gateway refuses
    Refused(String),
}

impl Rejection {
    fn to_error(&self) -> GatewayError {
        match self {
            Rejection::Malformed(msg) => GatewayError::malformed(msg.clone()),
            Rejection::Refused(msg) => GatewayError::AuthRejected(msg.clone()),
        }
    }
}

/// Negotiation state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    AwaitingAuthRequest,
    Authenticated,
    /// Terminal; the connection cannot be reused
    Rejected(Rejection),
}

/// Outcome of the password-method check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordDecision {
    /// Not a password method; interpretation continues
    NotPassword,
    /// A password method the gateway refuses to answer
    Refuse(&'static str),
}

/// Decide what to do with a password-based authentication method.
///
/// Cleartext and MD5 are both refused.
pub fn password_policy(method: i32) -> PasswordDecision {
    match method {
        AUTH_CLEARTEXT_PASSWORD => PasswordDecision::Refuse(
            "cleartext password authentication is not supported by the gateway for security reasons",
        ),
        AUTH_MD5_PASSWORD => PasswordDecision::Refuse(
            "MD5 password authentication is not supported by the gateway for security reasons",
        ),
        _ => PasswordDecision::NotPassword,
    }
}

/// Drives the authentication exchange for one backend connection
#[derive(Debug)]
pub struct AuthNegotiator {
    state: AuthState,
}

impl Default for AuthNegotiator {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthNegotiator {
    pub fn new() -> Self {
        Self {
            state: AuthState::AwaitingAuthRequest,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    /// Handle the body of an Authentication ('R') message.
    ///
    /// Consumes only the 4-byte method code; whatever follows it stays in
    /// `body`.
    pub fn handle_auth_request(&mut self, body: &mut Bytes) -> Result<()> {
        match &self.state {
            AuthState::AwaitingAuthRequest => {}
            AuthState::Rejected(rejection) => return Err(rejection.to_error()),
            AuthState::Authenticated => {
                return Err(GatewayError::protocol(
                    "authentication request received after authentication completed",
                ))
            }
        }

        if body.remaining() < 4 {
            return Err(self.reject(Rejection::Malformed(format!(
                "authentication request too short: {} bytes",
                body.remaining()
            ))));
        }
        let method = body.get_i32();

        if method == AUTH_OK {
            debug!("backend authentication succeeded");
            self.state = AuthState::Authenticated;
            return Ok(());
        }

        let message = match password_policy(method) {
            PasswordDecision::Refuse(msg) => msg.to_string(),
            PasswordDecision::NotPassword => format!("unsupported authentication method: {}", method),
        };
        warn!(method, "refusing backend authentication request");
        Err(self.reject(Rejection::Refused(message)))
    }

    fn reject(&mut self, rejection: Rejection) -> GatewayError {
        let err = rejection.to_error();
        self.state = AuthState::Rejected(rejection);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};

    fn request(method: i32, extra: &[u8]) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_i32(method);
        buf.put_slice(extra);
        buf.freeze()
    }

    #[test]
    fn test_auth_ok() {
        let mut auth = AuthNegotiator::new();
        let mut body = request(AUTH_OK, &[]);
        auth.handle_auth_request(&mut body).unwrap();
        assert!(auth.is_authenticated());
        assert!(body.is_empty());
    }

    #[test]
    fn test_rejects_cleartext_password() {
        let mut auth = AuthNegotiator::new();
        let mut body = request(AUTH_CLEARTEXT_PASSWORD, &[]);
        let err = auth.handle_auth_request(&mut body).unwrap_err();

        let msg = err.to_string();
        assert!(matches!(err, GatewayError::AuthRejected(_)));
        assert!(msg.contains("cleartext password authentication"));
        assert!(msg.contains("not supported"));
        assert!(msg.contains("security"));
        assert!(matches!(auth.state(), AuthState::Rejected(_)));
    }

    #[test]
    fn test_rejects_md5_without_reading_salt() {
        let mut auth = AuthNegotiator::new();
        let mut body = request(AUTH_MD5_PASSWORD, &[0x01, 0x02, 0x03, 0x04]);
        let err = auth.handle_auth_request(&mut body).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("MD5 password authentication"));
        assert!(msg.contains("not supported"));
        assert!(msg.contains("security"));
        assert_eq!(&body[..], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_rejects_unsupported_method() {
        let mut auth = AuthNegotiator::new();
        let err = auth.handle_auth_request(&mut request(99, &[])).unwrap_err();
        assert!(err.to_string().contains("unsupported authentication method: 99"));
    }

    #[test]
    fn test_request_too_short() {
        let mut auth = AuthNegotiator::new();
        let mut body = Bytes::from_static(&[0x00, 0x00]);
        let err = auth.handle_auth_request(&mut body).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedMessage(_)));
        assert!(err.to_string().contains("too short"));
        assert!(matches!(auth.state(), AuthState::Rejected(Rejection::Malformed(_))));
    }

    #[test]
    fn test_rejection_is_terminal() {
        let mut auth = AuthNegotiator::new();
        let first = auth
            .handle_auth_request(&mut request(AUTH_MD5_PASSWORD, &[0; 4]))
            .unwrap_err()
            .to_string();

        // Even an OK afterwards cannot revive the negotiator
        let second = auth.handle_auth_request(&mut request(AUTH_OK, &[])).unwrap_err();
        assert_eq!(second.to_string(), first);
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn test_password_policy() {
        assert!(matches!(password_policy(AUTH_CLEARTEXT_PASSWORD), PasswordDecision::Refuse(_)));
        assert!(matches!(password_policy(AUTH_MD5_PASSWORD), PasswordDecision::Refuse(_)));
        assert_eq!(password_policy(10), PasswordDecision::NotPassword);
    }
}
