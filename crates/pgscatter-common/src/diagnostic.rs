//! PostgreSQL diagnostics (errors and notices)
//!
//! PostgreSQL uses the same wire layout for ErrorResponse ('E') and
//! NoticeResponse ('N'), so a single [`Diagnostic`] type carries both. It is
//! the canonical error representation across the gateway: parsed from the
//! backend wire, carried internally inside [`crate::GatewayError::Pg`],
//! serialized over the transport, and written back to the client unchanged.
//!
//! ## Message type vs severity
//!
//! - The message type is the protocol byte ('E' or 'N') and decides whether
//!   the message is handled as an error or as a notice.
//! - The severity is the text of the 'S' field: "ERROR", "FATAL", "PANIC"
//!   for errors and "WARNING", "NOTICE", "DEBUG", "INFO", "LOG" for notices.
//!
//! The two are orthogonal; [`is_fatal_severity`] only looks at the severity.
//!
//! ## Protocol fields
//!
//! ```text
//! Field             Code  Description
//! Severity          S     ERROR, FATAL, PANIC, WARNING, ...
//! Code              C     SQLSTATE (e.g. "42P01")
//! Message           M     Primary human-readable message
//! Detail            D     Optional secondary message
//! Hint              H     Optional suggestion
//! Position          P     Cursor position in the original query
//! InternalPosition  p     Position in the internal query
//! InternalQuery     q     Text of the internal query
//! Where             W     Call stack context
//! Schema            s     Schema name
//! Table             t     Table name
//! Column            c     Column name
//! DataType          d     Data type name
//! Constraint        n     Constraint name
//! ```

use std::fmt;

/// PostgreSQL SQLSTATE codes used by the gateway itself.
/// See: https://www.postgresql.org/docs/current/errcodes-appendix.html
pub mod sqlstate {
    // Class 00: Successful Completion
    pub const SUCCESSFUL_COMPLETION: &str = "00000";

    // Class 01: Warning
    pub const WARNING: &str = "01000";

    // Class 08: Connection Exception
    pub const CONNECTION_EXCEPTION: &str = "08000";
    pub const CONNECTION_FAILURE: &str = "08006";
    pub const PROTOCOL_VIOLATION: &str = "08P01";

    // Class 28: Invalid Authorization Specification
    pub const INVALID_AUTHORIZATION: &str = "28000";

    // Class 42: Syntax Error or Access Rule Violation
    pub const UNDEFINED_TABLE: &str = "42P01";

    // Class 57: Operator Intervention
    pub const ADMIN_SHUTDOWN: &str = "57P01";

    // Class XX: Internal Error
    pub const INTERNAL_ERROR: &str = "XX000";
}

/// Protocol byte for ErrorResponse
pub const MESSAGE_TYPE_ERROR: u8 = b'E';

/// Protocol byte for NoticeResponse
pub const MESSAGE_TYPE_NOTICE: u8 = b'N';

/// Whether a diagnostic is an error or a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Error,
    Notice,
}

impl MessageKind {
    /// The protocol message type byte
    pub fn as_byte(self) -> u8 {
        match self {
            MessageKind::Error => MESSAGE_TYPE_ERROR,
            MessageKind::Notice => MESSAGE_TYPE_NOTICE,
        }
    }

    /// Map a protocol byte back to a kind; `None` for anything else
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            MESSAGE_TYPE_ERROR => Some(MessageKind::Error),
            MESSAGE_TYPE_NOTICE => Some(MessageKind::Notice),
            _ => None,
        }
    }
}

/// A PostgreSQL error or notice with all 14 diagnostic fields.
///
/// `Diagnostic` is a leaf error: it never reports an underlying cause, so it
/// can be wrapped by any amount of context and still be found with
/// [`crate::find_diagnostic`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diagnostic {
    /// Raw protocol message type byte ('E' or 'N' when valid)
    pub message_type: u8,
    pub severity: String,
    pub code: String,
    pub message: String,
    pub detail: Option<String>,
    pub hint: Option<String>,
    pub position: Option<i32>,
    pub internal_position: Option<i32>,
    pub internal_query: Option<String>,
    pub r#where: Option<String>,
    pub schema: Option<String>,
    pub table: Option<String>,
    pub column: Option<String>,
    pub data_type: Option<String>,
    pub constraint: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic of the given kind with the three required fields
    pub fn new(
        kind: MessageKind,
        severity: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message_type: kind.as_byte(),
            severity: severity.into(),
            code: code.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    /// An ErrorResponse with severity ERROR
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, "ERROR", code, message)
    }

    /// A NoticeResponse with severity NOTICE
    pub fn notice(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(MessageKind::Notice, "NOTICE", code, message)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_position(mut self, position: i32) -> Self {
        self.position = Some(position);
        self
    }

    /// The message kind, if the type byte is valid
    pub fn kind(&self) -> Option<MessageKind> {
        MessageKind::from_byte(self.message_type)
    }

    pub fn is_error(&self) -> bool {
        self.message_type == MESSAGE_TYPE_ERROR
    }

    pub fn is_notice(&self) -> bool {
        self.message_type == MESSAGE_TYPE_NOTICE
    }

    /// Alias for the code field
    pub fn sqlstate(&self) -> &str {
        &self.code
    }

    /// First two characters of the SQLSTATE, or "" for short codes
    pub fn sqlstate_class(&self) -> &str {
        classify(&self.code)
    }

    pub fn is_class(&self, class: &str) -> bool {
        is_of_class(&self.code, class)
    }

    /// FATAL and PANIC terminate the backend session; ERROR does not
    pub fn is_fatal(&self) -> bool {
        is_fatal_severity(&self.severity)
    }

    /// "SEVERITY: message"
    pub fn render_short(&self) -> String {
        format!("{}: {}", self.severity, self.message)
    }

    /// "SEVERITY: message (SQLSTATE code)"
    pub fn render_full(&self) -> String {
        format!("{} (SQLSTATE {})", self.render_short(), self.code)
    }

    /// Lenient validation: lists every violated constraint.
    ///
    /// An empty result means the diagnostic is well formed. Callers usually
    /// log the issues rather than reject the message.
    pub fn validate(&self) -> Vec<DiagnosticIssue> {
        let mut issues = Vec::new();
        if self.kind().is_none() {
            issues.push(DiagnosticIssue::InvalidMessageType(self.message_type));
        }
        if self.severity.is_empty() {
            issues.push(DiagnosticIssue::EmptySeverity);
        }
        if self.code.is_empty() {
            issues.push(DiagnosticIssue::EmptyCode);
        }
        if self.message.is_empty() {
            issues.push(DiagnosticIssue::EmptyMessage);
        }
        issues
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

// No `source()`: a diagnostic terminates the error chain.
impl std::error::Error for Diagnostic {}

/// A constraint violated by a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticIssue {
    /// No diagnostic at all
    Missing,
    InvalidMessageType(u8),
    EmptySeverity,
    EmptyCode,
    EmptyMessage,
}

impl fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticIssue::Missing => write!(f, "diagnostic is missing"),
            DiagnosticIssue::InvalidMessageType(0) => {
                write!(f, "message type is unset (0x00): must be 'E' or 'N'")
            }
            DiagnosticIssue::InvalidMessageType(b) => write!(
                f,
                "invalid message type '{}' (0x{:02x}): must be 'E' or 'N'",
                char::from(*b),
                b
            ),
            DiagnosticIssue::EmptySeverity => write!(f, "severity is empty"),
            DiagnosticIssue::EmptyCode => write!(f, "code (SQLSTATE) is empty"),
            DiagnosticIssue::EmptyMessage => write!(f, "message is empty"),
        }
    }
}

/// SQLSTATE class: first two characters, "" when the code is shorter
pub fn classify(code: &str) -> &str {
    code.get(..2).unwrap_or("")
}

/// Whether `code` belongs to the two-character `class`
pub fn is_of_class(code: &str, class: &str) -> bool {
    classify(code) == class
}

/// True only for FATAL and PANIC
pub fn is_fatal_severity(severity: &str) -> bool {
    matches!(severity, "FATAL" | "PANIC")
}

/// Short rendering that also covers a missing diagnostic
pub fn render_short(diag: Option<&Diagnostic>) -> String {
    match diag {
        Some(d) => d.render_short(),
        None => "ERROR: unknown error".to_string(),
    }
}

/// Full rendering that also covers a missing diagnostic
pub fn render_full(diag: Option<&Diagnostic>) -> String {
    match diag {
        Some(d) => d.render_full(),
        None => format!("ERROR: unknown error (SQLSTATE {})", sqlstate::SUCCESSFUL_COMPLETION),
    }
}

/// Validation that also covers a missing diagnostic
pub fn validate(diag: Option<&Diagnostic>) -> Vec<DiagnosticIssue> {
    match diag {
        Some(d) => d.validate(),
        None => vec![DiagnosticIssue::Missing],
    }
}
