//! ErrorResponse / NoticeResponse field encoding
//!
//! Both messages are a sequence of (field code byte, cstring) pairs ended by
//! a zero byte. Parsing keeps all 14 fields the gateway models and skips
//! codes it does not know (F, L, R, ...). The writer only exists for the
//! scripted backends in tests.

use super::messages::get_cstring;
#[cfg(test)]
use super::messages::put_cstring;
use bytes::{Buf, Bytes};
#[cfg(test)]
use bytes::{BufMut, BytesMut};
use pgscatter_common::diagnostic::MessageKind;
use pgscatter_common::{Diagnostic, GatewayError, Result};

const FIELD_SEVERITY: u8 = b'S';
const FIELD_SEVERITY_NONLOCALIZED: u8 = b'V';
const FIELD_CODE: u8 = b'C';
const FIELD_MESSAGE: u8 = b'M';
const FIELD_DETAIL: u8 = b'D';
const FIELD_HINT: u8 = b'H';
const FIELD_POSITION: u8 = b'P';
const FIELD_INTERNAL_POSITION: u8 = b'p';
const FIELD_INTERNAL_QUERY: u8 = b'q';
const FIELD_WHERE: u8 = b'W';
const FIELD_SCHEMA: u8 = b's';
const FIELD_TABLE: u8 = b't';
const FIELD_COLUMN: u8 = b'c';
const FIELD_DATA_TYPE: u8 = b'd';
const FIELD_CONSTRAINT: u8 = b'n';

/// Parse an ErrorResponse or NoticeResponse body
pub fn parse_diagnostic(kind: MessageKind, mut body: Bytes) -> Result<Diagnostic> {
    let mut diag = Diagnostic {
        message_type: kind.as_byte(),
        ..Default::default()
    };
    let mut nonlocalized_severity = None;

    loop {
        if !body.has_remaining() {
            return Err(GatewayError::malformed("diagnostic message is missing its terminator"));
        }
        let code = body.get_u8();
        if code == 0 {
            break;
        }
        let value = get_cstring(&mut body)?;
        match code {
            FIELD_SEVERITY => diag.severity = value,
            FIELD_SEVERITY_NONLOCALIZED => nonlocalized_severity = Some(value),
            FIELD_CODE => diag.code = value,
            FIELD_MESSAGE => diag.message = value,
            FIELD_DETAIL => diag.detail = Some(value),
            FIELD_HINT => diag.hint = Some(value),
            FIELD_POSITION => diag.position = Some(parse_position(&value)?),
            FIELD_INTERNAL_POSITION => diag.internal_position = Some(parse_position(&value)?),
            FIELD_INTERNAL_QUERY => diag.internal_query = Some(value),
            FIELD_WHERE => diag.r#where = Some(value),
            FIELD_SCHEMA => diag.schema = Some(value),
            FIELD_TABLE => diag.table = Some(value),
            FIELD_COLUMN => diag.column = Some(value),
            FIELD_DATA_TYPE => diag.data_type = Some(value),
            FIELD_CONSTRAINT => diag.constraint = Some(value),
            // File, line, routine and future additions
            _ => {}
        }
    }

    if diag.severity.is_empty() {
        if let Some(severity) = nonlocalized_severity {
            diag.severity = severity;
        }
    }
    Ok(diag)
}

fn parse_position(value: &str) -> Result<i32> {
    value
        .parse()
        .map_err(|_| GatewayError::malformed(format!("invalid position '{}' in diagnostic", value)))
}

/// Append a framed ErrorResponse/NoticeResponse for `diag` to `dst`.
///
/// The type byte follows the diagnostic's kind; an invalid kind is sent as
/// an ErrorResponse.
#[cfg(test)]
pub(crate) fn write_diagnostic(diag: &Diagnostic, dst: &mut BytesMut) {
    let tag = diag.kind().unwrap_or(MessageKind::Error).as_byte();
    let start = dst.len();
    dst.put_u8(tag);
    dst.put_i32(0); // length placeholder

    put_field(dst, FIELD_SEVERITY, &diag.severity);
    put_field(dst, FIELD_SEVERITY_NONLOCALIZED, &diag.severity);
    put_field(dst, FIELD_CODE, &diag.code);
    put_field(dst, FIELD_MESSAGE, &diag.message);
    put_opt_field(dst, FIELD_DETAIL, diag.detail.as_deref());
    put_opt_field(dst, FIELD_HINT, diag.hint.as_deref());
    if let Some(p) = diag.position {
        put_field(dst, FIELD_POSITION, &p.to_string());
    }
    if let Some(p) = diag.internal_position {
        put_field(dst, FIELD_INTERNAL_POSITION, &p.to_string());
    }
    put_opt_field(dst, FIELD_INTERNAL_QUERY, diag.internal_query.as_deref());
    put_opt_field(dst, FIELD_WHERE, diag.r#where.as_deref());
    put_opt_field(dst, FIELD_SCHEMA, diag.schema.as_deref());
    put_opt_field(dst, FIELD_TABLE, diag.table.as_deref());
    put_opt_field(dst, FIELD_COLUMN, diag.column.as_deref());
    put_opt_field(dst, FIELD_DATA_TYPE, diag.data_type.as_deref());
    put_opt_field(dst, FIELD_CONSTRAINT, diag.constraint.as_deref());
    dst.put_u8(0);

    let len = (dst.len() - start - 1) as i32;
    dst[start + 1..start + 5].copy_from_slice(&len.to_be_bytes());
}

#[cfg(test)]
fn put_field(dst: &mut BytesMut, code: u8, value: &str) {
    dst.put_u8(code);
    put_cstring(dst, value);
}

#[cfg(test)]
fn put_opt_field(dst: &mut BytesMut, code: u8, value: Option<&str>) {
    if let Some(value) = value {
        put_field(dst, code, value);
    }
}
