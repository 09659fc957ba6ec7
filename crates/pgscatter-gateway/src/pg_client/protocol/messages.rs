//! PostgreSQL wire protocol messages
//!
//! Frontend messages the gateway sends to a backend, backend messages it
//! receives, and the field readers shared by every parser. All readers
//! check lengths first and report truncation as a malformed message.

use super::constants::*;
use super::diagnostic::parse_diagnostic;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use pgscatter_common::diagnostic::MessageKind;
use pgscatter_common::{Diagnostic, Field, GatewayError, Result, Row, Value};

/// Messages sent by the gateway to a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendMessage {
    /// StartupMessage (no type byte); parameters are sent in order
    Startup { params: Vec<(String, String)> },
    /// 'Q' - Simple query
    Query(String),
    /// 'X' - Terminate
    Terminate,
}

impl FrontendMessage {
    /// Append the framed message to `dst`
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            FrontendMessage::Startup { params } => {
                let start = dst.len();
                dst.put_i32(0); // length placeholder
                dst.put_i32(PROTOCOL_VERSION_3_0);
                for (name, value) in params {
                    put_cstring(dst, name);
                    put_cstring(dst, value);
                }
                dst.put_u8(0);
                let len = (dst.len() - start) as i32;
                dst[start..start + 4].copy_from_slice(&len.to_be_bytes());
            }
            FrontendMessage::Query(sql) => {
                dst.put_u8(MSG_QUERY);
                dst.put_i32((4 + sql.len() + 1) as i32);
                put_cstring(dst, sql);
            }
            FrontendMessage::Terminate => {
                dst.put_u8(MSG_TERMINATE);
                dst.put_i32(4);
            }
        }
    }
}

/// Messages received from a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMessage {
    /// 'R' - Authentication request; the body is left for the negotiator
    Authentication(Bytes),
    /// 'S' - Parameter status
    ParameterStatus { name: String, value: String },
    /// 'K' - Backend key data for cancel requests
    BackendKeyData { process_id: i32, secret_key: i32 },
    /// 'Z' - Ready for query
    ReadyForQuery { status: u8 },
    /// 'T' - Row description
    RowDescription(Vec<Field>),
    /// 'D' - Data row
    DataRow(Row),
    /// 'C' - Command complete
    CommandComplete(String),
    /// 'I' - Empty query response
    EmptyQueryResponse,
    /// 'E' - Error response
    ErrorResponse(Diagnostic),
    /// 'N' - Notice response
    NoticeResponse(Diagnostic),
}

impl BackendMessage {
    /// Parse the body of a frame with the given type byte
    pub fn parse(tag: u8, mut body: Bytes) -> Result<Self> {
        let msg = match tag {
            MSG_AUTHENTICATION => return Ok(BackendMessage::Authentication(body)),
            MSG_PARAMETER_STATUS => {
                let (name, value) = parse_parameter_status(&mut body)?;
                BackendMessage::ParameterStatus { name, value }
            }
            MSG_BACKEND_KEY_DATA => BackendMessage::BackendKeyData {
                process_id: get_i32(&mut body, "backend key data")?,
                secret_key: get_i32(&mut body, "backend key data")?,
            },
            MSG_READY_FOR_QUERY => {
                if !body.has_remaining() {
                    return Err(GatewayError::malformed("ready for query message too short"));
                }
                BackendMessage::ReadyForQuery {
                    status: body.get_u8(),
                }
            }
            MSG_ROW_DESCRIPTION => BackendMessage::RowDescription(parse_row_description(&mut body)?),
            MSG_DATA_ROW => BackendMessage::DataRow(parse_data_row(&mut body)?),
            MSG_COMMAND_COMPLETE => BackendMessage::CommandComplete(get_cstring(&mut body)?),
            MSG_EMPTY_QUERY_RESPONSE => BackendMessage::EmptyQueryResponse,
            MSG_ERROR_RESPONSE => {
                return Ok(BackendMessage::ErrorResponse(parse_diagnostic(MessageKind::Error, body)?))
            }
            MSG_NOTICE_RESPONSE => {
                return Ok(BackendMessage::NoticeResponse(parse_diagnostic(MessageKind::Notice, body)?))
            }
            other => {
                return Err(GatewayError::protocol(format!(
                    "unexpected message type '{}' (0x{:02x}) from backend",
                    char::from(other),
                    other
                )))
            }
        };
        Ok(msg)
    }
}

/// Parse a ParameterStatus body: name\0value\0
pub fn parse_parameter_status(body: &mut Bytes) -> Result<(String, String)> {
    let name = get_cstring(body)?;
    let value = get_cstring(body)?;
    Ok((name, value))
}

fn parse_row_description(body: &mut Bytes) -> Result<Vec<Field>> {
    let count = get_i16(body, "row description")?;
    if count < 0 {
        return Err(GatewayError::malformed(format!(
            "row description has negative field count {}",
            count
        )));
    }
    let mut fields = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = get_cstring(body)?;
        if body.remaining() < 18 {
            return Err(GatewayError::malformed(format!(
                "row description too short for field '{}'",
                name
            )));
        }
        fields.push(Field {
            name,
            table_oid: body.get_u32(),
            column_attr: body.get_i16(),
            type_oid: body.get_u32(),
            type_size: body.get_i16(),
            type_modifier: body.get_i32(),
            format: body.get_i16(),
        });
    }
    Ok(fields)
}

fn parse_data_row(body: &mut Bytes) -> Result<Row> {
    let count = get_i16(body, "data row")?;
    if count < 0 {
        return Err(GatewayError::malformed(format!(
            "data row has negative column count {}",
            count
        )));
    }
    let mut values = Vec::with_capacity(count as usize);
    for i in 0..count {
        let len = get_i32(body, "data row")?;
        if len < 0 {
            values.push(Value::null());
            continue;
        }
        let len = len as usize;
        if body.remaining() < len {
            return Err(GatewayError::malformed(format!(
                "data row column {} declares {} bytes but only {} remain",
                i,
                len,
                body.remaining()
            )));
        }
        values.push(Value::from_bytes(body.split_to(len)));
    }
    Ok(Row::new(values))
}

/// Read a null-terminated string.
pub fn get_cstring(src: &mut Bytes) -> Result<String> {
    let Some(null_pos) = src.iter().position(|&b| b == 0) else {
        return Err(GatewayError::malformed("string is missing its null terminator"));
    };
    let bytes = src.split_to(null_pos);
    src.advance(1);
    String::from_utf8(bytes.to_vec())
        .map_err(|e| GatewayError::malformed(format!("invalid UTF-8 in string: {}", e)))
}

/// Read a big-endian i32, naming `what` on truncation
pub fn get_i32(src: &mut Bytes, what: &str) -> Result<i32> {
    if src.remaining() < 4 {
        return Err(GatewayError::malformed(format!("{} message too short", what)));
    }
    Ok(src.get_i32())
}

/// Read a big-endian i16, naming `what` on truncation
pub fn get_i16(src: &mut Bytes, what: &str) -> Result<i16> {
    if src.remaining() < 2 {
        return Err(GatewayError::malformed(format!("{} message too short", what)));
    }
    Ok(src.get_i16())
}

/// Write a null-terminated string.
pub fn put_cstring(dst: &mut BytesMut, s: &str) {
    dst.put_slice(s.as_bytes());
    dst.put_u8(0);
}
