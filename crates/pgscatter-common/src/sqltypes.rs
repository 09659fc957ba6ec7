//! Query result types that keep NULL and empty values apart
//!
//! - [`Value`]: a nullable column value (`None` = NULL, `Some(b"")` = empty)
//! - [`Row`]: the values of one data row
//! - [`QueryResult`]: fields, rows, command tag, and notices of one statement
//!
//! [`encode_row`] / [`decode_row`] implement the flat lengths-plus-bytes
//! layout used on the transport: a length of -1 is NULL, 0 is an empty
//! value, and anything larger consumes that many bytes at the running
//! offset.

use crate::diagnostic::Diagnostic;
use crate::error::{GatewayError, Result};
use bytes::{Bytes, BytesMut};

/// Length sentinel for a NULL value
pub const NULL_LENGTH: i64 = -1;

/// A nullable column value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Value(Option<Bytes>);

impl Value {
    pub fn null() -> Self {
        Value(None)
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Value(Some(bytes.into()))
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.0.as_deref()
    }

    /// Text form of the value; `None` for NULL
    pub fn as_str(&self) -> Option<std::borrow::Cow<'_, str>> {
        self.0.as_deref().map(String::from_utf8_lossy)
    }
}

impl From<Option<Vec<u8>>> for Value {
    fn from(v: Option<Vec<u8>>) -> Self {
        Value(v.map(Bytes::from))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value(Some(Bytes::copy_from_slice(s.as_bytes())))
    }
}

/// One data row
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Build a row from raw column data; `None` entries are NULL
    pub fn from_values(values: Vec<Option<Vec<u8>>>) -> Self {
        Self {
            values: values.into_iter().map(Value::from).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }
}

/// Column descriptor as sent in a RowDescription
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Field {
    pub name: String,
    pub table_oid: u32,
    pub column_attr: i16,
    pub type_oid: u32,
    pub type_size: i16,
    pub type_modifier: i32,
    /// 0 = text, 1 = binary
    pub format: i16,
}

/// Result of one statement
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryResult {
    pub fields: Vec<Field>,
    /// Rows affected, taken from the command tag
    pub rows_affected: u64,
    pub rows: Vec<Row>,
    /// e.g. "SELECT 42", "INSERT 0 5", "UPDATE 10"
    pub command_tag: String,
    /// Notices received while the statement ran, in arrival order
    pub notices: Vec<Diagnostic>,
}

impl QueryResult {
    /// Record the CommandComplete tag and the row count it carries
    pub fn set_command_tag(&mut self, tag: impl Into<String>) {
        self.command_tag = tag.into();
        self.rows_affected = rows_affected_from_tag(&self.command_tag);
    }
}

/// Extract the affected-row count from a command tag.
///
/// `INSERT oid rows` and `<VERB> rows` forms are understood; tags without a
/// count (e.g. "SET", "BEGIN") yield 0.
pub fn rows_affected_from_tag(tag: &str) -> u64 {
    let mut parts = tag.split_whitespace();
    let verb = parts.next().unwrap_or("");
    match verb {
        "INSERT" | "UPDATE" | "DELETE" | "SELECT" | "MERGE" | "MOVE" | "FETCH" | "COPY" => {
            parts.last().and_then(|n| n.parse().ok()).unwrap_or(0)
        }
        _ => 0,
    }
}

/// Encode a row into (lengths, concatenated bytes)
pub fn encode_row(row: &Row) -> (Vec<i64>, Bytes) {
    let total: usize = row.values.iter().filter_map(|v| v.as_bytes()).map(<[u8]>::len).sum();
    let mut lengths = Vec::with_capacity(row.values.len());
    let mut data = BytesMut::with_capacity(total);
    for value in &row.values {
        match value.as_bytes() {
            None => lengths.push(NULL_LENGTH),
            Some(bytes) => {
                lengths.push(bytes.len() as i64);
                data.extend_from_slice(bytes);
            }
        }
    }
    (lengths, data.freeze())
}

/// Decode (lengths, concatenated bytes) back into a row.
///
/// Fails with [`GatewayError::MalformedMessage`] if a length is below -1,
/// if the declared lengths run past the available bytes, or if bytes are
/// left over.
pub fn decode_row(lengths: &[i64], data: &Bytes) -> Result<Row> {
    let mut values = Vec::with_capacity(lengths.len());
    let mut offset = 0usize;
    for (i, &len) in lengths.iter().enumerate() {
        match len {
            NULL_LENGTH => values.push(Value::null()),
            0 => values.push(Value::from_bytes(Bytes::new())),
            n if n > 0 => {
                let n = n as usize;
                let end = offset.checked_add(n).filter(|&end| end <= data.len()).ok_or_else(|| {
                    GatewayError::malformed(format!(
                        "row value {} declares {} bytes at offset {} but only {} available",
                        i,
                        n,
                        offset,
                        data.len().saturating_sub(offset)
                    ))
                })?;
                values.push(Value::from_bytes(data.slice(offset..end)));
                offset = end;
            }
            n => {
                return Err(GatewayError::malformed(format!(
                    "row value {} has invalid length {}",
                    i, n
                )))
            }
        }
    }
    if offset != data.len() {
        return Err(GatewayError::malformed(format!(
            "row has {} trailing bytes",
            data.len() - offset
        )));
    }
    Ok(Row { values })
}
