//! Conversions between internal types and transport messages
//!
//! Every conversion here is lossless: `from(into(x)) == x` for diagnostics,
//! fields, rows, and results. Only row decoding can fail, because a peer may
//! send lengths that do not match the payload.

use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::proto;
use crate::sqltypes::{decode_row, encode_row, Field, QueryResult, Row};

impl From<&Diagnostic> for proto::PgDiagnostic {
    fn from(d: &Diagnostic) -> Self {
        proto::PgDiagnostic {
            message_type: i32::from(d.message_type),
            severity: d.severity.clone(),
            code: d.code.clone(),
            message: d.message.clone(),
            detail: d.detail.clone(),
            hint: d.hint.clone(),
            position: d.position,
            internal_position: d.internal_position,
            internal_query: d.internal_query.clone(),
            r#where: d.r#where.clone(),
            schema_name: d.schema.clone(),
            table_name: d.table.clone(),
            column_name: d.column.clone(),
            data_type_name: d.data_type.clone(),
            constraint_name: d.constraint.clone(),
        }
    }
}

impl From<proto::PgDiagnostic> for Diagnostic {
    fn from(pd: proto::PgDiagnostic) -> Self {
        Diagnostic {
            // Out-of-range types become 0 and are reported by validate()
            message_type: u8::try_from(pd.message_type).unwrap_or(0),
            severity: pd.severity,
            code: pd.code,
            message: pd.message,
            detail: pd.detail,
            hint: pd.hint,
            position: pd.position,
            internal_position: pd.internal_position,
            internal_query: pd.internal_query,
            r#where: pd.r#where,
            schema: pd.schema_name,
            table: pd.table_name,
            column: pd.column_name,
            data_type: pd.data_type_name,
            constraint: pd.constraint_name,
        }
    }
}

impl From<&Field> for proto::Field {
    fn from(f: &Field) -> Self {
        proto::Field {
            name: f.name.clone(),
            table_oid: f.table_oid,
            column_attr: i32::from(f.column_attr),
            type_oid: f.type_oid,
            type_size: i32::from(f.type_size),
            type_modifier: f.type_modifier,
            format: i32::from(f.format),
        }
    }
}

impl From<proto::Field> for Field {
    fn from(f: proto::Field) -> Self {
        Field {
            name: f.name,
            table_oid: f.table_oid,
            column_attr: f.column_attr as i16,
            type_oid: f.type_oid,
            type_size: f.type_size as i16,
            type_modifier: f.type_modifier,
            format: f.format as i16,
        }
    }
}

impl From<&Row> for proto::Row {
    fn from(row: &Row) -> Self {
        let (lengths, values) = encode_row(row);
        proto::Row { lengths, values }
    }
}

/// Decode a transport row, failing on inconsistent lengths
pub fn row_from_proto(row: &proto::Row) -> Result<Row> {
    decode_row(&row.lengths, &row.values)
}

impl From<&QueryResult> for proto::QueryResult {
    fn from(r: &QueryResult) -> Self {
        proto::QueryResult {
            fields: r.fields.iter().map(proto::Field::from).collect(),
            rows_affected: r.rows_affected,
            rows: r.rows.iter().map(proto::Row::from).collect(),
            command_tag: r.command_tag.clone(),
            notices: r.notices.iter().map(proto::PgDiagnostic::from).collect(),
        }
    }
}

/// Decode a transport result, failing if any row is inconsistent
pub fn result_from_proto(pr: proto::QueryResult) -> Result<QueryResult> {
    let rows = pr.rows.iter().map(row_from_proto).collect::<Result<Vec<_>>>()?;
    Ok(QueryResult {
        fields: pr.fields.into_iter().map(Field::from).collect(),
        rows_affected: pr.rows_affected,
        rows,
        command_tag: pr.command_tag,
        notices: pr.notices.into_iter().map(Diagnostic::from).collect(),
    })
}
