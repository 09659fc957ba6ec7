//! Transport messages for the remote-procedure boundary
//!
//! Hand-written prost messages for the schema below. They are only used for
//! serialization; the rest of the code works with [`crate::sqltypes`] and
//! [`crate::diagnostic`] and converts through [`crate::transport`].
//!
//! ```proto
//! message PgDiagnostic {
//!   int32 message_type = 1;
//!   string severity = 2;
//!   string code = 3;
//!   string message = 4;
//!   optional string detail = 5;
//!   optional string hint = 6;
//!   optional int32 position = 7;
//!   optional int32 internal_position = 8;
//!   optional string internal_query = 9;
//!   optional string where = 10;
//!   optional string schema_name = 11;
//!   optional string table_name = 12;
//!   optional string column_name = 13;
//!   optional string data_type_name = 14;
//!   optional string constraint_name = 15;
//! }
//!
//! // lengths[i] == -1 means NULL, 0 means empty, > 0 is the byte count
//! // taken from `values` at the running offset.
//! message Row {
//!   repeated sint64 lengths = 1;
//!   bytes values = 2;
//! }
//! ```

/// A PostgreSQL error or notice
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PgDiagnostic {
    /// 'E' (69) or 'N' (78)
    #[prost(int32, tag = "1")]
    pub message_type: i32,
    #[prost(string, tag = "2")]
    pub severity: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub code: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub message: ::prost::alloc::string::String,
    #[prost(string, optional, tag = "5")]
    pub detail: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "6")]
    pub hint: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(int32, optional, tag = "7")]
    pub position: ::core::option::Option<i32>,
    #[prost(int32, optional, tag = "8")]
    pub internal_position: ::core::option::Option<i32>,
    #[prost(string, optional, tag = "9")]
    pub internal_query: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "10")]
    pub r#where: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "11")]
    pub schema_name: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "12")]
    pub table_name: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "13")]
    pub column_name: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "14")]
    pub data_type_name: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "15")]
    pub constraint_name: ::core::option::Option<::prost::alloc::string::String>,
}

/// Column descriptor from a RowDescription
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Field {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(uint32, tag = "2")]
    pub table_oid: u32,
    #[prost(int32, tag = "3")]
    pub column_attr: i32,
    #[prost(uint32, tag = "4")]
    pub type_oid: u32,
    #[prost(int32, tag = "5")]
    pub type_size: i32,
    #[prost(int32, tag = "6")]
    pub type_modifier: i32,
    #[prost(int32, tag = "7")]
    pub format: i32,
}

/// A row as lengths plus concatenated values
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Row {
    #[prost(sint64, repeated, tag = "1")]
    pub lengths: ::prost::alloc::vec::Vec<i64>,
    #[prost(bytes = "bytes", tag = "2")]
    pub values: ::prost::bytes::Bytes,
}

/// A complete statement result
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryResult {
    #[prost(message, repeated, tag = "1")]
    pub fields: ::prost::alloc::vec::Vec<Field>,
    #[prost(uint64, tag = "2")]
    pub rows_affected: u64,
    #[prost(message, repeated, tag = "3")]
    pub rows: ::prost::alloc::vec::Vec<Row>,
    #[prost(string, tag = "4")]
    pub command_tag: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "5")]
    pub notices: ::prost::alloc::vec::Vec<PgDiagnostic>,
}

/// Error payload carried in gRPC status details
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcError {
    #[prost(string, tag = "1")]
    pub code: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "3")]
    pub pg_diagnostic: ::core::option::Option<PgDiagnostic>,
}
