//! A single backend connection
//!
//! Lifecycle: the StartupMessage carries the client's startup parameters,
//! the auth loop runs until AuthenticationOk (or a rejection), and the backend's
//! ParameterStatus/BackendKeyData stream is consumed up to the first
//! ReadyForQuery. After that the connection runs one simple query at a time.
//! Any I/O failure, protocol violation, or FATAL diagnostic closes it.

use super::auth::AuthNegotiator;
use super::codec::BackendCodec;
use super::config::BackendConfig;
use super::params::ParameterTracker;
use super::protocol::constants::{RESERVED_STARTUP_KEYS, TRANSACTION_STATUS_IDLE};
use super::protocol::{BackendMessage, FrontendMessage};
use futures::{SinkExt, StreamExt};
use pgscatter_common::{Diagnostic, GatewayError, QueryResult, Result};
use std::collections::{BTreeMap, HashMap};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Byte stream a backend connection runs over
pub trait BackendStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> BackendStream for T {}

/// Cancel key reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendKeyData {
    pub process_id: i32,
    pub secret_key: i32,
}

/// Whether a setting can be sent in a StartupMessage or SET
fn is_session_setting(name: &str) -> bool {
    !RESERVED_STARTUP_KEYS.contains(&name)
}

/// Settings that only take effect at connection start
fn is_startup_only(name: &str) -> bool {
    name == "options"
}

/// An authenticated connection to one shard
pub struct BackendConn {
    id: Uuid,
    shard: String,
    framed: Framed<Box<dyn BackendStream>, BackendCodec>,
    auth: AuthNegotiator,
    params: ParameterTracker,
    key_data: Option<BackendKeyData>,
    transaction_status: u8,
    /// Settings this backend currently runs with. Starts as the startup
    /// packet values, which are also what RESET falls back to.
    applied: HashMap<String, String>,
    applied_version: u64,
    closed: bool,
}

impl std::fmt::Debug for BackendConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConn")
            .field("id", &self.id)
            .field("shard", &self.shard)
            .field("key_data", &self.key_data)
            .field("applied_version", &self.applied_version)
            .field("closed", &self.closed)
            .finish()
    }
}

impl BackendConn {
    /// Run the startup handshake over `stream`.
    ///
    /// `startup` goes into the StartupMessage and becomes the backend's
    /// session defaults. Session overrides belong in [`Self::sync_settings`]
    /// so that a later RESET returns to these values.
    pub async fn handshake<S>(
        shard: &str,
        stream: S,
        config: &BackendConfig,
        startup: Option<&HashMap<String, String>>,
    ) -> Result<Self>
    where
        S: BackendStream + 'static,
    {
        let stream: Box<dyn BackendStream> = Box::new(stream);
        let mut conn = BackendConn {
            id: Uuid::new_v4(),
            shard: shard.to_string(),
            framed: Framed::new(stream, BackendCodec::new(config.max_message_size)),
            auth: AuthNegotiator::new(),
            params: ParameterTracker::new(),
            key_data: None,
            transaction_status: TRANSACTION_STATUS_IDLE,
            applied: HashMap::new(),
            applied_version: 0,
            closed: false,
        };

        let params = startup_params(config, startup);
        conn.applied = startup
            .map(|s| {
                s.iter()
                    .filter(|(k, _)| is_session_setting(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();

        debug!(shard = %conn.shard, conn_id = %conn.id, params = params.len(), "sending startup message");
        if let Err(e) = conn.run_startup(params).await {
            conn.closed = true;
            return Err(e);
        }

        info!(
            shard = %conn.shard,
            conn_id = %conn.id,
            process_id = conn.key_data().map(|k| k.process_id),
            "backend connection established"
        );
        Ok(conn)
    }

    async fn run_startup(&mut self, params: Vec<(String, String)>) -> Result<()> {
        self.framed.send(FrontendMessage::Startup { params }).await?;

        loop {
            match self.recv().await? {
                BackendMessage::Authentication(mut body) => {
                    self.auth.handle_auth_request(&mut body)?;
                }
                BackendMessage::ParameterStatus { name, value } => {
                    self.params.record(name, value);
                }
                BackendMessage::BackendKeyData {
                    process_id,
                    secret_key,
                } => {
                    self.key_data = Some(BackendKeyData {
                        process_id,
                        secret_key,
                    });
                }
                BackendMessage::NoticeResponse(notice) => {
                    debug!(shard = %self.shard, notice = %notice, "notice during startup");
                }
                BackendMessage::ErrorResponse(diag) => {
                    warn!(shard = %self.shard, error = %diag.render_full(), "backend refused connection");
                    return Err(GatewayError::Pg(diag));
                }
                BackendMessage::ReadyForQuery { status } => {
                    if !self.auth.is_authenticated() {
                        return Err(GatewayError::protocol(
                            "backend reported ready before authentication completed",
                        ));
                    }
                    self.transaction_status = status;
                    return Ok(());
                }
                other => {
                    return Err(GatewayError::protocol(format!(
                        "unexpected {:?} during startup",
                        other
                    )))
                }
            }
        }
    }

    async fn recv(&mut self) -> Result<BackendMessage> {
        match self.framed.next().await {
            Some(msg) => msg,
            None => Err(GatewayError::ConnectionClosed(format!(
                "backend {} closed the connection",
                self.shard
            ))),
        }
    }

    /// Run a simple query and collect one result per statement.
    ///
    /// A backend ERROR is held until ReadyForQuery and then returned as
    /// [`GatewayError::Pg`]; the connection stays usable. A FATAL or PANIC
    /// diagnostic closes it.
    pub async fn simple_query(&mut self, sql: &str) -> Result<Vec<QueryResult>> {
        // The backend would stop reading the query at the NUL
        if sql.contains('\0') {
            return Err(GatewayError::malformed("query text contains a NUL byte"));
        }
        if self.closed {
            return Err(GatewayError::ConnectionClosed(format!(
                "connection to {} is closed",
                self.shard
            )));
        }
        let result = self.run_simple_query(sql).await;
        if let Err(e) = &result {
            if e.is_connection_fatal() {
                warn!(shard = %self.shard, conn_id = %self.id, error = %e, "closing backend connection");
                self.closed = true;
            }
        }
        result
    }

    async fn run_simple_query(&mut self, sql: &str) -> Result<Vec<QueryResult>> {
        debug!(shard = %self.shard, conn_id = %self.id, sql, "simple query");
        self.framed.send(FrontendMessage::Query(sql.to_string())).await?;

        let mut results = Vec::new();
        let mut current = QueryResult::default();
        let mut error: Option<Diagnostic> = None;

        loop {
            match self.recv().await? {
                BackendMessage::RowDescription(fields) => current.fields = fields,
                BackendMessage::DataRow(row) => current.rows.push(row),
                BackendMessage::CommandComplete(tag) => {
                    current.set_command_tag(tag);
                    results.push(std::mem::take(&mut current));
                }
                BackendMessage::EmptyQueryResponse => {
                    results.push(std::mem::take(&mut current));
                }
                BackendMessage::NoticeResponse(notice) => current.notices.push(notice),
                BackendMessage::ParameterStatus { name, value } => self.params.record(name, value),
                BackendMessage::ErrorResponse(diag) => {
                    if diag.is_fatal() {
                        return Err(GatewayError::Pg(diag));
                    }
                    current = QueryResult::default();
                    error = Some(diag);
                }
                BackendMessage::ReadyForQuery { status } => {
                    self.transaction_status = status;
                    break;
                }
                other => {
                    return Err(GatewayError::protocol(format!(
                        "unexpected {:?} during simple query",
                        other
                    )))
                }
            }
        }

        match error {
            Some(diag) => Err(GatewayError::Pg(diag)),
            None => Ok(results),
        }
    }

    /// Bring the backend's settings in line with `target`.
    ///
    /// Changed or new settings are applied with `set_config`, removed ones
    /// with `RESET`. On success the connection records `version` as applied;
    /// on failure nothing is recorded. Only call this while the backend is
    /// idle: a failed transaction rejects the statements and a rolled back
    /// one would undo them.
    pub async fn sync_settings(
        &mut self,
        target: Option<&HashMap<String, String>>,
        version: u64,
    ) -> Result<()> {
        let empty = HashMap::new();
        let target = target.unwrap_or(&empty);
        let statements = settings_diff(&self.applied, target);

        if !statements.is_empty() {
            debug!(
                shard = %self.shard,
                conn_id = %self.id,
                statements = statements.len(),
                "syncing session settings"
            );
            self.simple_query(&statements.join("; ")).await?;
        }

        self.applied = target
            .iter()
            .filter(|(k, _)| is_session_setting(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.applied_version = version;
        Ok(())
    }

    pub fn applied_version(&self) -> u64 {
        self.applied_version
    }

    /// ParameterStatus changes since the last call; `None` if there are none
    pub fn drain_parameter_status(&self) -> Option<HashMap<String, String>> {
        self.params.drain_pending()
    }

    /// Latest reported value of a server parameter
    #[allow(dead_code)]
    pub fn server_parameter(&self, name: &str) -> Option<String> {
        self.params.get(name)
    }

    pub fn key_data(&self) -> Option<BackendKeyData> {
        self.key_data
    }

    pub fn transaction_status(&self) -> u8 {
        self.transaction_status
    }

    /// Outside any transaction block
    pub fn is_idle(&self) -> bool {
        self.transaction_status == TRANSACTION_STATUS_IDLE
    }

    pub fn shard(&self) -> &str {
        &self.shard
    }

    pub fn is_usable(&self) -> bool {
        !self.closed && self.auth.is_authenticated()
    }

    /// Send Terminate (best effort) and mark the connection closed
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.framed.send(FrontendMessage::Terminate).await {
            debug!(shard = %self.shard, conn_id = %self.id, error = %e, "terminate failed");
        }
        debug!(shard = %self.shard, conn_id = %self.id, "backend connection closed");
    }
}

/// StartupMessage parameters: user, database, then settings in name order.
///
/// application_name falls back to the configured one.
fn startup_params(
    config: &BackendConfig,
    startup: Option<&HashMap<String, String>>,
) -> Vec<(String, String)> {
    let mut params = vec![("user".to_string(), config.user.clone())];
    if let Some(db) = &config.database {
        params.push(("database".to_string(), db.clone()));
    }

    let mut ordered: BTreeMap<&str, &str> = BTreeMap::new();
    ordered.insert("application_name", &config.application_name);
    if let Some(startup) = startup {
        for (name, value) in startup {
            if is_session_setting(name) {
                ordered.insert(name.as_str(), value.as_str());
            }
        }
    }
    params.extend(ordered.into_iter().map(|(k, v)| (k.to_string(), v.to_string())));
    params
}

/// Statements that turn `applied` into `target`, in name order
fn settings_diff(applied: &HashMap<String, String>, target: &HashMap<String, String>) -> Vec<String> {
    let mut changes: BTreeMap<&str, Option<&str>> = BTreeMap::new();
    for (name, value) in target {
        if !is_session_setting(name) || is_startup_only(name) {
            continue;
        }
        if applied.get(name) != Some(value) {
            changes.insert(name, Some(value.as_str()));
        }
    }
    for name in applied.keys() {
        if !target.contains_key(name) && !is_startup_only(name) {
            changes.insert(name.as_str(), None);
        }
    }

    changes
        .into_iter()
        .map(|(name, value)| match value {
            Some(value) => format!(
                "SELECT pg_catalog.set_config({}, {}, false)",
                quote_literal(name),
                quote_literal(value)
            ),
            None => format!("RESET {}", quote_ident(name)),
        })
        .collect()
}

fn quote_literal(s: &str) -> String {
    let escaped = s.replace('\'', "''");
    if escaped.contains('\\') {
        format!("E'{}'", escaped.replace('\\', "\\\\"))
    } else {
        format!("'{}'", escaped)
    }
}

fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pg_client::protocol::constants::{AUTH_MD5_PASSWORD, TRANSACTION_STATUS_IN_TRANSACTION};
    use crate::pg_client::testing::{FakeBackend, Script};
    use pgscatter_common::diagnostic::MessageKind;

    fn config() -> BackendConfig {
        BackendConfig {
            user: "gateway".into(),
            database: Some("app".into()),
            application_name: "pgscatter".into(),
            connect_timeout_secs: 5,
            max_message_size: 1024 * 1024,
            tcp_keepalive_secs: 10,
        }
    }

    async fn connected() -> (BackendConn, FakeBackend) {
        let (client, mut backend) = FakeBackend::pair();
        let server = tokio::spawn(async move {
            backend.read_startup().await;
            backend.send(Script::handshake()).await;
            backend
        });
        let conn = BackendConn::handshake("s1", client, &config(), None).await.unwrap();
        (conn, server.await.unwrap())
    }

    #[tokio::test]
    async fn test_handshake_sends_settings_and_reads_params() {
        let (client, mut backend) = FakeBackend::pair();
        let server = tokio::spawn(async move {
            let startup = backend.read_startup().await;
            backend.send(Script::handshake()).await;
            startup
        });

        let settings = HashMap::from([
            ("DateStyle".to_string(), "ISO, MDY".to_string()),
            ("user".to_string(), "client_user".to_string()),
        ]);
        let conn = BackendConn::handshake("s1", client, &config(), Some(&settings))
            .await
            .unwrap();
        let startup = server.await.unwrap();

        assert_eq!(startup["user"], "gateway");
        assert_eq!(startup["database"], "app");
        assert_eq!(startup["application_name"], "pgscatter");
        assert_eq!(startup["DateStyle"], "ISO, MDY");

        assert!(conn.is_usable());
        assert_eq!(conn.server_parameter("TimeZone").as_deref(), Some("UTC"));
        assert_eq!(
            conn.key_data(),
            Some(BackendKeyData {
                process_id: 4242,
                secret_key: 9001
            })
        );
        // Handshake parameters are pending until drained
        let pending = conn.drain_parameter_status().unwrap();
        assert_eq!(pending["server_version"], "16.2");
        assert!(conn.drain_parameter_status().is_none());
    }

    #[tokio::test]
    async fn test_handshake_refuses_md5() {
        let (client, mut backend) = FakeBackend::pair();
        tokio::spawn(async move {
            backend.read_startup().await;
            backend.send(Script::new().auth(AUTH_MD5_PASSWORD, &[1, 2, 3, 4])).await;
            // Keep the pipe open until the client gives up
            backend.read_query().await
        });

        let err = BackendConn::handshake("s1", client, &config(), None).await.unwrap_err();
        assert!(matches!(err, GatewayError::AuthRejected(_)));
        assert!(err.to_string().contains("MD5 password authentication"));
    }

    #[tokio::test]
    async fn test_handshake_error_response() {
        let (client, mut backend) = FakeBackend::pair();
        tokio::spawn(async move {
            backend.read_startup().await;
            let fatal = Diagnostic::new(
                MessageKind::Error,
                "FATAL",
                "3D000",
                "database \"app\" does not exist",
            );
            backend.send(Script::new().diagnostic(&fatal)).await;
        });

        let err = BackendConn::handshake("s1", client, &config(), None).await.unwrap_err();
        let diag = err.diagnostic().expect("backend diagnostic");
        assert_eq!(diag.code, "3D000");
        assert_eq!(err.to_string(), "FATAL: database \"app\" does not exist");
    }

    #[tokio::test]
    async fn test_handshake_eof() {
        let (client, mut backend) = FakeBackend::pair();
        tokio::spawn(async move {
            backend.read_startup().await;
            drop(backend);
        });

        let err = BackendConn::handshake("s1", client, &config(), None).await.unwrap_err();
        assert!(matches!(err, GatewayError::ConnectionClosed(_)));
    }

    #[tokio::test]
    async fn test_multi_statement_query_with_notice() {
        let (mut conn, mut backend) = connected().await;
        let server = tokio::spawn(async move {
            let sql = backend.read_query().await.unwrap();
            backend
                .send(
                    Script::new()
                        .row_description(&["a", "b"])
                        .data_row(&[Some("1"), None])
                        .data_row(&[Some(""), Some("x")])
                        .command_complete("SELECT 2")
                        .diagnostic(&Diagnostic::notice("00000", "table \"t\" does not exist, skipping"))
                        .command_complete("DROP TABLE")
                        .ready(TRANSACTION_STATUS_IDLE),
                )
                .await;
            sql
        });

        let results = conn
            .simple_query("SELECT a, b FROM t; DROP TABLE IF EXISTS t")
            .await
            .unwrap();
        assert_eq!(server.await.unwrap(), "SELECT a, b FROM t; DROP TABLE IF EXISTS t");

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].fields.len(), 2);
        assert_eq!(results[0].rows_affected, 2);
        assert!(results[0].rows[0].values[1].is_null());
        assert_eq!(results[0].rows[1].values[0].as_bytes(), Some(&b""[..]));
        assert!(results[0].notices.is_empty());

        assert_eq!(results[1].command_tag, "DROP TABLE");
        assert_eq!(results[1].notices.len(), 1);
        assert!(results[1].notices[0].message.contains("skipping"));
    }

    #[tokio::test]
    async fn test_error_is_held_until_ready() {
        let (mut conn, mut backend) = connected().await;
        tokio::spawn(async move {
            backend.read_query().await.unwrap();
            let err = Diagnostic::error("42P01", "relation \"missing\" does not exist").with_position(15);
            backend
                .send(Script::new().diagnostic(&err).ready(TRANSACTION_STATUS_IDLE))
                .await;

            backend.read_query().await.unwrap();
            backend
                .send(
                    Script::new()
                        .row_description(&["?column?"])
                        .data_row(&[Some("1")])
                        .command_complete("SELECT 1")
                        .ready(TRANSACTION_STATUS_IN_TRANSACTION),
                )
                .await;
        });

        let err = conn.simple_query("SELECT * FROM missing").await.unwrap_err();
        let diag = err.diagnostic().unwrap();
        assert_eq!(diag.code, "42P01");
        assert_eq!(diag.position, Some(15));
        assert!(conn.is_usable());

        let results = conn.simple_query("SELECT 1").await.unwrap();
        assert_eq!(results[0].rows.len(), 1);
        assert_eq!(conn.transaction_status(), TRANSACTION_STATUS_IN_TRANSACTION);
    }

    #[tokio::test]
    async fn test_fatal_closes_connection() {
        let (mut conn, mut backend) = connected().await;
        tokio::spawn(async move {
            backend.read_query().await.unwrap();
            let fatal = Diagnostic::new(
                MessageKind::Error,
                "FATAL",
                "57P01",
                "terminating connection due to administrator command",
            );
            backend.send(Script::new().diagnostic(&fatal)).await;
        });

        let err = conn.simple_query("SELECT pg_sleep(10)").await.unwrap_err();
        assert!(err.diagnostic().unwrap().is_fatal());
        assert!(!conn.is_usable());

        let err = conn.simple_query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, GatewayError::ConnectionClosed(_)));
    }

    #[tokio::test]
    async fn test_sync_settings_issues_set_and_reset() {
        let (mut conn, mut backend) = connected().await;
        conn.applied = HashMap::from([
            ("work_mem".to_string(), "4MB".to_string()),
            ("statement_timeout".to_string(), "1s".to_string()),
        ]);

        let server = tokio::spawn(async move {
            let sql = backend.read_query().await.unwrap();
            backend
                .send(
                    Script::new()
                        .command_complete("SELECT 1")
                        .command_complete("RESET")
                        .param("TimeZone", "Europe/Paris")
                        .command_complete("SELECT 1")
                        .ready(TRANSACTION_STATUS_IDLE),
                )
                .await;
            sql
        });

        let target = HashMap::from([
            ("work_mem".to_string(), "64MB".to_string()),
            ("TimeZone".to_string(), "Europe/Paris".to_string()),
        ]);
        conn.sync_settings(Some(&target), 3).await.unwrap();

        assert_eq!(
            server.await.unwrap(),
            "SELECT pg_catalog.set_config('TimeZone', 'Europe/Paris', false); \
             RESET \"statement_timeout\"; \
             SELECT pg_catalog.set_config('work_mem', '64MB', false)"
        );
        assert_eq!(conn.applied_version(), 3);
        assert_eq!(conn.server_parameter("TimeZone").as_deref(), Some("Europe/Paris"));
    }

    #[tokio::test]
    async fn test_sync_settings_without_changes_sends_nothing() {
        let (mut conn, _backend) = connected().await;
        conn.sync_settings(None, 7).await.unwrap();
        assert_eq!(conn.applied_version(), 7);
    }

    #[tokio::test]
    async fn test_close_sends_terminate() {
        let (mut conn, mut backend) = connected().await;
        conn.close().await;
        assert!(!conn.is_usable());
        assert!(backend.read_query().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_query_yields_empty_result() {
        let (mut conn, mut backend) = connected().await;
        tokio::spawn(async move {
            backend.read_query().await.unwrap();
            backend
                .send(Script::new().empty_query().ready(TRANSACTION_STATUS_IDLE))
                .await;
        });

        let results = conn.simple_query(";").await.unwrap();
        assert_eq!(results, vec![QueryResult::default()]);
        assert!(conn.is_idle());
    }

    #[tokio::test]
    async fn test_nul_in_query_is_rejected_before_sending() {
        let (mut conn, mut backend) = connected().await;

        let err = conn.simple_query("SELECT 1\0; DROP TABLE t").await.unwrap_err();
        assert!(matches!(err, GatewayError::MalformedMessage(_)));
        assert!(conn.is_usable());

        // Nothing reached the backend
        conn.close().await;
        assert!(backend.read_query().await.is_none());
    }

    #[tokio::test]
    async fn test_startup_values_are_the_reset_baseline() {
        let (client, mut backend) = FakeBackend::pair();
        let server = tokio::spawn(async move {
            let startup = backend.read_startup().await;
            backend.send(Script::handshake()).await;
            let mut queries = Vec::new();
            while let Some(sql) = backend.read_query().await {
                let script = sql
                    .split("; ")
                    .fold(Script::new(), |script, _| script.command_complete("SET"));
                backend.send(script.ready(TRANSACTION_STATUS_IDLE)).await;
                queries.push(sql);
            }
            (startup, queries)
        });

        let startup = HashMap::from([("DateStyle".to_string(), "ISO, MDY".to_string())]);
        let mut conn = BackendConn::handshake("s1", client, &config(), Some(&startup))
            .await
            .unwrap();

        let mut target = startup.clone();
        target.insert("work_mem".to_string(), "64MB".to_string());
        conn.sync_settings(Some(&target), 1).await.unwrap();
        target.insert("DateStyle".to_string(), "SQL, DMY".to_string());
        conn.sync_settings(Some(&target), 2).await.unwrap();
        conn.sync_settings(Some(&startup), 3).await.unwrap();
        conn.close().await;

        let (sent_startup, queries) = server.await.unwrap();
        assert_eq!(sent_startup["DateStyle"], "ISO, MDY");
        assert!(!sent_startup.contains_key("work_mem"));
        assert_eq!(
            queries,
            vec![
                "SELECT pg_catalog.set_config('work_mem', '64MB', false)".to_string(),
                "SELECT pg_catalog.set_config('DateStyle', 'SQL, DMY', false)".to_string(),
                "SELECT pg_catalog.set_config('DateStyle', 'ISO, MDY', false); RESET \"work_mem\"".to_string(),
            ]
        );
        assert_eq!(conn.applied_version(), 3);
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_literal("a\\b"), "E'a\\\\b'");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_startup_params_order_and_reserved_keys() {
        let settings = HashMap::from([
            ("database".to_string(), "other".to_string()),
            ("application_name".to_string(), "psql".to_string()),
            ("TimeZone".to_string(), "UTC".to_string()),
        ]);
        let params = startup_params(&config(), Some(&settings));
        let names: Vec<_> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["user", "database", "TimeZone", "application_name"]);
        assert_eq!(params[1].1, "app");
        assert_eq!(params[3].1, "psql");
    }
}
