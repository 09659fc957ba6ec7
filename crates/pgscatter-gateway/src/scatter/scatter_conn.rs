//! Scatter coordinator
//!
//! Holds one backend connection per shard for a client session and runs
//! simple queries on several shards at once. Backends are kept in line with
//! the session: a new connection starts from the client's startup
//! parameters and takes the session overrides with `set_config` before its
//! first query, and an existing one is synced with SET/RESET before it runs
//! the next query if the session changed since it was last synced. Syncing
//! waits while a backend is inside a transaction block.

use super::session::SessionState;
use crate::pg_client::{BackendConn, BackendConnector};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::join_all;
use pgscatter_common::{QueryResult, Result, ShardTarget};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Startup parameters overlaid with session settings.
///
/// `None` when neither has any entries.
#[allow(dead_code)]
pub fn merged_settings(state: &SessionState) -> Option<HashMap<String, String>> {
    merged_snapshot(state).0
}

/// Merged settings plus the settings version they reflect
fn merged_snapshot(state: &SessionState) -> (Option<HashMap<String, String>>, u64) {
    let snapshot = state.snapshot();
    if state.startup_params().is_empty() && snapshot.values.is_empty() {
        return (None, snapshot.version);
    }
    let mut merged = state.startup_params().clone();
    merged.extend(snapshot.values);
    (Some(merged), snapshot.version)
}

/// Results from one shard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardResult {
    pub shard: String,
    /// One entry per statement
    pub results: Vec<QueryResult>,
    /// ParameterStatus changes to relay to the client
    pub parameter_status: Option<HashMap<String, String>>,
}

type SharedConn = Arc<Mutex<BackendConn>>;

/// Per-session connections to every shard the session has touched
pub struct ScatterConn {
    session: Arc<SessionState>,
    connector: Arc<dyn BackendConnector>,
    conns: DashMap<String, SharedConn>,
}

impl ScatterConn {
    pub fn new(session: Arc<SessionState>, connector: Arc<dyn BackendConnector>) -> Self {
        Self {
            session,
            connector,
            conns: DashMap::new(),
        }
    }

    #[allow(dead_code)]
    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    /// Override a setting for every shard, current and future
    pub fn set_session_variable(&self, name: &str, value: &str) {
        let version = self.session.set(name, value);
        debug!(name, value, version, "session variable set");
    }

    #[allow(dead_code)]
    pub fn reset_session_variable(&self, name: &str) {
        let version = self.session.reset(name);
        debug!(name, version, "session variable reset");
    }

    #[allow(dead_code)]
    pub fn reset_all_session_variables(&self) {
        let version = self.session.reset_all();
        debug!(version, "all session variables reset");
    }

    /// Run `sql` on every shard concurrently.
    ///
    /// Results come back in `shards` order. The first failing shard's error
    /// is returned unchanged. ParameterStatus changes are only taken from the
    /// connections once every shard has succeeded; after a failure they stay
    /// pending and go out with the next successful call.
    pub async fn execute(&self, shards: &[ShardTarget], sql: &str) -> Result<Vec<ShardResult>> {
        let outcomes = join_all(shards.iter().map(|shard| self.execute_on(shard, sql))).await;
        let completed = outcomes.into_iter().collect::<Result<Vec<_>>>()?;

        let mut results = Vec::with_capacity(completed.len());
        for (shard, conn, statements) in completed {
            let parameter_status = conn.lock().await.drain_parameter_status();
            results.push(ShardResult {
                shard: shard.name.clone(),
                results: statements,
                parameter_status,
            });
        }
        Ok(results)
    }

    async fn execute_on<'a>(
        &self,
        shard: &'a ShardTarget,
        sql: &str,
    ) -> Result<(&'a ShardTarget, SharedConn, Vec<QueryResult>)> {
        let conn = self.connection(shard).await?;
        let mut guard = conn.lock().await;

        let outcome = Self::run(&mut guard, &self.session, sql).await;
        let usable = guard.is_usable();
        drop(guard);

        if !usable {
            self.evict(&shard.name, &conn);
        }
        outcome.map(|statements| (shard, conn, statements))
    }

    async fn run(conn: &mut BackendConn, session: &SessionState, sql: &str) -> Result<Vec<QueryResult>> {
        let (merged, version) = merged_snapshot(session);
        if conn.applied_version() != version {
            if conn.is_idle() {
                conn.sync_settings(merged.as_ref(), version).await?;
            } else {
                // Synced on the first query after the transaction ends
                debug!(
                    shard = conn.shard(),
                    status = %char::from(conn.transaction_status()),
                    settings_version = version,
                    "settings sync deferred inside transaction"
                );
            }
        }
        conn.simple_query(sql).await
    }

    /// The shard's connection, opening one if needed.
    ///
    /// A new backend gets the startup parameters in its startup packet and
    /// the session overrides with `set_config` right after the handshake,
    /// both from one snapshot, before it serves any query.
    async fn connection(&self, shard: &ShardTarget) -> Result<SharedConn> {
        if let Some(existing) = self.conns.get(&shard.name) {
            return Ok(existing.value().clone());
        }

        let (merged, version) = merged_snapshot(&self.session);
        let startup = self.session.startup_params();
        let startup = (!startup.is_empty()).then_some(startup);
        let mut conn = self.connector.connect(shard, startup).await?;
        if let Err(e) = conn.sync_settings(merged.as_ref(), version).await {
            conn.close().await;
            return Err(e);
        }
        let fresh = Arc::new(Mutex::new(conn));

        let (chosen, loser) = match self.conns.entry(shard.name.clone()) {
            Entry::Occupied(e) => (e.get().clone(), Some(fresh)),
            Entry::Vacant(e) => {
                e.insert(fresh.clone());
                (fresh, None)
            }
        };

        if let Some(loser) = loser {
            // Another query opened this shard first
            loser.lock().await.close().await;
        } else {
            info!(shard = %shard, settings_version = version, "shard connection added");
        }
        Ok(chosen)
    }

    fn evict(&self, name: &str, conn: &SharedConn) {
        if self.conns.remove_if(name, |_, v| Arc::ptr_eq(v, conn)).is_some() {
            warn!(shard = name, "evicted broken shard connection");
        }
    }

    /// Close and forget one shard's connection
    pub async fn close_shard(&self, name: &str) {
        if let Some((_, conn)) = self.conns.remove(name) {
            conn.lock().await.close().await;
        }
    }

    /// Close every shard connection
    pub async fn close_all(&self) {
        let names: Vec<String> = self.conns.iter().map(|e| e.key().clone()).collect();
        for name in names {
            self.close_shard(&name).await;
        }
    }

    #[allow(dead_code)]
    pub fn is_connected(&self, name: &str) -> bool {
        self.conns.contains_key(name)
    }

    #[allow(dead_code)]
    pub fn connection_count(&self) -> usize {
        self.conns.len()
    }
}
