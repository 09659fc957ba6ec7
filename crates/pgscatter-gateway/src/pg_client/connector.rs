//! Opening backend connections
//!
//! The scatter coordinator only sees [`BackendConnector`], so tests can hand
//! it in-memory backends while the binary uses [`TcpConnector`].

use super::config::BackendConfig;
use super::connection::BackendConn;
use async_trait::async_trait;
use pgscatter_common::{GatewayError, Result, ShardTarget};
use socket2::{SockRef, TcpKeepalive};
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// Opens an authenticated connection to a shard
#[async_trait]
pub trait BackendConnector: Send + Sync {
    /// Connect and run the handshake with `startup` in the startup packet
    async fn connect(
        &self,
        shard: &ShardTarget,
        startup: Option<&HashMap<String, String>>,
    ) -> Result<BackendConn>;
}

/// Connects over TCP
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    config: BackendConfig,
}

impl TcpConnector {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    async fn open(
        &self,
        shard: &ShardTarget,
        startup: Option<&HashMap<String, String>>,
    ) -> Result<BackendConn> {
        let stream = TcpStream::connect(shard.addr()).await?;
        tune_socket(&stream, shard, self.config.tcp_keepalive_secs);
        debug!(shard = %shard, "tcp connection open");
        BackendConn::handshake(&shard.name, stream, &self.config, startup).await
    }
}

#[async_trait]
impl BackendConnector for TcpConnector {
    async fn connect(
        &self,
        shard: &ShardTarget,
        startup: Option<&HashMap<String, String>>,
    ) -> Result<BackendConn> {
        let timeout = self.config.connect_timeout();
        match tokio::time::timeout(timeout, self.open(shard, startup)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::ConnectionClosed(format!(
                "connecting to {} timed out after {}s",
                shard,
                timeout.as_secs()
            ))),
        }
    }
}

/// Disable Nagle and arm TCP keepalive on a backend socket.
///
/// `keepalive_secs == 0` leaves keepalive off. Failures are logged and the
/// connection goes ahead with OS defaults.
fn tune_socket(stream: &TcpStream, shard: &ShardTarget, keepalive_secs: u64) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!(shard = %shard, error = %e, "could not set TCP_NODELAY");
    }
    if keepalive_secs == 0 {
        return;
    }

    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(keepalive_secs))
        .with_interval(Duration::from_secs(keepalive_secs / 2 + 1));
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    let keepalive = keepalive.with_retries(3);

    // set_tcp_keepalive also turns SO_KEEPALIVE on
    match SockRef::from(stream).set_tcp_keepalive(&keepalive) {
        Ok(()) => debug!(shard = %shard, keepalive_secs, "tcp keepalive armed"),
        Err(e) => warn!(shard = %shard, keepalive_secs, error = %e, "could not arm tcp keepalive"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pg_client::testing::Script;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_connect_and_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let len = socket.read_i32().await.unwrap() as usize;
            let mut startup = vec![0u8; len - 4];
            socket.read_exact(&mut startup).await.unwrap();
            socket.write_all(&Script::handshake().into_bytes()).await.unwrap();
            // Hold the socket until the client hangs up
            let mut rest = Vec::new();
            let _ = socket.read_to_end(&mut rest).await;
        });

        let connector = TcpConnector::new(BackendConfig {
            user: "gateway".into(),
            database: None,
            application_name: "pgscatter".into(),
            connect_timeout_secs: 5,
            max_message_size: 1024 * 1024,
            tcp_keepalive_secs: 10,
        });
        let conn = connector
            .connect(&ShardTarget::new("local", "127.0.0.1", port), None)
            .await
            .unwrap();
        assert!(conn.is_usable());
        assert_eq!(conn.shard(), "local");
    }
}
