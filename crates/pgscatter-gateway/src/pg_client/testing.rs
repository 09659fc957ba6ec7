//! Scripted fake backend for connection and scatter tests

use super::protocol::constants::*;
use super::protocol::messages::put_cstring;
use super::protocol::diagnostic::write_diagnostic;
use bytes::{BufMut, Bytes, BytesMut};
use pgscatter_common::Diagnostic;
use std::collections::HashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

/// Backend messages to write, built in order
#[derive(Debug, Default)]
pub(crate) struct Script(BytesMut);

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    fn frame(mut self, tag: u8, body: &[u8]) -> Self {
        self.0.put_u8(tag);
        self.0.put_i32((body.len() + 4) as i32);
        self.0.put_slice(body);
        self
    }

    pub fn auth(self, method: i32, extra: &[u8]) -> Self {
        let mut body = BytesMut::new();
        body.put_i32(method);
        body.put_slice(extra);
        self.frame(MSG_AUTHENTICATION, &body)
    }

    pub fn auth_ok(self) -> Self {
        self.auth(AUTH_OK, &[])
    }

    pub fn param(self, name: &str, value: &str) -> Self {
        let mut body = BytesMut::new();
        put_cstring(&mut body, name);
        put_cstring(&mut body, value);
        self.frame(MSG_PARAMETER_STATUS, &body)
    }

    pub fn key_data(self, process_id: i32, secret_key: i32) -> Self {
        let mut body = BytesMut::new();
        body.put_i32(process_id);
        body.put_i32(secret_key);
        self.frame(MSG_BACKEND_KEY_DATA, &body)
    }

    pub fn ready(self, status: u8) -> Self {
        self.frame(MSG_READY_FOR_QUERY, &[status])
    }

    /// Text columns of type text (oid 25)
    pub fn row_description(self, names: &[&str]) -> Self {
        let mut body = BytesMut::new();
        body.put_i16(names.len() as i16);
        for name in names {
            put_cstring(&mut body, name);
            body.put_u32(0);
            body.put_i16(0);
            body.put_u32(25);
            body.put_i16(-1);
            body.put_i32(-1);
            body.put_i16(0);
        }
        self.frame(MSG_ROW_DESCRIPTION, &body)
    }

    pub fn data_row(self, values: &[Option<&str>]) -> Self {
        let mut body = BytesMut::new();
        body.put_i16(values.len() as i16);
        for value in values {
            match value {
                Some(v) => {
                    body.put_i32(v.len() as i32);
                    body.put_slice(v.as_bytes());
                }
                None => body.put_i32(-1),
            }
        }
        self.frame(MSG_DATA_ROW, &body)
    }

    pub fn command_complete(self, tag: &str) -> Self {
        let mut body = BytesMut::new();
        put_cstring(&mut body, tag);
        self.frame(MSG_COMMAND_COMPLETE, &body)
    }

    pub fn empty_query(self) -> Self {
        self.frame(MSG_EMPTY_QUERY_RESPONSE, &[])
    }

    /// ErrorResponse or NoticeResponse, according to the diagnostic's kind
    pub fn diagnostic(mut self, diag: &Diagnostic) -> Self {
        write_diagnostic(diag, &mut self.0);
        self
    }

    /// The usual handshake reply: OK, a couple of parameters, key data, idle
    pub fn handshake() -> Self {
        Self::new()
            .auth_ok()
            .param("server_version", "16.2")
            .param("TimeZone", "UTC")
            .key_data(4242, 9001)
            .ready(TRANSACTION_STATUS_IDLE)
    }

    pub fn into_bytes(self) -> Bytes {
        self.0.freeze()
    }
}

/// Server half of a duplex pipe, speaking just enough protocol for tests
pub(crate) struct FakeBackend {
    stream: DuplexStream,
}

impl FakeBackend {
    /// A connected (client stream, fake backend) pair
    pub fn pair() -> (DuplexStream, FakeBackend) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        (client, FakeBackend { stream: server })
    }

    /// Read a StartupMessage and return its parameters
    pub async fn read_startup(&mut self) -> HashMap<String, String> {
        let len = self.stream.read_i32().await.unwrap() as usize;
        let mut body = vec![0u8; len - 4];
        self.stream.read_exact(&mut body).await.unwrap();
        assert_eq!(i32::from_be_bytes(body[0..4].try_into().unwrap()), PROTOCOL_VERSION_3_0);

        let mut parts = body[4..].split(|&b| b == 0).map(|s| String::from_utf8(s.to_vec()).unwrap());
        let mut params = HashMap::new();
        while let Some(name) = parts.next() {
            if name.is_empty() {
                break;
            }
            let value = parts.next().unwrap();
            params.insert(name, value);
        }
        params
    }

    /// Read the next Query; `None` on Terminate or EOF
    pub async fn read_query(&mut self) -> Option<String> {
        let tag = self.stream.read_u8().await.ok()?;
        let len = self.stream.read_i32().await.ok()? as usize;
        let mut body = vec![0u8; len - 4];
        self.stream.read_exact(&mut body).await.ok()?;
        match tag {
            MSG_QUERY => {
                body.pop();
                Some(String::from_utf8(body).unwrap())
            }
            MSG_TERMINATE => None,
            other => panic!("fake backend got unexpected message '{}'", char::from(other)),
        }
    }

    pub async fn send(&mut self, script: Script) {
        self.stream.write_all(&script.into_bytes()).await.unwrap();
        self.stream.flush().await.unwrap();
    }
}
