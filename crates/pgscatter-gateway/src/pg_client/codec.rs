//! Frame codec for backend connections
//!
//! Every backend message is a 1-byte tag, a 4-byte big-endian length that
//! counts itself, and a body. The decoder waits for a whole frame before
//! parsing it so partial reads never produce half a message.

use super::protocol::{BackendMessage, FrontendMessage};
use bytes::{Buf, BytesMut};
use pgscatter_common::GatewayError;
use tokio_util::codec::{Decoder, Encoder};

/// Default largest frame accepted from a backend (16 MiB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

const HEADER_LEN: usize = 5;

/// Decodes [`BackendMessage`]s and encodes [`FrontendMessage`]s
#[derive(Debug, Clone)]
pub struct BackendCodec {
    max_message_size: usize,
}

impl BackendCodec {
    pub fn new(max_message_size: usize) -> Self {
        Self { max_message_size }
    }
}

impl Default for BackendCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_SIZE)
    }
}

impl Decoder for BackendCodec {
    type Item = BackendMessage;
    type Error = GatewayError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let tag = src[0];
        let len = i32::from_be_bytes([src[1], src[2], src[3], src[4]]);
        if len < 4 {
            return Err(GatewayError::malformed(format!(
                "message '{}' has invalid length {}",
                char::from(tag),
                len
            )));
        }
        let len = len as usize;
        if len > self.max_message_size {
            return Err(GatewayError::malformed(format!(
                "message '{}' of {} bytes exceeds the {} byte limit",
                char::from(tag),
                len,
                self.max_message_size
            )));
        }

        let frame_len = len + 1;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let body = src.split_to(len - 4).freeze();
        BackendMessage::parse(tag, body).map(Some)
    }
}

impl Encoder<FrontendMessage> for BackendCodec {
    type Error = GatewayError;

    fn encode(&mut self, msg: FrontendMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        msg.encode(dst);
        Ok(())
    }
}
