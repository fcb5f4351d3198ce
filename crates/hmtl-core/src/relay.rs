//! Item framing for the network channel between the relay server and its
//! remote clients.
//!
//! Each item is a 4-byte big-endian length followed by that many bytes.  A
//! zero-length item is the "no data pending" answer to a data request.
//!
//! ```text
//! [len:4 BE][bytes:len]
//! ```

use crate::protocol::codec::ProtocolError;

/// Size of the length prefix in bytes.
pub const RELAY_PREFIX_LEN: usize = 4;

/// Largest item either side accepts.
pub const MAX_RELAY_ITEM: usize = 64 * 1024;

/// One item received from the relay channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayItem {
    Bytes(Vec<u8>),
    /// Zero-length item.
    Empty,
}

impl RelayItem {
    pub fn into_option(self) -> Option<Vec<u8>> {
        match self {
            RelayItem::Bytes(b) => Some(b),
            RelayItem::Empty => None,
        }
    }

    /// True if the item is exactly `token`.
    pub fn is(&self, token: &[u8]) -> bool {
        matches!(self, RelayItem::Bytes(b) if b.as_slice() == token)
    }
}

/// Frames `item` for the relay channel; `None` becomes a zero-length item.
///
/// # Errors
///
/// Returns [`ProtocolError::OversizedPayload`] if the item exceeds
/// [`MAX_RELAY_ITEM`].
pub fn encode_relay_item(item: Option<&[u8]>) -> Result<Vec<u8>, ProtocolError> {
    let bytes = item.unwrap_or_default();
    if bytes.len() > MAX_RELAY_ITEM {
        return Err(ProtocolError::OversizedPayload {
            len: bytes.len(),
            max: MAX_RELAY_ITEM,
        });
    }
    let mut buf = Vec::with_capacity(RELAY_PREFIX_LEN + bytes.len());
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
    Ok(buf)
}

/// Incremental decoder: feed it bytes as they arrive from the socket and pull
/// complete items out.
#[derive(Debug, Default)]
pub struct RelayItemDecoder {
    buf: Vec<u8>,
}

impl RelayItemDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes received but not yet returned as an item.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Returns the next complete item, or `None` if more bytes are needed.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::OversizedPayload`] if the prefix announces an
    /// item larger than [`MAX_RELAY_ITEM`]; the stream cannot be resynchronised
    /// after that.
    pub fn next_item(&mut self) -> Result<Option<RelayItem>, ProtocolError> {
        if self.buf.len() < RELAY_PREFIX_LEN {
            return Ok(None);
        }
        let mut prefix = [0u8; RELAY_PREFIX_LEN];
        prefix.copy_from_slice(&self.buf[..RELAY_PREFIX_LEN]);
        let len = u32::from_be_bytes(prefix) as usize;
        if len > MAX_RELAY_ITEM {
            return Err(ProtocolError::OversizedPayload {
                len,
                max: MAX_RELAY_ITEM,
            });
        }

        let total = RELAY_PREFIX_LEN + len;
        if self.buf.len() < total {
            return Ok(None);
        }
        let bytes: Vec<u8> = self.buf.drain(..total).skip(RELAY_PREFIX_LEN).collect();
        Ok(Some(if bytes.is_empty() {
            RelayItem::Empty
        } else {
            RelayItem::Bytes(bytes)
        }))
    }
}
