//! TCP connection to an `hmtl-server` relay.
//!
//! Architecture:
//! - `RemoteClient` owns one TCP stream to the relay.
//! - Every item in either direction is length-prefixed (see
//!   [`hmtl_core::relay`]).
//! - A message is sent, then the client waits for the relay's `ack`, which
//!   the relay only sends once the module itself has acknowledged.
//! - Replies from modules are not pushed; the client pulls them with `data`
//!   requests, one fragment per request.

use std::net::SocketAddr;
use std::time::Duration;

use hmtl_core::protocol::tokens::relay::{ACK, DATA_REQUEST, EXIT};
use hmtl_core::protocol::{decode_header, encode_message, MessageFlags, ProtocolError};
use hmtl_core::relay::{encode_relay_item, RelayItem, RelayItemDecoder};
use hmtl_core::HmtlMessage;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Errors that can occur talking to the relay.
#[derive(Debug, Error)]
pub enum ClientError {
    /// TCP connection to the relay failed.
    #[error("failed to connect to relay at {addr}: {source}")]
    ConnectFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// The connection dropped or a read/write failed.
    #[error("link to relay lost: {0}")]
    LinkLost(String),
    /// The relay did not acknowledge in time.
    #[error("no acknowledgement from relay within {0:?}")]
    AckTimeout(Duration),
    /// A message could not be encoded, or the relay sent bad framing.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Configuration for the relay connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_addr: SocketAddr,
    /// How long to wait for `ack` after sending.  Should exceed the relay's
    /// own acknowledgement timeout towards the module.
    pub ack_timeout: Duration,
    /// Upper bound on fragments collected for one response.
    pub max_response_fragments: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([127, 0, 0, 1], 6000)),
            ack_timeout: Duration::from_secs(15),
            max_response_fragments: 64,
        }
    }
}

#[derive(Debug)]
pub struct RemoteClient {
    config: ClientConfig,
    stream: TcpStream,
    decoder: RelayItemDecoder,
}

impl RemoteClient {
    /// # Errors
    ///
    /// [`ClientError::ConnectFailed`] if the relay cannot be reached.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let addr = config.server_addr;
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ClientError::ConnectFailed { addr, source })?;
        info!("connected to relay at {addr}");
        Ok(Self {
            config,
            stream,
            decoder: RelayItemDecoder::new(),
        })
    }

    /// Sends one relay item.
    ///
    /// # Errors
    ///
    /// [`ClientError::LinkLost`] on write failure.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        debug!("sending {} bytes: {}", bytes.len(), hex(bytes));
        let framed = encode_relay_item(Some(bytes))?;
        self.stream
            .write_all(&framed)
            .await
            .map_err(|e| ClientError::LinkLost(e.to_string()))
    }

    /// Reads the next relay item.
    ///
    /// # Errors
    ///
    /// [`ClientError::LinkLost`] if the relay closes the connection, and
    /// [`ClientError::Protocol`] on bad framing.
    pub async fn recv_item(&mut self) -> Result<RelayItem, ClientError> {
        let mut buf = [0u8; 1024];
        loop {
            if let Some(item) = self.decoder.next_item()? {
                return Ok(item);
            }
            let n = self
                .stream
                .read(&mut buf)
                .await
                .map_err(|e| ClientError::LinkLost(e.to_string()))?;
            if n == 0 {
                return Err(ClientError::LinkLost("relay closed the connection".to_string()));
            }
            self.decoder.push(&buf[..n]);
        }
    }

    /// Reads one item and reports whether it was `ack`.
    ///
    /// # Errors
    ///
    /// As [`Self::recv_item`].
    pub async fn get_ack(&mut self) -> Result<bool, ClientError> {
        let item = self.recv_item().await?;
        let acked = item.is(ACK);
        if !acked {
            debug!("expected ack, got {item:?}");
        }
        Ok(acked)
    }

    /// Reads items until `ack` arrives.
    async fn wait_for_ack(&mut self) -> Result<(), ClientError> {
        let timeout = self.config.ack_timeout;
        tokio::time::timeout(timeout, async {
            while !self.get_ack().await? {}
            Ok::<(), ClientError>(())
        })
        .await
        .map_err(|_| ClientError::AckTimeout(timeout))?
    }

    /// Sends `msg` and waits for the relay's `ack`.
    ///
    /// With `expect_response`, then pulls reply fragments with `data`
    /// requests until one arrives without the MORE_DATA flag, the relay
    /// reports nothing pending, or the fragment limit is reached.  The
    /// returned list is empty when no response was asked for or none came.
    ///
    /// # Errors
    ///
    /// [`ClientError::AckTimeout`], [`ClientError::LinkLost`] or
    /// [`ClientError::Protocol`].
    pub async fn send_and_ack(
        &mut self,
        msg: &HmtlMessage,
        expect_response: bool,
    ) -> Result<Vec<Vec<u8>>, ClientError> {
        let bytes = encode_message(msg)?;
        self.send(&bytes).await?;
        debug!("waiting on ack");
        self.wait_for_ack().await?;

        if !expect_response {
            return Ok(Vec::new());
        }

        let mut fragments = Vec::new();
        while fragments.len() < self.config.max_response_fragments {
            let Some(fragment) = self.get_response_data().await? else {
                break;
            };
            let more = decode_header(&fragment)
                .map(|(header, _)| header.flags.contains(MessageFlags::MORE_DATA))
                .unwrap_or(false);
            debug!("received response fragment: {}", hex(&fragment));
            fragments.push(fragment);
            if !more {
                return Ok(fragments);
            }
        }

        if fragments.is_empty() {
            warn!("no response data received");
        } else if fragments.len() >= self.config.max_response_fragments {
            warn!("stopped after {} response fragments", fragments.len());
        }
        Ok(fragments)
    }

    /// Requests one pending module message from the relay.
    ///
    /// # Errors
    ///
    /// As [`Self::recv_item`].
    pub async fn get_response_data(&mut self) -> Result<Option<Vec<u8>>, ClientError> {
        self.send(DATA_REQUEST).await?;
        Ok(self.recv_item().await?.into_option())
    }

    /// Tells the relay to shut down and waits for its `ack`.
    ///
    /// # Errors
    ///
    /// As [`Self::send_and_ack`].
    pub async fn send_exit(&mut self) -> Result<(), ClientError> {
        info!("sending exit to relay");
        self.send(EXIT).await?;
        self.wait_for_ack().await
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
