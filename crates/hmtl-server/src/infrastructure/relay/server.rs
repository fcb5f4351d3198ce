//! Relay server: bridges one module link to one network client at a time.
//!
//! # State machine
//!
//! ```text
//! LISTENING ──accept──▶ CONNECTED ──exit──▶ CLOSED
//!     ▲                     │
//!     └──connection lost────┘
//! ```
//!
//! While connected, each relay item from the client is handled in turn:
//!
//! - `exit`: reply `ack` and stop the server.
//! - `data`: wait briefly for a binary message from the module and return it,
//!   or a zero-length item if none arrived.  No `ack` is sent.
//! - anything else: forward verbatim to the module, wait for its `ok`, then
//!   reply `ack`.
//!
//! Network failures (EOF, read/write errors, bad relay framing) drop the
//! client and return to LISTENING.  A failure on the module side is fatal:
//! [`RelayServer::run`] returns the error and the state goes to CLOSED.

use std::net::SocketAddr;
use std::time::Duration;

use hmtl_core::protocol::tokens::relay::{ACK, DATA_REQUEST, EXIT};
use hmtl_core::protocol::ProtocolError;
use hmtl_core::relay::{encode_relay_item, RelayItem, RelayItemDecoder};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::infrastructure::transport::{with_session, SharedSession, TransportError};

/// Default address the relay listens on.
pub const DEFAULT_RELAY_PORT: u16 = 6000;

/// Error type for the relay server.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("bind failed on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),
    /// The module link failed while handling a client request.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("could not frame reply: {0}")]
    Encode(#[from] ProtocolError),
}

/// Configuration for the relay server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayServerConfig {
    pub bind_addr: SocketAddr,
    /// How long a `data` request waits for a module message.
    pub data_wait: Duration,
    /// Acknowledgement timeout for forwarded messages.
    pub ack_timeout: Duration,
}

impl Default for RelayServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_RELAY_PORT)),
            data_wait: Duration::from_millis(250),
            ack_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Listening,
    Connected,
    Closed,
}

/// How a client connection ended.
#[derive(Debug)]
enum ConnectionEnd {
    Exit,
    Lost(String),
}

pub struct RelayServer {
    config: RelayServerConfig,
    listener: TcpListener,
    session: SharedSession,
    state: watch::Sender<RelayState>,
}

impl RelayServer {
    /// Binds the listening socket.
    ///
    /// # Errors
    ///
    /// [`RelayError::Bind`] if the address is unavailable.
    pub async fn bind(config: RelayServerConfig, session: SharedSession) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|source| RelayError::Bind {
                addr: config.bind_addr,
                source,
            })?;
        let (state, _) = watch::channel(RelayState::Listening);
        Ok(Self {
            config,
            listener,
            session,
            state,
        })
    }

    /// The bound address; differs from the configured one when binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<RelayState> {
        self.state.subscribe()
    }

    /// Serves clients until one sends `exit` or the module link fails.
    ///
    /// # Errors
    ///
    /// [`RelayError::Accept`] if the listener fails, [`RelayError::Transport`]
    /// if the module link fails.
    pub async fn run(self) -> Result<(), RelayError> {
        info!("relay listening on {}", self.config.bind_addr);
        loop {
            self.set_state(RelayState::Listening);
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    self.set_state(RelayState::Closed);
                    return Err(RelayError::Accept(e));
                }
            };
            let id = Uuid::new_v4();
            info!("[{id}] connection accepted from {peer}");
            self.set_state(RelayState::Connected);

            match self.serve_connection(stream, id).await {
                Ok(ConnectionEnd::Exit) => {
                    info!("[{id}] exit requested, shutting down");
                    self.set_state(RelayState::Closed);
                    return Ok(());
                }
                Ok(ConnectionEnd::Lost(reason)) => {
                    warn!("[{id}] lost connection: {reason}");
                }
                Err(e) => {
                    error!("[{id}] fatal error while handling request: {e}");
                    self.set_state(RelayState::Closed);
                    return Err(e);
                }
            }
        }
    }

    fn set_state(&self, state: RelayState) {
        self.state.send_replace(state);
    }

    async fn serve_connection(
        &self,
        mut stream: TcpStream,
        id: Uuid,
    ) -> Result<ConnectionEnd, RelayError> {
        let mut decoder = RelayItemDecoder::new();
        let mut buf = [0u8; 4096];

        loop {
            let item = match decoder.next_item() {
                Ok(Some(item)) => item,
                Ok(None) => {
                    match stream.read(&mut buf).await {
                        Ok(0) => return Ok(ConnectionEnd::Lost("peer closed".to_string())),
                        Ok(n) => decoder.push(&buf[..n]),
                        Err(e) => return Ok(ConnectionEnd::Lost(e.to_string())),
                    }
                    continue;
                }
                Err(e) => return Ok(ConnectionEnd::Lost(format!("bad relay framing: {e}"))),
            };

            let bytes = match item {
                RelayItem::Bytes(bytes) => bytes,
                RelayItem::Empty => {
                    return Ok(ConnectionEnd::Lost("client sent an empty item".to_string()))
                }
            };
            debug!("[{id}] received {} bytes", bytes.len());

            let reply = if bytes.as_slice() == EXIT {
                let framed = encode_relay_item(Some(ACK))?;
                // The ack is best effort: the server stops either way.
                if let Err(e) = stream.write_all(&framed).await {
                    warn!("[{id}] could not acknowledge exit: {e}");
                }
                return Ok(ConnectionEnd::Exit);
            } else if bytes.as_slice() == DATA_REQUEST {
                let wait = self.config.data_wait;
                let item = with_session(&self.session, move |s| s.get_data_message(wait)).await?;
                match &item {
                    Some(item) => debug!("[{id}] returning {item}"),
                    None => debug!("[{id}] no data pending"),
                }
                encode_relay_item(item.as_ref().map(|i| i.data.as_slice()))?
            } else {
                let timeout = self.config.ack_timeout;
                with_session(&self.session, move |s| {
                    s.send_and_confirm(&bytes, false, timeout)
                })
                .await?;
                encode_relay_item(Some(ACK))?
            };

            if let Err(e) = stream.write_all(&reply).await {
                return Ok(ConnectionEnd::Lost(e.to_string()));
            }
        }
    }
}
