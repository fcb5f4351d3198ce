//! Synchronous command/acknowledgement session over one module link.
//!
//! A [`TransportSession`] owns both halves of a link: a [`FrameReader`]
//! draining the inbound bytes on its own thread, and a [`ByteSink`] for the
//! outbound side.  Every operation blocks the caller for a bounded time.
//!
//! # Exchange model
//!
//! The protocol carries no request ids.  A command is matched to the next
//! `ok`/`fail` line that arrives, so only one [`TransportSession::send_and_confirm`]
//! may be in flight at a time.  Callers sharing a session serialise through
//! [`super::SharedSession`].
//!
//! # Link loss
//!
//! The reader thread exits on a read error and never restarts.  Once its
//! buffered items are drained every wait fails with
//! [`TransportError::LinkLost`] instead of timing out.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use hmtl_core::config::ConfigRecord;
use hmtl_core::framing::{ByteSource, FrameItem, FrameReader, FrameReaderConfig};
use hmtl_core::protocol::tokens::{FAIL, OK, READY, TERMINATOR};
use hmtl_core::protocol::{encode_message, ProtocolError, WireMessage};
use hmtl_core::HmtlMessage;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced by transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The device could not be opened.
    #[error("failed to open {device}: {source}")]
    Open {
        device: String,
        #[source]
        source: io::Error,
    },

    /// No `ready` line arrived after opening the link.
    #[error("module did not report ready within {0:?}")]
    ReadyTimeout(Duration),

    /// Neither `ok` nor `fail` arrived after a command.
    #[error("no acknowledgement within {0:?}")]
    AckTimeout(Duration),

    /// The module answered `fail`.
    #[error("module rejected the command")]
    CommandRejected,

    /// The link is gone: a write failed or the reader thread has stopped.
    #[error("link lost: {reason}")]
    LinkLost { reason: String },

    /// A local I/O failure, such as being unable to start the reader thread.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A message could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The shared session could not be reached from an async task.
    #[error("session unavailable: {0}")]
    SessionUnavailable(String),
}

impl TransportError {
    pub fn is_link_lost(&self) -> bool {
        matches!(self, TransportError::LinkLost { .. })
    }

    /// Timeouts the caller may reasonably retry.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransportError::ReadyTimeout(_) | TransportError::AckTimeout(_)
        )
    }
}

// ── Outbound byte sink ────────────────────────────────────────────────────────

/// Outbound half of a module link.
#[cfg_attr(test, mockall::automock)]
pub trait ByteSink: Send {
    /// Writes all of `data` and flushes it to the device.
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()>;
}

/// Adapts any [`Write`] implementation into a [`ByteSink`].
pub struct WriteSink<W> {
    inner: W,
}

impl<W: Write + Send> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write + Send> ByteSink for WriteSink<W> {
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.inner.write_all(data)?;
        self.inner.flush()
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Timing and buffering settings for a [`TransportSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long [`TransportSession::open`] waits for `ready`.
    pub ready_timeout: Duration,
    /// Poll interval while waiting for `ready`.
    pub ready_poll: Duration,
    /// Default acknowledgement timeout for commands.
    pub ack_timeout: Duration,
    /// Poll interval while waiting for an acknowledgement.
    pub ack_poll: Duration,
    /// Default wait for a module-originated binary message.
    pub data_wait: Duration,
    /// Poll interval while waiting for a binary message.
    pub data_poll: Duration,
    /// Capacity of the frame reader's ring buffer.
    pub buffer_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ready_timeout: Duration::from_secs(10),
            ready_poll: Duration::from_secs(1),
            ack_timeout: Duration::from_secs(10),
            ack_poll: Duration::from_millis(100),
            data_wait: Duration::from_millis(250),
            data_poll: Duration::from_millis(100),
            buffer_capacity: hmtl_core::framing::DEFAULT_BUFFER_CAPACITY,
        }
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Exclusive owner of one module link.
pub struct TransportSession {
    name: String,
    reader: FrameReader,
    sink: Box<dyn ByteSink>,
    config: SessionConfig,
    last_received: Option<Instant>,
}

impl TransportSession {
    /// Starts reading the link, then blocks until the module reports ready.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ReadyTimeout`] if `ready` does not arrive
    /// within `config.ready_timeout`, or [`TransportError::LinkLost`] if the
    /// link fails first.
    pub fn open<S, K>(
        name: impl Into<String>,
        source: S,
        sink: K,
        config: SessionConfig,
    ) -> Result<Self, TransportError>
    where
        S: ByteSource + 'static,
        K: ByteSink + 'static,
    {
        let mut session = Self::attach(name, source, sink, config)?;
        session.wait_for_ready()?;
        Ok(session)
    }

    /// Starts reading the link without waiting for `ready`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the reader thread cannot be spawned.
    pub fn attach<S, K>(
        name: impl Into<String>,
        source: S,
        sink: K,
        config: SessionConfig,
    ) -> Result<Self, TransportError>
    where
        S: ByteSource + 'static,
        K: ByteSink + 'static,
    {
        let name = name.into();
        let reader = FrameReader::spawn(
            source,
            FrameReaderConfig {
                buffer_capacity: config.buffer_capacity,
                thread_name: format!("hmtl-reader-{name}"),
            },
        )?;
        Ok(Self {
            name,
            reader,
            sink: Box::new(sink),
            config,
            last_received: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Blocks until a `ready` line arrives, discarding anything before it.
    ///
    /// # Errors
    ///
    /// [`TransportError::ReadyTimeout`] or [`TransportError::LinkLost`].
    pub fn wait_for_ready(&mut self) -> Result<(), TransportError> {
        let timeout = self.config.ready_timeout;
        let deadline = Instant::now() + timeout;
        info!("waiting for {} to report ready", self.name);

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("{} did not report ready within {timeout:?}", self.name);
                return Err(TransportError::ReadyTimeout(timeout));
            }
            match self.get_message(remaining.min(self.config.ready_poll))? {
                Some(item) if item.is_token(READY) => {
                    info!("{} is ready", self.name);
                    return Ok(());
                }
                Some(item) => debug!("ignoring {item} while waiting for ready"),
                None => {}
            }
        }
    }

    /// Takes the next received item, waiting up to `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::LinkLost`] when the reader has stopped and
    /// nothing is left in its buffer.
    pub fn get_message(&mut self, timeout: Duration) -> Result<Option<FrameItem>, TransportError> {
        let wait = if self.reader.is_running() {
            timeout
        } else {
            Duration::ZERO
        };
        match self.reader.get(wait) {
            Some(item) => {
                self.last_received = Some(item.timestamp);
                Ok(Some(item))
            }
            None if !self.reader.is_running() => Err(TransportError::LinkLost {
                reason: format!("reader for {} has stopped", self.name),
            }),
            None => Ok(None),
        }
    }

    /// Writes `payload` and waits for the module's verdict.
    ///
    /// With `terminated` set the payload is followed by the four-byte
    /// terminator used by the text configuration protocol.  Items other than
    /// `ok`/`fail` that arrive while waiting are discarded.
    ///
    /// # Errors
    ///
    /// [`TransportError::CommandRejected`] on `fail`,
    /// [`TransportError::AckTimeout`] when `timeout` elapses, and
    /// [`TransportError::LinkLost`] if the write fails or the reader stops.
    pub fn send_and_confirm(
        &mut self,
        payload: &[u8],
        terminated: bool,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        let mut data = Vec::with_capacity(payload.len() + TERMINATOR.len());
        data.extend_from_slice(payload);
        if terminated {
            data.extend_from_slice(&TERMINATOR);
        }
        self.sink
            .write_bytes(&data)
            .map_err(|e| TransportError::LinkLost {
                reason: format!("write to {} failed: {e}", self.name),
            })?;
        debug!("sent {} bytes to {}", data.len(), self.name);

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("no acknowledgement from {} within {timeout:?}", self.name);
                return Err(TransportError::AckTimeout(timeout));
            }
            match self.get_message(remaining.min(self.config.ack_poll))? {
                Some(item) if item.is_token(OK) => return Ok(()),
                Some(item) if item.is_token(FAIL) => {
                    warn!("{} rejected the command", self.name);
                    return Err(TransportError::CommandRejected);
                }
                Some(item) => debug!("skipping {item} while awaiting acknowledgement"),
                None => {}
            }
        }
    }

    /// Encodes and sends a binary message, waiting up to the configured
    /// acknowledgement timeout.
    ///
    /// # Errors
    ///
    /// As [`Self::send_and_confirm`], plus [`TransportError::Protocol`] if the
    /// message cannot be encoded.
    pub fn send_message(&mut self, msg: &HmtlMessage) -> Result<(), TransportError> {
        let bytes = encode_message(msg)?;
        self.send_and_confirm(&bytes, false, self.config.ack_timeout)
    }

    /// Sends a terminated text command such as `start` or `write`.
    ///
    /// # Errors
    ///
    /// As [`Self::send_and_confirm`].
    pub fn send_command(&mut self, command: &str) -> Result<(), TransportError> {
        debug!("command '{command}' to {}", self.name);
        self.send_and_confirm(command.as_bytes(), true, self.config.ack_timeout)
    }

    /// Sends one terminated configuration record.
    ///
    /// # Errors
    ///
    /// As [`Self::send_and_confirm`].
    pub fn send_config_record(&mut self, record: &ConfigRecord) -> Result<(), TransportError> {
        debug!("config record {:?} to {}", record.config_type(), self.name);
        self.send_and_confirm(&record.to_bytes(), true, self.config.ack_timeout)
    }

    /// Waits up to `wait` for a binary message from the module, discarding
    /// text lines that arrive first.
    ///
    /// Returns `Ok(None)` if nothing binary arrived in time.
    ///
    /// # Errors
    ///
    /// [`TransportError::LinkLost`] if the reader stops.
    pub fn get_data_message(&mut self, wait: Duration) -> Result<Option<FrameItem>, TransportError> {
        let deadline = Instant::now() + wait;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            match self.get_message(remaining.min(self.config.data_poll))? {
                Some(item) if item.is_hmtl => return Ok(Some(item)),
                Some(item) => debug!("skipping {item} while awaiting data"),
                None => {}
            }
        }
    }

    /// Arrival time of the most recently consumed item.
    pub fn last_received(&self) -> Option<Instant> {
        self.last_received
    }

    /// False once the reader thread has exited.
    pub fn is_alive(&self) -> bool {
        self.reader.is_running()
    }

    /// True if the link is dead or nothing has been consumed for `max_idle`.
    pub fn is_stale(&self, max_idle: Duration) -> bool {
        if !self.is_alive() {
            return true;
        }
        self.last_received
            .map_or(true, |at| at.elapsed() > max_idle)
    }

    /// Stops the reader thread and releases the link.
    pub fn close(mut self) {
        info!("closing {}", self.name);
        self.reader.stop();
    }
}
