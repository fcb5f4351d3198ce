//! Background discovery of modules on the link.
//!
//! The scanner walks an address range, sending a POLL to each address and
//! waiting briefly for a poll response.  Responders are recorded in a
//! [`DeviceRegistry`]; known modules that stop answering are marked inactive
//! but kept.
//!
//! Each poll holds the shared session lock for both the send and the reply
//! wait, so relay traffic cannot slip in between and steal the response.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hmtl_core::protocol::{encode_message, MessageBody, MessageType, PollResponse, ProtocolError};
use hmtl_core::HmtlMessage;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::infrastructure::transport::{with_session, SharedSession, TransportError};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("expected a poll response, got {0}")]
    UnexpectedReply(MessageType),
}

/// Scanner timing and address range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Pause between full scans.
    pub scan_period: Duration,
    /// Pause between consecutive addresses.
    pub address_period: Duration,
    pub addresses: Range<u16>,
    /// How long to wait for a poll response.
    pub data_wait: Duration,
    pub ack_timeout: Duration,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            scan_period: Duration::from_secs(60),
            address_period: Duration::from_millis(250),
            addresses: 120..150,
            data_wait: Duration::from_millis(250),
            ack_timeout: Duration::from_secs(10),
        }
    }
}

/// A module that has answered at least one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownModule {
    pub identity: PollResponse,
    pub active: bool,
    pub last_seen: Instant,
}

/// Modules found by the scanner, keyed by the address they answered on.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    modules: BTreeMap<u16, KnownModule>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a poll response.  Returns `true` if the address was new.
    pub fn record_response(&mut self, address: u16, identity: PollResponse) -> bool {
        let now = Instant::now();
        match self.modules.get_mut(&address) {
            Some(known) => {
                known.identity = identity;
                known.active = true;
                known.last_seen = now;
                false
            }
            None => {
                self.modules.insert(
                    address,
                    KnownModule {
                        identity,
                        active: true,
                        last_seen: now,
                    },
                );
                true
            }
        }
    }

    /// Marks a known module inactive.  Returns `true` if it was active.
    pub fn mark_silent(&mut self, address: u16) -> bool {
        match self.modules.get_mut(&address) {
            Some(known) if known.active => {
                known.active = false;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, address: u16) -> Option<&KnownModule> {
        self.modules.get(&address)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u16, &KnownModule)> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.modules.values().filter(|m| m.active).count()
    }
}

pub struct DeviceScanner {
    config: ScannerConfig,
    session: SharedSession,
    registry: Arc<RwLock<DeviceRegistry>>,
}

impl DeviceScanner {
    pub fn new(config: ScannerConfig, session: SharedSession) -> Self {
        Self {
            config,
            session,
            registry: Arc::new(RwLock::new(DeviceRegistry::new())),
        }
    }

    pub fn registry(&self) -> Arc<RwLock<DeviceRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Polls one address.  `Ok(None)` means nothing answered in time.
    ///
    /// # Errors
    ///
    /// [`ScanError::Transport`] if the poll is not acknowledged,
    /// [`ScanError::Protocol`] if the reply does not decode, and
    /// [`ScanError::UnexpectedReply`] if it is not a poll response.
    pub async fn poll_address(&self, address: u16) -> Result<Option<PollResponse>, ScanError> {
        let bytes = encode_message(&HmtlMessage::poll(address))?;
        let ack_timeout = self.config.ack_timeout;
        let data_wait = self.config.data_wait;

        let item = with_session(&self.session, move |s| {
            s.send_and_confirm(&bytes, false, ack_timeout)?;
            s.get_data_message(data_wait)
        })
        .await?;

        let Some(item) = item else {
            return Ok(None);
        };
        let msg = item.message()?;
        match msg.body {
            MessageBody::PollResponse(identity) => Ok(Some(identity)),
            _ => Err(ScanError::UnexpectedReply(msg.message_type())),
        }
    }

    /// Polls every configured address once.  Returns how many answered.
    pub async fn scan_once(&self) -> usize {
        debug!("starting scan of {:?}", self.config.addresses);
        let mut responders = 0;

        for address in self.config.addresses.clone() {
            match self.poll_address(address).await {
                Ok(Some(identity)) => {
                    responders += 1;
                    if self.registry.write().await.record_response(address, identity) {
                        info!("found module at {address}: {identity}");
                    }
                }
                Ok(None) => {
                    if self.registry.write().await.mark_silent(address) {
                        warn!("module at {address} stopped responding");
                    }
                }
                Err(e) => warn!("poll of {address} failed: {e}"),
            }
            if !self.config.address_period.is_zero() {
                tokio::time::sleep(self.config.address_period).await;
            }
        }

        let registry = self.registry.read().await;
        info!(
            "scan complete: {responders} responded, {} known, {} active",
            registry.len(),
            registry.active_count()
        );
        responders
    }

    /// Scans forever, pausing `scan_period` between passes.
    pub async fn run(self) {
        info!("device scanner started");
        loop {
            self.scan_once().await;
            tokio::time::sleep(self.config.scan_period).await;
        }
    }

    /// Starts [`Self::run`] on the runtime.  Abort the handle to stop it.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::transport::fake::{sample_identity, FakeModule, Reply};
    use crate::infrastructure::transport::{shared, SessionConfig, TransportSession};

    fn scanner(module: &FakeModule, addresses: Range<u16>) -> DeviceScanner {
        let (source, sink) = module.link();
        let session = TransportSession::attach(
            "scan-test",
            source,
            sink,
            SessionConfig {
                ack_poll: Duration::from_millis(10),
                data_poll: Duration::from_millis(10),
                ..SessionConfig::default()
            },
        )
        .unwrap();
        DeviceScanner::new(
            ScannerConfig {
                addresses,
                address_period: Duration::ZERO,
                data_wait: Duration::from_millis(80),
                ack_timeout: Duration::from_millis(300),
                ..ScannerConfig::default()
            },
            shared(session),
        )
    }

    // ── DeviceRegistry ───────────────────────────────────────────────────────

    #[test]
    fn test_registry_reports_new_then_refresh() {
        let mut registry = DeviceRegistry::new();

        assert!(registry.record_response(130, sample_identity(1, 130)));
        assert!(!registry.record_response(130, sample_identity(1, 130)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_marks_silent_module_inactive_once() {
        // Arrange
        let mut registry = DeviceRegistry::new();
        registry.record_response(130, sample_identity(1, 130));

        // Act
        let first = registry.mark_silent(130);
        let second = registry.mark_silent(130);

        // Assert
        assert!(first);
        assert!(!second);
        assert_eq!(registry.active_count(), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_ignores_silence_from_unknown_address() {
        let mut registry = DeviceRegistry::new();
        assert!(!registry.mark_silent(5));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_reactivates_module_that_answers_again() {
        let mut registry = DeviceRegistry::new();
        registry.record_response(130, sample_identity(1, 130));
        registry.mark_silent(130);

        registry.record_response(130, sample_identity(1, 130));

        assert!(registry.get(130).map_or(false, |m| m.active));
    }

    // ── DeviceScanner ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_poll_address_returns_identity() {
        // Arrange
        let module = FakeModule::new();
        module.add_module(sample_identity(42, 121));
        let scanner = scanner(&module, 120..123);

        // Act
        let found = scanner.poll_address(121).await.unwrap();

        // Assert
        assert_eq!(found, Some(sample_identity(42, 121)));
    }

    #[tokio::test]
    async fn test_poll_address_returns_none_for_silent_address() {
        let module = FakeModule::new();
        let scanner = scanner(&module, 120..123);

        assert_eq!(scanner.poll_address(120).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_scan_once_records_responders_and_marks_departures() {
        // Arrange
        let module = FakeModule::new();
        module.add_module(sample_identity(1, 120));
        module.add_module(sample_identity(2, 122));
        let scanner = scanner(&module, 120..123);

        // Act
        let first = scanner.scan_once().await;
        module.remove_module(122);
        let second = scanner.scan_once().await;

        // Assert
        assert_eq!(first, 2);
        assert_eq!(second, 1);
        let registry = scanner.registry();
        let registry = registry.read().await;
        assert_eq!(registry.len(), 2);
        assert!(registry.get(120).map_or(false, |m| m.active));
        assert!(registry.get(122).map_or(false, |m| !m.active));
    }

    #[tokio::test]
    async fn test_scan_continues_past_failed_polls() {
        let module = FakeModule::new();
        module.set_reply(Reply::Fail);
        let scanner = scanner(&module, 120..123);

        let responders = scanner.scan_once().await;

        assert_eq!(responders, 0);
        assert_eq!(module.written().len(), 3);
    }
}
