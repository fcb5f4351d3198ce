//! Uploading configuration to a directly attached module.
//!
//! Configuration travels over the text command protocol rather than as
//! binary messages: each command and each configuration record is sent with
//! the four-byte terminator and must be answered with `ok` before the next
//! one goes out.
//!
//! ```text
//! full upload:    start, header, output..., end [, write]
//! single field:   read, start, <address|device_id|baud>, end [, write]
//! ```
//!
//! `read` loads the module's stored configuration into its working copy, so
//! a single-field update leaves every other setting as it was.  Nothing is
//! persisted to the module's EEPROM until `write`.

use hmtl_core::config::{BaudRate, ConfigRecord, ModuleConfig};
use hmtl_core::protocol::tokens::{END, PRINT, READ, START, WRITE};
use tracing::info;

use crate::infrastructure::transport::{TransportError, TransportSession};

pub struct ModuleConfigurator<'a> {
    session: &'a mut TransportSession,
}

impl<'a> ModuleConfigurator<'a> {
    pub fn new(session: &'a mut TransportSession) -> Self {
        Self { session }
    }

    /// Sends a complete configuration, optionally persisting it.
    ///
    /// # Errors
    ///
    /// The first [`TransportError`] from any step; later steps are not sent.
    pub fn upload(&mut self, config: &ModuleConfig, persist: bool) -> Result<(), TransportError> {
        info!(
            "uploading configuration for device {} ({} outputs)",
            config.header().device_id,
            config.outputs().len()
        );
        self.session.send_command(START)?;
        for record in config.to_records() {
            self.session.send_config_record(&record)?;
        }
        self.session.send_command(END)?;
        if persist {
            self.persist()?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// As [`Self::upload`].
    pub fn set_address(&mut self, address: u16) -> Result<(), TransportError> {
        info!("setting address to {address}");
        self.update_field(ConfigRecord::Address(address))
    }

    /// # Errors
    ///
    /// As [`Self::upload`].
    pub fn set_device_id(&mut self, device_id: u16) -> Result<(), TransportError> {
        info!("setting device id to {device_id}");
        self.update_field(ConfigRecord::DeviceId(device_id))
    }

    /// # Errors
    ///
    /// As [`Self::upload`].
    pub fn set_baud(&mut self, baud: BaudRate) -> Result<(), TransportError> {
        info!("setting baud to {}", baud.bps());
        self.update_field(ConfigRecord::Baud(baud))
    }

    fn update_field(&mut self, record: ConfigRecord) -> Result<(), TransportError> {
        self.session.send_command(READ)?;
        self.session.send_command(START)?;
        self.session.send_config_record(&record)?;
        self.session.send_command(END)
    }

    /// Reloads the module's stored configuration.
    ///
    /// # Errors
    ///
    /// As [`Self::upload`].
    pub fn read(&mut self) -> Result<(), TransportError> {
        self.session.send_command(READ)
    }

    /// Asks the module to print its working configuration on the link.
    ///
    /// # Errors
    ///
    /// As [`Self::upload`].
    pub fn print_config(&mut self) -> Result<(), TransportError> {
        self.session.send_command(PRINT)
    }

    /// Writes the working configuration to the module's EEPROM.
    ///
    /// # Errors
    ///
    /// As [`Self::upload`].
    pub fn persist(&mut self) -> Result<(), TransportError> {
        info!("persisting configuration");
        self.session.send_command(WRITE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::transport::fake::{FakeModule, Reply};
    use crate::infrastructure::transport::SessionConfig;
    use hmtl_core::config::ModuleConfigInput;
    use hmtl_core::protocol::tokens::TERMINATOR;
    use hmtl_core::protocol::WireMessage;
    use std::time::Duration;

    fn session(module: &FakeModule) -> TransportSession {
        let (source, sink) = module.link();
        TransportSession::attach(
            "config-test",
            source,
            sink,
            SessionConfig {
                ack_timeout: Duration::from_millis(300),
                ack_poll: Duration::from_millis(10),
                ..SessionConfig::default()
            },
        )
        .unwrap()
    }

    fn terminated(bytes: &[u8]) -> Vec<u8> {
        let mut out = bytes.to_vec();
        out.extend_from_slice(&TERMINATOR);
        out
    }

    fn sample_config() -> ModuleConfig {
        let input: ModuleConfigInput = serde_json::from_str(
            r#"{
                "header": {
                    "protocol_version": 2, "hardware_version": 3,
                    "address": 130, "device_id": 7, "baud": 57600
                },
                "outputs": [
                    { "type": "value", "pin": 9, "value": 0 },
                    { "type": "rgb", "pins": [10, 11, 13], "values": [0, 0, 0] }
                ]
            }"#,
        )
        .unwrap();
        input.validate().unwrap()
    }

    #[test]
    fn test_upload_sends_start_records_end_in_order() {
        // Arrange
        let module = FakeModule::new();
        let mut session = session(&module);
        let config = sample_config();

        // Act
        ModuleConfigurator::new(&mut session).upload(&config, false).unwrap();

        // Assert
        let mut expected = vec![terminated(START.as_bytes())];
        expected.extend(config.to_records().iter().map(|r| terminated(&r.to_bytes())));
        expected.push(terminated(END.as_bytes()));
        assert_eq!(module.written(), expected);
    }

    #[test]
    fn test_upload_with_persist_ends_with_write() {
        let module = FakeModule::new();
        let mut session = session(&module);

        ModuleConfigurator::new(&mut session)
            .upload(&sample_config(), true)
            .unwrap();

        let written = module.written();
        assert_eq!(written.last(), Some(&terminated(WRITE.as_bytes())));
        assert_eq!(written.len(), 6);
    }

    #[test]
    fn test_set_address_reads_before_updating() {
        // Arrange
        let module = FakeModule::new();
        let mut session = session(&module);

        // Act
        ModuleConfigurator::new(&mut session).set_address(131).unwrap();

        // Assert
        assert_eq!(
            module.written(),
            vec![
                terminated(READ.as_bytes()),
                terminated(START.as_bytes()),
                terminated(&ConfigRecord::Address(131).to_bytes()),
                terminated(END.as_bytes()),
            ]
        );
    }

    #[test]
    fn test_rejected_step_stops_upload() {
        // Arrange
        let module = FakeModule::new();
        module.set_reply(Reply::Fail);
        let mut session = session(&module);

        // Act
        let result = ModuleConfigurator::new(&mut session).upload(&sample_config(), true);

        // Assert
        assert!(matches!(result, Err(TransportError::CommandRejected)));
        assert_eq!(module.written(), vec![terminated(START.as_bytes())]);
    }

    #[test]
    fn test_print_config_sends_print_command() {
        let module = FakeModule::new();
        let mut session = session(&module);

        let mut configurator = ModuleConfigurator::new(&mut session);
        configurator.read().unwrap();
        configurator.print_config().unwrap();

        assert_eq!(
            module.written(),
            vec![terminated(READ.as_bytes()), terminated(PRINT.as_bytes())]
        );
    }
}
