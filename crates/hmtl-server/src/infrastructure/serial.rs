//! Serial port link to a module.

use std::io;
use std::time::Duration;

use hmtl_core::framing::ReaderSource;
use serialport::SerialPort;
use tracing::info;

use crate::infrastructure::transport::{
    SessionConfig, TransportError, TransportSession, WriteSink,
};

/// Read timeout on the port.  Short so the frame reader can notice a stop
/// request and drop half-received frames promptly.
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);

pub type SerialSource = ReaderSource<Box<dyn SerialPort>>;
pub type SerialSink = WriteSink<Box<dyn SerialPort>>;

/// Opens `device` at `baud` and splits it into reader and writer halves.
///
/// # Errors
///
/// [`TransportError::Open`] if the port cannot be opened or cloned.
pub fn open_port(device: &str, baud: u32) -> Result<(SerialSource, SerialSink), TransportError> {
    let open_err = |source: io::Error| TransportError::Open {
        device: device.to_string(),
        source,
    };

    let port = serialport::new(device, baud)
        .timeout(READ_TIMEOUT)
        .open()
        .map_err(|e| open_err(e.into()))?;
    let writer = port.try_clone().map_err(|e| open_err(e.into()))?;
    info!("opened {device} at {baud} baud");

    Ok((ReaderSource::new(port), WriteSink::new(writer)))
}

/// Opens `device` and blocks until the module on it reports ready.
///
/// # Errors
///
/// [`TransportError::Open`], [`TransportError::ReadyTimeout`] or
/// [`TransportError::LinkLost`].
pub fn open_session(
    device: &str,
    baud: u32,
    config: SessionConfig,
) -> Result<TransportSession, TransportError> {
    let (source, sink) = open_port(device, baud)?;
    TransportSession::open(device, source, sink, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_device_reports_device_name() {
        // Act
        let result = open_port("/dev/hmtl-does-not-exist", 57_600);

        // Assert
        match result {
            Err(TransportError::Open { device, .. }) => {
                assert_eq!(device, "/dev/hmtl-does-not-exist")
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("opening a missing device should fail"),
        }
    }
}
