//! # hmtl-core
//!
//! Shared library for HMTL containing the wire protocol codec, module
//! configuration records, and the byte-stream framing used on serial links.
//!
//! This crate is used by both the relay server and the remote client.
//! It has no dependencies on serial ports, sockets, or async runtimes.
//!
//! # Architecture overview (for beginners)
//!
//! HMTL modules are small embedded boards driving lights and reading sensors.
//! A host talks to one of them over a serial cable; that module may forward
//! messages to others over a radio link.  A relay server owns the serial
//! cable and lets remote tools send commands over TCP.
//!
//! This crate is the shared foundation.  It defines:
//!
//! - **`protocol`** – How commands look on the wire.  Every binary message is
//!   an 8-byte header followed by a typed body, encoded little-endian.
//!
//! - **`config`** – The records a module stores as its configuration, and the
//!   validation that turns a human-written description into those records.
//!
//! - **`framing`** – How a raw byte stream is cut into messages and text
//!   lines, and the bounded buffer that holds them until someone reads them.
//!
//! - **`relay`** – Length-prefixed items on the TCP channel between the relay
//!   server and its clients.

pub mod config;
pub mod framing;
pub mod protocol;
pub mod relay;

// Re-export the most-used types at the crate root so callers can write
// `hmtl_core::HmtlMessage` instead of `hmtl_core::protocol::messages::HmtlMessage`.
pub use config::{ConfigRecord, ConfigValidationError, ModuleConfig, ModuleConfigInput};
pub use framing::{ByteSource, FrameItem, FrameReader, FrameReaderConfig, RingBuffer};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::HmtlMessage;
pub use relay::{encode_relay_item, RelayItem, RelayItemDecoder};
