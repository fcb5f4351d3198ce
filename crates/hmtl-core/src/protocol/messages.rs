//! All HMTL wire message types.
//!
//! Every binary message starts with the 8-byte [`MessageHeader`].  The header's
//! `mtype` byte decides what follows:
//!
//! ```text
//! OUTPUT       header + output_hdr(type, index) + VALUE | RGB | PROGRAM payload
//! POLL         header                              (request)
//!              header + poll response (15 bytes)   (module reply)
//! SET_ADDRESS  header + device_id:u16 + address:u16
//! DUMP_CONFIG  header                              (request)
//!              header + config records...          (module reply)
//! ```
//!
//! All multi-byte integers are little-endian.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{BaudRate, ConfigRecord};
use crate::protocol::program::ProgramPayload;

// ── Protocol constants ────────────────────────────────────────────────────────

/// First byte of every binary message; switches a frame reader into binary mode.
pub const START_CODE: u8 = 0xFC;

/// Protocol version written by the encoder.
pub const PROTOCOL_VERSION: u8 = 2;

/// Size of the common message header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Size of the output sub-header that follows the header of OUTPUT messages.
pub const OUTPUT_HEADER_SIZE: usize = 2;

/// The header's length field is one byte wide.
pub const MAX_MESSAGE_LEN: usize = u8::MAX as usize;

/// Destination address meaning "every module".
pub const BROADCAST_ADDRESS: u16 = 0xFFFF;

/// Output index meaning "every output on the addressed module".
pub const ALL_OUTPUTS: u8 = 254;

/// Size of the identity block carried by a poll response.
pub const POLL_RESPONSE_SIZE: usize = 15;

/// Size of the SET_ADDRESS payload.
pub const SET_ADDRESS_SIZE: usize = 4;

/// Total length of a POLL request.
pub const MSG_POLL_LEN: usize = HEADER_SIZE;
/// Total length of an OUTPUT/VALUE message.
pub const MSG_VALUE_LEN: usize = HEADER_SIZE + OUTPUT_HEADER_SIZE + 2;
/// Total length of an OUTPUT/RGB message.
pub const MSG_RGB_LEN: usize = HEADER_SIZE + OUTPUT_HEADER_SIZE + 3;
/// Total length of an OUTPUT/PROGRAM message.
pub const MSG_PROGRAM_LEN: usize = HEADER_SIZE + OUTPUT_HEADER_SIZE + ProgramPayload::WIRE_LEN;
/// Total length of a SET_ADDRESS message.
pub const MSG_SET_ADDRESS_LEN: usize = HEADER_SIZE + SET_ADDRESS_SIZE;

// ── Message type codes ────────────────────────────────────────────────────────

/// Message type codes carried in the header's `mtype` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    Output = 0x01,
    Poll = 0x02,
    SetAddress = 0x03,
    DumpConfig = 0x04,
}

impl TryFrom<u8> for MessageType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(MessageType::Output),
            0x02 => Ok(MessageType::Poll),
            0x03 => Ok(MessageType::SetAddress),
            0x04 => Ok(MessageType::DumpConfig),
            _ => Err(()),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageType::Output => "OUTPUT",
            MessageType::Poll => "POLL",
            MessageType::SetAddress => "SETADDR",
            MessageType::DumpConfig => "DUMPCONFIG",
        };
        f.write_str(name)
    }
}

// ── Header flags ──────────────────────────────────────────────────────────────

/// Bitset carried in the header's `flags` byte.
///
/// Unknown bits are preserved so a decode-then-encode pass is lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct MessageFlags(pub u8);

impl MessageFlags {
    /// Sender wants a transport acknowledgement.
    pub const ACK: u8 = 0x01;
    /// Sender wants a data response (poll, config dump).
    pub const RESPONSE: u8 = 0x02;
    /// Another fragment of the same response follows this one.
    pub const MORE_DATA: u8 = 0x04;
    /// The module reports an error for this exchange.
    pub const ERROR: u8 = 0x08;

    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    #[must_use]
    pub fn with(self, flag: u8) -> Self {
        Self(self.0 | flag)
    }
}

// ── Output type tags ──────────────────────────────────────────────────────────

/// Output-type tag used both in the output sub-header and as the config type of
/// per-output configuration records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OutputType {
    Value = 0x01,
    Rgb = 0x02,
    Program = 0x03,
    Pixels = 0x04,
    Mpr121 = 0x05,
    Rs485 = 0x06,
    Xbee = 0x07,
}

impl TryFrom<u8> for OutputType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(OutputType::Value),
            0x02 => Ok(OutputType::Rgb),
            0x03 => Ok(OutputType::Program),
            0x04 => Ok(OutputType::Pixels),
            0x05 => Ok(OutputType::Mpr121),
            0x06 => Ok(OutputType::Rs485),
            0x07 => Ok(OutputType::Xbee),
            _ => Err(()),
        }
    }
}

// ── Common message header ─────────────────────────────────────────────────────

/// 8-byte header at the front of every binary message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Reserved checksum byte; written as 0 and never verified.
    pub crc: u8,
    pub version: u8,
    /// Total message length, header included.
    pub length: u8,
    pub message_type: MessageType,
    pub flags: MessageFlags,
    /// Destination address, [`BROADCAST_ADDRESS`] for every module.
    pub address: u16,
}

/// Sub-header that immediately follows the header of OUTPUT messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputHeader {
    pub output_type: OutputType,
    /// Target output, or [`ALL_OUTPUTS`].
    pub output_index: u8,
}

// ── Per-message payload structs ───────────────────────────────────────────────

/// RGB colour triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Command carried by an OUTPUT message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputCommand {
    Value(i16),
    Rgb(Rgb),
    Program(ProgramPayload),
}

impl OutputCommand {
    pub fn output_type(&self) -> OutputType {
        match self {
            OutputCommand::Value(_) => OutputType::Value,
            OutputCommand::Rgb(_) => OutputType::Rgb,
            OutputCommand::Program(_) => OutputType::Program,
        }
    }
}

/// OUTPUT message body: which output to drive and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMessage {
    pub output_index: u8,
    pub command: OutputCommand,
}

impl OutputMessage {
    pub fn header(&self) -> OutputHeader {
        OutputHeader {
            output_type: self.command.output_type(),
            output_index: self.output_index,
        }
    }
}

/// Module identity returned in reply to a POLL.
///
/// Modules produce these; the host only ever decodes them from received bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResponse {
    pub magic: u8,
    pub protocol_version: u8,
    pub hardware_version: u8,
    pub baud: BaudRate,
    pub num_outputs: u8,
    pub flags: u8,
    pub device_id: u16,
    pub address: u16,
    /// Module-type code, see [`module_type_name`].
    pub object_type: u16,
    pub buffer_size: u16,
    pub msg_version: u8,
}

impl PollResponse {
    /// Column headings matching the rows produced by `Display`.
    pub fn table_header() -> String {
        format!(
            "{:<8} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8}",
            "device", "address", "protocol", "hardware", "baud", "outputs", "type"
        )
    }
}

impl fmt::Display for PollResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let module = match module_type_name(self.object_type) {
            Some(name) => name.to_string(),
            None => format!("unknown({})", self.object_type),
        };
        write!(
            f,
            "{:<8} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8}",
            self.device_id,
            self.address,
            self.protocol_version,
            self.hardware_version,
            self.baud.bps(),
            self.num_outputs,
            module
        )
    }
}

/// Human-readable name for a poll response `object_type` code.
pub fn module_type_name(code: u16) -> Option<&'static str> {
    match code {
        1 => Some("HMTL_Module"),
        2 => Some("WirelessPendant"),
        3 => Some("TriangleLightModule"),
        4 => Some("HMTL_Fire_Control"),
        _ => None,
    }
}

/// SET_ADDRESS body: the module with `device_id` takes on `address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAddressMessage {
    pub device_id: u16,
    pub address: u16,
}

// ── Top-level message ─────────────────────────────────────────────────────────

/// Typed body of a message, discriminated by the header's message type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageBody {
    Output(OutputMessage),
    /// Header-only POLL asking modules to identify themselves.
    PollRequest,
    PollResponse(PollResponse),
    SetAddress(SetAddressMessage),
    /// DUMP_CONFIG; empty for the request, configuration records in replies.
    DumpConfig(Vec<ConfigRecord>),
}

impl MessageBody {
    pub fn message_type(&self) -> MessageType {
        match self {
            MessageBody::Output(_) => MessageType::Output,
            MessageBody::PollRequest | MessageBody::PollResponse(_) => MessageType::Poll,
            MessageBody::SetAddress(_) => MessageType::SetAddress,
            MessageBody::DumpConfig(_) => MessageType::DumpConfig,
        }
    }
}

/// A complete HMTL message.
///
/// The header's length, version and checksum bytes are derived by the encoder
/// and are not stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmtlMessage {
    pub address: u16,
    pub flags: MessageFlags,
    pub body: MessageBody,
}

impl HmtlMessage {
    pub fn new(address: u16, body: MessageBody) -> Self {
        Self {
            address,
            flags: MessageFlags::default(),
            body,
        }
    }

    /// Sets one output to a signed value.
    pub fn value(address: u16, output_index: u8, value: i16) -> Self {
        Self::output(address, output_index, OutputCommand::Value(value))
    }

    /// Sets one output to a colour.
    pub fn rgb(address: u16, output_index: u8, rgb: Rgb) -> Self {
        Self::output(address, output_index, OutputCommand::Rgb(rgb))
    }

    /// Starts a program on one output.
    pub fn program(address: u16, output_index: u8, program: ProgramPayload) -> Self {
        Self::output(address, output_index, OutputCommand::Program(program))
    }

    pub fn output(address: u16, output_index: u8, command: OutputCommand) -> Self {
        Self::new(
            address,
            MessageBody::Output(OutputMessage {
                output_index,
                command,
            }),
        )
    }

    /// Discovery poll; modules reply with a [`PollResponse`].
    pub fn poll(address: u16) -> Self {
        Self::new(address, MessageBody::PollRequest).with_flags(MessageFlags::RESPONSE)
    }

    pub fn set_address(address: u16, device_id: u16, new_address: u16) -> Self {
        Self::new(
            address,
            MessageBody::SetAddress(SetAddressMessage {
                device_id,
                address: new_address,
            }),
        )
    }

    /// Asks a module to send back its stored configuration.
    pub fn dump_config(address: u16) -> Self {
        Self::new(address, MessageBody::DumpConfig(Vec::new())).with_flags(MessageFlags::RESPONSE)
    }

    #[must_use]
    pub fn with_flags(mut self, flag: u8) -> Self {
        self.flags = self.flags.with(flag);
        self
    }

    pub fn message_type(&self) -> MessageType {
        self.body.message_type()
    }
}
