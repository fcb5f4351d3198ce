//! Binary codec for encoding and decoding HMTL protocol messages.
//!
//! Wire format:
//! ```text
//! [startcode:1=0xFC][crc:1][version:1][length:1][mtype:1][flags:1][address:2][body:N]
//! ```
//! Total header size: 8 bytes.  `length` counts the header as well as the body.
//! All multi-byte integers are little-endian.
//!
//! Decoding is two-stage: the header is decoded first, then `mtype` selects
//! the decoder for the body.  The body decoder must consume exactly
//! `length - 8` bytes, otherwise the message is rejected.

use thiserror::Error;

use crate::config::{BaudRate, ConfigRecord};
use crate::protocol::messages::{
    HmtlMessage, MessageBody, MessageFlags, MessageHeader, MessageType, OutputCommand,
    OutputHeader, OutputMessage, OutputType, PollResponse, Rgb, SetAddressMessage, HEADER_SIZE,
    MAX_MESSAGE_LEN, OUTPUT_HEADER_SIZE, POLL_RESPONSE_SIZE, PROTOCOL_VERSION, SET_ADDRESS_SIZE,
    START_CODE,
};
use crate::protocol::program::{ProgramPayload, PROGRAM_PARAMS_LEN};

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the format requires.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The first byte of a message is not [`START_CODE`].
    #[error("bad start code: 0x{0:02X}")]
    BadStartCode(u8),

    /// The header's `mtype` byte is not a recognised message type.
    #[error("unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// An output sub-header names an unknown output type.
    #[error("unknown output type: 0x{0:02X}")]
    UnknownOutputType(u8),

    /// A configuration record names an unknown config type.
    #[error("unknown config type: 0x{0:02X}")]
    UnknownConfigType(u8),

    /// The bytes are the right size but the content is not valid.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The header's length field disagrees with what the body decodes to.
    #[error("length mismatch: header declares {declared} bytes, body decodes to {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// Encode-time: the value does not fit its wire field.
    #[error("oversized payload: {len} bytes exceeds the maximum of {max}")]
    OversizedPayload { len: usize, max: usize },
}

impl ProtocolError {
    /// True for decode-time errors caused by bad input bytes.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, ProtocolError::OversizedPayload { .. })
    }
}

// ── WireMessage capability ────────────────────────────────────────────────────

/// A fixed-format struct that can be written to and parsed from the wire.
///
/// `decode` parses the struct at `offset` in `bytes` and returns the value
/// together with the number of bytes consumed.
pub trait WireMessage: Sized {
    /// Number of bytes `encode_into` appends.
    fn wire_len(&self) -> usize;

    /// Appends the encoded form to `buf`.
    fn encode_into(&self, buf: &mut Vec<u8>);

    /// Parses one value starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if fewer bytes are available than the format
    /// requires or a type tag is out of range.
    fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize), ProtocolError>;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.wire_len());
        self.encode_into(&mut buf);
        buf
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes an [`HmtlMessage`] including its 8-byte header.
///
/// The header's `length` is computed from the emitted bytes.
///
/// # Errors
///
/// Returns [`ProtocolError::OversizedPayload`] if the message would exceed the
/// 255 bytes the length field can describe.
///
/// # Examples
///
/// ```rust
/// use hmtl_core::protocol::{decode_message, encode_message, HmtlMessage};
///
/// let msg = HmtlMessage::value(0x0040, 1, -300);
/// let bytes = encode_message(&msg).unwrap();
/// let (decoded, consumed) = decode_message(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_message(msg: &HmtlMessage) -> Result<Vec<u8>, ProtocolError> {
    let mut body = Vec::new();
    encode_body(&msg.body, &mut body);

    let total = HEADER_SIZE + body.len();
    if total > MAX_MESSAGE_LEN {
        return Err(ProtocolError::OversizedPayload {
            len: total,
            max: MAX_MESSAGE_LEN,
        });
    }

    let header = MessageHeader {
        crc: 0,
        version: PROTOCOL_VERSION,
        length: total as u8,
        message_type: msg.message_type(),
        flags: msg.flags,
        address: msg.address,
    };

    let mut buf = Vec::with_capacity(total);
    header.encode_into(&mut buf);
    buf.extend_from_slice(&body);
    Ok(buf)
}

/// Decodes one [`HmtlMessage`] from the beginning of `bytes`.
///
/// Returns the message and the number of bytes consumed, which always equals
/// the header's `length` field.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are truncated or malformed.
pub fn decode_message(bytes: &[u8]) -> Result<(HmtlMessage, usize), ProtocolError> {
    let (header, _) = decode_header(bytes)?;

    let total = header.length as usize;
    if total < HEADER_SIZE {
        return Err(ProtocolError::LengthMismatch {
            declared: total,
            actual: HEADER_SIZE,
        });
    }
    if bytes.len() < total {
        return Err(ProtocolError::InsufficientData {
            needed: total,
            available: bytes.len(),
        });
    }

    let body = decode_body(&header, &bytes[HEADER_SIZE..total])?;
    Ok((
        HmtlMessage {
            address: header.address,
            flags: header.flags,
            body,
        },
        total,
    ))
}

/// Decodes only the 8-byte header at the start of `bytes`.
///
/// # Errors
///
/// Returns [`ProtocolError`] on a short buffer, bad start code or unknown
/// message type.
pub fn decode_header(bytes: &[u8]) -> Result<(MessageHeader, usize), ProtocolError> {
    MessageHeader::decode(bytes, 0)
}

/// Reads the declared total length from a buffered header without validating
/// the rest of it.
///
/// Returns `None` until a full header starting with [`START_CODE`] is present.
pub fn peek_declared_length(bytes: &[u8]) -> Option<usize> {
    if bytes.len() < HEADER_SIZE || bytes[0] != START_CODE {
        return None;
    }
    Some(bytes[3] as usize)
}

// ── Body encoding / decoding ──────────────────────────────────────────────────

fn encode_body(body: &MessageBody, buf: &mut Vec<u8>) {
    match body {
        MessageBody::Output(m) => m.encode_into(buf),
        MessageBody::PollRequest => {} // header only
        MessageBody::PollResponse(m) => m.encode_into(buf),
        MessageBody::SetAddress(m) => m.encode_into(buf),
        MessageBody::DumpConfig(records) => {
            for record in records {
                record.encode_into(buf);
            }
        }
    }
}

fn decode_body(header: &MessageHeader, payload: &[u8]) -> Result<MessageBody, ProtocolError> {
    match header.message_type {
        MessageType::Output => {
            let (msg, used) = OutputMessage::decode(payload, 0)?;
            require_consumed(header, used, payload.len())?;
            Ok(MessageBody::Output(msg))
        }
        MessageType::Poll => match payload.len() {
            0 => Ok(MessageBody::PollRequest),
            POLL_RESPONSE_SIZE => {
                let (msg, _) = PollResponse::decode(payload, 0)?;
                Ok(MessageBody::PollResponse(msg))
            }
            other => Err(ProtocolError::MalformedPayload(format!(
                "poll body of {other} bytes is neither a request nor a response"
            ))),
        },
        MessageType::SetAddress => {
            let (msg, used) = SetAddressMessage::decode(payload, 0)?;
            require_consumed(header, used, payload.len())?;
            Ok(MessageBody::SetAddress(msg))
        }
        MessageType::DumpConfig => {
            let mut records = Vec::new();
            let mut pos = 0;
            while pos < payload.len() {
                let (record, used) = ConfigRecord::decode(payload, pos)?;
                records.push(record);
                pos += used;
            }
            Ok(MessageBody::DumpConfig(records))
        }
    }
}

fn require_consumed(
    header: &MessageHeader,
    used: usize,
    available: usize,
) -> Result<(), ProtocolError> {
    if used != available {
        return Err(ProtocolError::LengthMismatch {
            declared: header.length as usize,
            actual: HEADER_SIZE + used,
        });
    }
    Ok(())
}

// ── Fixed-format structs ──────────────────────────────────────────────────────

impl WireMessage for MessageHeader {
    fn wire_len(&self) -> usize {
        HEADER_SIZE
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(START_CODE);
        buf.push(self.crc);
        buf.push(self.version);
        buf.push(self.length);
        buf.push(self.message_type as u8);
        buf.push(self.flags.0);
        buf.extend_from_slice(&self.address.to_le_bytes());
    }

    fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize), ProtocolError> {
        let mut r = WireReader::new(bytes, offset);
        let start = r.u8()?;
        if start != START_CODE {
            return Err(ProtocolError::BadStartCode(start));
        }
        let crc = r.u8()?;
        let version = r.u8()?;
        let length = r.u8()?;
        let mtype = r.u8()?;
        let flags = MessageFlags(r.u8()?);
        let address = r.u16()?;
        let message_type =
            MessageType::try_from(mtype).map_err(|_| ProtocolError::UnknownMessageType(mtype))?;
        Ok((
            MessageHeader {
                crc,
                version,
                length,
                message_type,
                flags,
                address,
            },
            r.consumed(),
        ))
    }
}

impl WireMessage for OutputHeader {
    fn wire_len(&self) -> usize {
        OUTPUT_HEADER_SIZE
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.output_type as u8);
        buf.push(self.output_index);
    }

    fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize), ProtocolError> {
        let mut r = WireReader::new(bytes, offset);
        let tag = r.u8()?;
        let output_index = r.u8()?;
        let output_type =
            OutputType::try_from(tag).map_err(|_| ProtocolError::UnknownOutputType(tag))?;
        Ok((
            OutputHeader {
                output_type,
                output_index,
            },
            r.consumed(),
        ))
    }
}

impl WireMessage for ProgramPayload {
    fn wire_len(&self) -> usize {
        Self::WIRE_LEN
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.code);
        buf.extend_from_slice(&self.params);
    }

    fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize), ProtocolError> {
        let mut r = WireReader::new(bytes, offset);
        let code = r.u8()?;
        let params = r.array::<PROGRAM_PARAMS_LEN>()?;
        Ok((ProgramPayload { code, params }, r.consumed()))
    }
}

impl WireMessage for OutputMessage {
    fn wire_len(&self) -> usize {
        OUTPUT_HEADER_SIZE
            + match &self.command {
                OutputCommand::Value(_) => 2,
                OutputCommand::Rgb(_) => 3,
                OutputCommand::Program(p) => p.wire_len(),
            }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        self.header().encode_into(buf);
        match &self.command {
            OutputCommand::Value(v) => buf.extend_from_slice(&v.to_le_bytes()),
            OutputCommand::Rgb(rgb) => buf.extend_from_slice(&rgb.to_array()),
            OutputCommand::Program(p) => p.encode_into(buf),
        }
    }

    fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize), ProtocolError> {
        let (header, used) = OutputHeader::decode(bytes, offset)?;
        let mut r = WireReader::new(bytes, offset + used);
        let command = match header.output_type {
            OutputType::Value => OutputCommand::Value(r.i16()?),
            OutputType::Rgb => {
                let [red, green, blue] = r.array::<3>()?;
                OutputCommand::Rgb(Rgb::new(red, green, blue))
            }
            OutputType::Program => {
                let (program, n) = ProgramPayload::decode(bytes, offset + used)?;
                r.skip(n)?;
                OutputCommand::Program(program)
            }
            other => {
                return Err(ProtocolError::MalformedPayload(format!(
                    "output type {other:?} carries no output command"
                )))
            }
        };
        Ok((
            OutputMessage {
                output_index: header.output_index,
                command,
            },
            used + r.consumed(),
        ))
    }
}

impl WireMessage for PollResponse {
    fn wire_len(&self) -> usize {
        POLL_RESPONSE_SIZE
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.magic);
        buf.push(self.protocol_version);
        buf.push(self.hardware_version);
        buf.push(self.baud.raw());
        buf.push(self.num_outputs);
        buf.push(self.flags);
        buf.extend_from_slice(&self.device_id.to_le_bytes());
        buf.extend_from_slice(&self.address.to_le_bytes());
        buf.extend_from_slice(&self.object_type.to_le_bytes());
        buf.extend_from_slice(&self.buffer_size.to_le_bytes());
        buf.push(self.msg_version);
    }

    fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize), ProtocolError> {
        let mut r = WireReader::new(bytes, offset);
        let msg = PollResponse {
            magic: r.u8()?,
            protocol_version: r.u8()?,
            hardware_version: r.u8()?,
            baud: BaudRate::from_raw(r.u8()?),
            num_outputs: r.u8()?,
            flags: r.u8()?,
            device_id: r.u16()?,
            address: r.u16()?,
            object_type: r.u16()?,
            buffer_size: r.u16()?,
            msg_version: r.u8()?,
        };
        Ok((msg, r.consumed()))
    }
}

impl WireMessage for SetAddressMessage {
    fn wire_len(&self) -> usize {
        SET_ADDRESS_SIZE
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.device_id.to_le_bytes());
        buf.extend_from_slice(&self.address.to_le_bytes());
    }

    fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize), ProtocolError> {
        let mut r = WireReader::new(bytes, offset);
        let device_id = r.u16()?;
        let address = r.u16()?;
        Ok((SetAddressMessage { device_id, address }, r.consumed()))
    }
}

// ── Reader helper ─────────────────────────────────────────────────────────────

/// Bounds-checked little-endian cursor over a byte slice.
pub(crate) struct WireReader<'a> {
    buf: &'a [u8],
    start: usize,
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub(crate) fn new(buf: &'a [u8], offset: usize) -> Self {
        Self {
            buf,
            start: offset,
            pos: offset,
        }
    }

    /// Bytes read since construction.
    pub(crate) fn consumed(&self) -> usize {
        self.pos - self.start
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        let end = self.pos + n;
        if end > self.buf.len() {
            return Err(ProtocolError::InsufficientData {
                needed: end,
                available: self.buf.len(),
            });
        }
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<(), ProtocolError> {
        self.take(n).map(|_| ())
    }

    pub(crate) fn u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, ProtocolError> {
        Ok(u16::from_le_bytes(self.array::<2>()?))
    }

    pub(crate) fn i16(&mut self) -> Result<i16, ProtocolError> {
        Ok(i16::from_le_bytes(self.array::<2>()?))
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::*;

    fn round_trip(msg: &HmtlMessage) -> HmtlMessage {
        let encoded = encode_message(msg).expect("encode failed");
        let (decoded, consumed) = decode_message(&encoded).expect("decode failed");
        assert_eq!(consumed, encoded.len(), "consumed bytes should equal total encoded size");
        assert_eq!(encoded[3] as usize, encoded.len(), "length field should match emitted size");
        decoded
    }

    // ── Header layout ────────────────────────────────────────────────────────

    #[test]
    fn test_value_message_byte_layout() {
        // Arrange
        let msg = HmtlMessage::value(0x1234, 2, -2);

        // Act
        let bytes = encode_message(&msg).unwrap();

        // Assert
        assert_eq!(
            bytes,
            vec![0xFC, 0x00, 0x02, 12, 0x01, 0x00, 0x34, 0x12, 0x01, 0x02, 0xFE, 0xFF]
        );
    }

    #[test]
    fn test_fixed_message_lengths() {
        let rgb = HmtlMessage::rgb(1, 0, Rgb::new(1, 2, 3));
        let program = HmtlMessage::program(1, 0, ProgramPayload::none());
        let set_addr = HmtlMessage::set_address(1, 7, 8);

        assert_eq!(encode_message(&HmtlMessage::poll(1)).unwrap().len(), MSG_POLL_LEN);
        assert_eq!(encode_message(&HmtlMessage::value(1, 0, 0)).unwrap().len(), MSG_VALUE_LEN);
        assert_eq!(encode_message(&rgb).unwrap().len(), MSG_RGB_LEN);
        assert_eq!(encode_message(&program).unwrap().len(), MSG_PROGRAM_LEN);
        assert_eq!(encode_message(&set_addr).unwrap().len(), MSG_SET_ADDRESS_LEN);
        assert_eq!(MSG_PROGRAM_LEN, 43);
    }

    #[test]
    fn test_poll_request_sets_response_flag() {
        let bytes = encode_message(&HmtlMessage::poll(BROADCAST_ADDRESS)).unwrap();
        assert_eq!(bytes[5], MessageFlags::RESPONSE);
        assert_eq!(&bytes[6..8], &[0xFF, 0xFF]);
    }

    #[test]
    fn test_crc_is_written_as_zero() {
        let bytes = encode_message(&HmtlMessage::rgb(3, 1, Rgb::new(9, 9, 9))).unwrap();
        assert_eq!(bytes[1], 0);
    }

    // ── Round trips at boundary values ───────────────────────────────────────

    #[test]
    fn test_broadcast_all_outputs_round_trip() {
        let msg = HmtlMessage::value(BROADCAST_ADDRESS, ALL_OUTPUTS, i16::MIN);
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn test_program_with_full_parameter_block_round_trip() {
        let params: Vec<u8> = (0..32).collect();
        let program = ProgramPayload::new(0x42, &params).unwrap();
        let msg = HmtlMessage::program(0, 3, program);
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn test_unknown_flag_bits_are_preserved() {
        let msg = HmtlMessage::value(5, 0, 1).with_flags(0x80 | MessageFlags::ACK);
        assert_eq!(round_trip(&msg).flags, MessageFlags(0x81));
    }

    // ── Decode errors ────────────────────────────────────────────────────────

    #[test]
    fn test_decode_rejects_short_header() {
        let err = decode_message(&[0xFC, 0, 2, 8]).unwrap_err();
        assert_eq!(err, ProtocolError::InsufficientData { needed: 5, available: 4 });
        assert!(err.is_malformed());
    }

    #[test]
    fn test_decode_rejects_bad_start_code() {
        let err = decode_message(&[0xAB, 0, 2, 8, 2, 0, 0, 0]).unwrap_err();
        assert_eq!(err, ProtocolError::BadStartCode(0xAB));
    }

    #[test]
    fn test_decode_rejects_unknown_message_type() {
        let err = decode_message(&[0xFC, 0, 2, 8, 0x77, 0, 0, 0]).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownMessageType(0x77));
    }

    #[test]
    fn test_decode_rejects_body_shorter_than_declared_length() {
        // Arrange: a VALUE message cut off after the output sub-header.
        let bytes = encode_message(&HmtlMessage::value(1, 0, 10)).unwrap();

        // Act
        let err = decode_message(&bytes[..10]).unwrap_err();

        // Assert
        assert_eq!(err, ProtocolError::InsufficientData { needed: 12, available: 10 });
    }

    #[test]
    fn test_decode_rejects_trailing_bytes_inside_declared_length() {
        // Arrange: VALUE message with one stray byte counted by the length field.
        let mut bytes = encode_message(&HmtlMessage::value(1, 0, 10)).unwrap();
        bytes.push(0x00);
        bytes[3] = 13;

        // Act
        let err = decode_message(&bytes).unwrap_err();

        // Assert
        assert_eq!(err, ProtocolError::LengthMismatch { declared: 13, actual: 12 });
    }

    #[test]
    fn test_decode_ignores_bytes_past_declared_length() {
        let mut bytes = encode_message(&HmtlMessage::poll(4)).unwrap();
        bytes.extend_from_slice(&[1, 2, 3]);
        let (_, consumed) = decode_message(&bytes).unwrap();
        assert_eq!(consumed, MSG_POLL_LEN);
    }

    #[test]
    fn test_decode_rejects_length_below_header_size() {
        let err = decode_message(&[0xFC, 0, 2, 4, 2, 0, 0, 0]).unwrap_err();
        assert_eq!(err, ProtocolError::LengthMismatch { declared: 4, actual: 8 });
    }

    #[test]
    fn test_decode_rejects_unknown_output_type() {
        let mut bytes = encode_message(&HmtlMessage::value(1, 0, 10)).unwrap();
        bytes[8] = 0x99;
        assert_eq!(decode_message(&bytes).unwrap_err(), ProtocolError::UnknownOutputType(0x99));
    }

    #[test]
    fn test_decode_rejects_output_type_without_command() {
        // Arrange: a PIXELS sub-header in an OUTPUT message.
        let mut bytes = encode_message(&HmtlMessage::value(1, 0, 10)).unwrap();
        bytes[8] = OutputType::Pixels as u8;

        // Act
        let err = decode_message(&bytes).unwrap_err();

        // Assert
        assert!(matches!(err, ProtocolError::MalformedPayload(_)));
    }

    #[test]
    fn test_decode_rejects_poll_with_odd_length() {
        let mut bytes = encode_message(&HmtlMessage::poll(4)).unwrap();
        bytes.extend_from_slice(&[0; 3]);
        bytes[3] = 11;
        assert!(matches!(
            decode_message(&bytes).unwrap_err(),
            ProtocolError::MalformedPayload(_)
        ));
    }

    #[test]
    fn test_decode_preserves_foreign_version() {
        let mut bytes = encode_message(&HmtlMessage::poll(4)).unwrap();
        bytes[2] = 9;
        let (header, _) = decode_header(&bytes).unwrap();
        assert_eq!(header.version, 9);
        assert!(decode_message(&bytes).is_ok());
    }

    // ── Encode errors ────────────────────────────────────────────────────────

    #[test]
    fn test_encode_rejects_message_longer_than_length_field() {
        // Arrange: enough config records to push the message past 255 bytes.
        let records = vec![ConfigRecord::Address(1); 70];
        let msg = HmtlMessage::new(1, MessageBody::DumpConfig(records));

        // Act
        let err = encode_message(&msg).unwrap_err();

        // Assert
        assert_eq!(err, ProtocolError::OversizedPayload { len: 8 + 70 * 4, max: 255 });
        assert!(!err.is_malformed());
    }

    // ── peek_declared_length ─────────────────────────────────────────────────

    #[test]
    fn test_peek_declared_length_needs_full_header() {
        let bytes = encode_message(&HmtlMessage::rgb(1, 0, Rgb::default())).unwrap();
        assert_eq!(peek_declared_length(&bytes[..7]), None);
        assert_eq!(peek_declared_length(&bytes[..8]), Some(MSG_RGB_LEN));
    }
}
