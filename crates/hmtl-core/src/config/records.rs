//! Module configuration records and their wire encoding.
//!
//! Every record starts with `[0xFD][configtype]`.  Per-output records carry an
//! output sub-header next, whose type must agree with the config type:
//!
//! ```text
//! header     FD 00 magic proto hw baud num_outputs flags device_id:2 address:2
//! output     FD tt tt index <type-specific body>
//! address    FD E0 address:2
//! device_id  FD E1 device_id:2
//! baud       FD E2 baud
//! ```

use serde::{Deserialize, Serialize};

use crate::config::validate::ConfigValidationError;
use crate::protocol::codec::{ProtocolError, WireMessage, WireReader};
use crate::protocol::messages::{OutputHeader, OutputType, OUTPUT_HEADER_SIZE};

/// First byte of every configuration record.
pub const CONFIG_START: u8 = 0xFD;

/// Magic byte at the front of a configuration header.
pub const CONFIG_MAGIC: u8 = 0x5C;

/// Number of touch channels on an MPR121 sensor.
pub const MPR121_CHANNELS: usize = 12;

/// Number of values stored for a program output.
pub const PROGRAM_CONFIG_VALUES: usize = 12;

// ── Config type tags ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ConfigType {
    Header = 0x00,
    Value = 0x01,
    Rgb = 0x02,
    Program = 0x03,
    Pixels = 0x04,
    Mpr121 = 0x05,
    Rs485 = 0x06,
    Xbee = 0x07,
    /// Single-field update of the module address.
    Address = 0xE0,
    /// Single-field update of the device id.
    DeviceId = 0xE1,
    /// Single-field update of the baud rate.
    Baud = 0xE2,
}

impl TryFrom<u8> for ConfigType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x00 => Ok(ConfigType::Header),
            0x01 => Ok(ConfigType::Value),
            0x02 => Ok(ConfigType::Rgb),
            0x03 => Ok(ConfigType::Program),
            0x04 => Ok(ConfigType::Pixels),
            0x05 => Ok(ConfigType::Mpr121),
            0x06 => Ok(ConfigType::Rs485),
            0x07 => Ok(ConfigType::Xbee),
            0xE0 => Ok(ConfigType::Address),
            0xE1 => Ok(ConfigType::DeviceId),
            0xE2 => Ok(ConfigType::Baud),
            _ => Err(()),
        }
    }
}

impl From<OutputType> for ConfigType {
    fn from(t: OutputType) -> Self {
        match t {
            OutputType::Value => ConfigType::Value,
            OutputType::Rgb => ConfigType::Rgb,
            OutputType::Program => ConfigType::Program,
            OutputType::Pixels => ConfigType::Pixels,
            OutputType::Mpr121 => ConfigType::Mpr121,
            OutputType::Rs485 => ConfigType::Rs485,
            OutputType::Xbee => ConfigType::Xbee,
        }
    }
}

// ── Baud rate ─────────────────────────────────────────────────────────────────

/// Baud rate as carried on the wire: bits per second divided by 1200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaudRate(u8);

impl BaudRate {
    /// Granularity of the one-byte encoding.
    pub const UNIT: u32 = 1200;

    /// # Errors
    ///
    /// Returns [`ConfigValidationError::InvalidBaud`] unless `bps` is a
    /// non-zero multiple of 1200 whose quotient fits in one byte.
    pub fn from_bps(bps: u32) -> Result<Self, ConfigValidationError> {
        if bps == 0 || bps % Self::UNIT != 0 {
            return Err(ConfigValidationError::InvalidBaud(bps));
        }
        u8::try_from(bps / Self::UNIT)
            .map(Self)
            .map_err(|_| ConfigValidationError::InvalidBaud(bps))
    }

    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub fn bps(self) -> u32 {
        u32::from(self.0) * Self::UNIT
    }
}

// ── Header record ─────────────────────────────────────────────────────────────

/// Persisted module identity and settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigHeader {
    pub magic: u8,
    pub protocol_version: u8,
    pub hardware_version: u8,
    pub baud: BaudRate,
    pub num_outputs: u8,
    pub flags: u8,
    pub device_id: u16,
    pub address: u16,
}

impl ConfigHeader {
    pub const WIRE_LEN: usize = 10;
}

impl WireMessage for ConfigHeader {
    fn wire_len(&self) -> usize {
        Self::WIRE_LEN
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
    }

    fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize), ProtocolError> {
        let mut r = WireReader::new(bytes, offset);
        let header = ConfigHeader {
            magic: r.u8()?,
            protocol_version: r.u8()?,
            hardware_version: r.u8()?,
            baud: BaudRate::from_raw(r.u8()?),
            num_outputs: r.u8()?,
            flags: r.u8()?,
            device_id: r.u16()?,
            address: r.u16()?,
        };
        Ok((header, r.consumed()))
    }
}

// ── Per-output records ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueConfig {
    pub pin: u8,
    pub value: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbConfig {
    pub pins: [u8; 3],
    pub values: [u8; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramConfig {
    pub values: [i16; PROGRAM_CONFIG_VALUES],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelsConfig {
    pub clock_pin: u8,
    pub data_pin: u8,
    pub num_pixels: u16,
    pub rgb_type: u8,
}

/// Touch sensor wiring; each threshold byte is `(release << 4) | trigger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mpr121Config {
    pub irq_pin: u8,
    pub use_interrupt: bool,
    pub thresholds: [u8; MPR121_CHANNELS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rs485Config {
    pub recv_pin: u8,
    pub xmit_pin: u8,
    pub enable_pin: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XbeeConfig {
    pub recv_pin: u8,
    pub xmit_pin: u8,
}

/// Type-specific body of a per-output configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputConfigKind {
    Value(ValueConfig),
    Rgb(RgbConfig),
    Program(ProgramConfig),
    Pixels(PixelsConfig),
    Mpr121(Mpr121Config),
    Rs485(Rs485Config),
    Xbee(XbeeConfig),
}

impl OutputConfigKind {
    pub fn output_type(&self) -> OutputType {
        match self {
            OutputConfigKind::Value(_) => OutputType::Value,
            OutputConfigKind::Rgb(_) => OutputType::Rgb,
            OutputConfigKind::Program(_) => OutputType::Program,
            OutputConfigKind::Pixels(_) => OutputType::Pixels,
            OutputConfigKind::Mpr121(_) => OutputType::Mpr121,
            OutputConfigKind::Rs485(_) => OutputType::Rs485,
            OutputConfigKind::Xbee(_) => OutputType::Xbee,
        }
    }

    fn body_len(&self) -> usize {
        match self {
            OutputConfigKind::Value(_) => 3,
            OutputConfigKind::Rgb(_) => 6,
            OutputConfigKind::Program(_) => 2 * PROGRAM_CONFIG_VALUES,
            OutputConfigKind::Pixels(_) => 5,
            OutputConfigKind::Mpr121(_) => 2 + MPR121_CHANNELS,
            OutputConfigKind::Rs485(_) => 3,
            OutputConfigKind::Xbee(_) => 2,
        }
    }

    fn encode_body(&self, buf: &mut Vec<u8>) {
        match self {
            OutputConfigKind::Value(c) => {
                buf.push(c.pin);
                buf.extend_from_slice(&c.value.to_le_bytes());
            }
            OutputConfigKind::Rgb(c) => {
                buf.extend_from_slice(&c.pins);
                buf.extend_from_slice(&c.values);
            }
            OutputConfigKind::Program(c) => {
                for v in c.values {
                    buf.extend_from_slice(&v.to_le_bytes());
                }
            }
            OutputConfigKind::Pixels(c) => {
                buf.push(c.clock_pin);
                buf.push(c.data_pin);
                buf.extend_from_slice(&c.num_pixels.to_le_bytes());
                buf.push(c.rgb_type);
            }
            OutputConfigKind::Mpr121(c) => {
                buf.push(c.irq_pin);
                buf.push(u8::from(c.use_interrupt));
                buf.extend_from_slice(&c.thresholds);
            }
            OutputConfigKind::Rs485(c) => {
                buf.push(c.recv_pin);
                buf.push(c.xmit_pin);
                buf.push(c.enable_pin);
            }
            OutputConfigKind::Xbee(c) => {
                buf.push(c.recv_pin);
                buf.push(c.xmit_pin);
            }
        }
    }

    fn decode_body(output_type: OutputType, r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        let kind = match output_type {
            OutputType::Value => OutputConfigKind::Value(ValueConfig {
                pin: r.u8()?,
                value: r.i16()?,
            }),
            OutputType::Rgb => OutputConfigKind::Rgb(RgbConfig {
                pins: r.array()?,
                values: r.array()?,
            }),
            OutputType::Program => {
                let mut values = [0i16; PROGRAM_CONFIG_VALUES];
                for v in &mut values {
                    *v = r.i16()?;
                }
                OutputConfigKind::Program(ProgramConfig { values })
            }
            OutputType::Pixels => OutputConfigKind::Pixels(PixelsConfig {
                clock_pin: r.u8()?,
                data_pin: r.u8()?,
                num_pixels: r.u16()?,
                rgb_type: r.u8()?,
            }),
            OutputType::Mpr121 => OutputConfigKind::Mpr121(Mpr121Config {
                irq_pin: r.u8()?,
                use_interrupt: r.u8()? != 0,
                thresholds: r.array()?,
            }),
            OutputType::Rs485 => OutputConfigKind::Rs485(Rs485Config {
                recv_pin: r.u8()?,
                xmit_pin: r.u8()?,
                enable_pin: r.u8()?,
            }),
            OutputType::Xbee => OutputConfigKind::Xbee(XbeeConfig {
                recv_pin: r.u8()?,
                xmit_pin: r.u8()?,
            }),
        };
        Ok(kind)
    }
}

/// Configuration of one output, including its position on the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub output_index: u8,
    pub kind: OutputConfigKind,
}

impl WireMessage for OutputConfig {
    fn wire_len(&self) -> usize {
        OUTPUT_HEADER_SIZE + self.kind.body_len()
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        OutputHeader {
            output_type: self.kind.output_type(),
            output_index: self.output_index,
        }
        .encode_into(buf);
        self.kind.encode_body(buf);
    }

    fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize), ProtocolError> {
        let (header, used) = OutputHeader::decode(bytes, offset)?;
        let mut r = WireReader::new(bytes, offset + used);
        let kind = OutputConfigKind::decode_body(header.output_type, &mut r)?;
        Ok((
            OutputConfig {
                output_index: header.output_index,
                kind,
            },
            used + r.consumed(),
        ))
    }
}

// ── Record framing ────────────────────────────────────────────────────────────

/// One framed configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigRecord {
    Header(ConfigHeader),
    Output(OutputConfig),
    Address(u16),
    DeviceId(u16),
    Baud(BaudRate),
}

impl ConfigRecord {
    pub fn config_type(&self) -> ConfigType {
        match self {
            ConfigRecord::Header(_) => ConfigType::Header,
            ConfigRecord::Output(o) => o.kind.output_type().into(),
            ConfigRecord::Address(_) => ConfigType::Address,
            ConfigRecord::DeviceId(_) => ConfigType::DeviceId,
            ConfigRecord::Baud(_) => ConfigType::Baud,
        }
    }
}

impl WireMessage for ConfigRecord {
    fn wire_len(&self) -> usize {
        2 + match self {
            ConfigRecord::Header(h) => h.wire_len(),
            ConfigRecord::Output(o) => o.wire_len(),
            ConfigRecord::Address(_) | ConfigRecord::DeviceId(_) => 2,
            ConfigRecord::Baud(_) => 1,
        }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(CONFIG_START);
        buf.push(self.config_type() as u8);
        match self {
            ConfigRecord::Header(h) => h.encode_into(buf),
            ConfigRecord::Output(o) => o.encode_into(buf),
            ConfigRecord::Address(v) | ConfigRecord::DeviceId(v) => {
                buf.extend_from_slice(&v.to_le_bytes())
            }
            ConfigRecord::Baud(b) => buf.push(b.raw()),
        }
    }

    fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize), ProtocolError> {
        let mut r = WireReader::new(bytes, offset);
        let start = r.u8()?;
        if start != CONFIG_START {
            return Err(ProtocolError::MalformedPayload(format!(
                "config record starts with 0x{start:02X}, expected 0x{CONFIG_START:02X}"
            )));
        }
        let tag = r.u8()?;
        let config_type =
            ConfigType::try_from(tag).map_err(|_| ProtocolError::UnknownConfigType(tag))?;

        let record = match config_type {
            ConfigType::Header => {
                let (h, n) = ConfigHeader::decode(bytes, offset + r.consumed())?;
                r.skip(n)?;
                ConfigRecord::Header(h)
            }
            ConfigType::Address => ConfigRecord::Address(r.u16()?),
            ConfigType::DeviceId => ConfigRecord::DeviceId(r.u16()?),
            ConfigType::Baud => ConfigRecord::Baud(BaudRate::from_raw(r.u8()?)),
            output => {
                let (o, n) = OutputConfig::decode(bytes, offset + r.consumed())?;
                if ConfigType::from(o.kind.output_type()) != output {
                    return Err(ProtocolError::MalformedPayload(format!(
                        "config type {output:?} carries a {:?} output record",
                        o.kind.output_type()
                    )));
                }
                r.skip(n)?;
                ConfigRecord::Output(o)
            }
        };
        Ok((record, r.consumed()))
    }
}

// ── Whole-module configuration ────────────────────────────────────────────────

/// A module's header plus its output configurations.
///
/// The header's `num_outputs` always equals `outputs().len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    header: ConfigHeader,
    outputs: Vec<OutputConfig>,
}

impl ModuleConfig {
    /// Builds a configuration, overwriting `header.num_outputs` with the
    /// actual output count.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigValidationError::TooManyOutputs`] if the count does not
    /// fit in one byte.
    pub fn new(
        mut header: ConfigHeader,
        outputs: Vec<OutputConfig>,
    ) -> Result<Self, ConfigValidationError> {
        header.num_outputs = u8::try_from(outputs.len())
            .map_err(|_| ConfigValidationError::TooManyOutputs(outputs.len()))?;
        Ok(Self { header, outputs })
    }

    pub fn header(&self) -> &ConfigHeader {
        &self.header
    }

    pub fn outputs(&self) -> &[OutputConfig] {
        &self.outputs
    }

    /// Header record followed by one record per output.
    pub fn to_records(&self) -> Vec<ConfigRecord> {
        std::iter::once(ConfigRecord::Header(self.header))
            .chain(self.outputs.iter().copied().map(ConfigRecord::Output))
            .collect()
    }

    /// Reassembles a configuration from a decoded record list.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedPayload`] if the list does not start
    /// with a header, contains a single-field record, or holds a different
    /// number of outputs than the header declares.
    pub fn from_records(records: &[ConfigRecord]) -> Result<Self, ProtocolError> {
        let (header, rest) = match records.split_first() {
            Some((ConfigRecord::Header(h), rest)) => (*h, rest),
            _ => {
                return Err(ProtocolError::MalformedPayload(
                    "configuration does not start with a header record".to_string(),
                ))
            }
        };

        let outputs = rest
            .iter()
            .map(|record| match record {
                ConfigRecord::Output(o) => Ok(*o),
                other => Err(ProtocolError::MalformedPayload(format!(
                    "unexpected {:?} record after configuration header",
                    other.config_type()
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if outputs.len() != header.num_outputs as usize {
            return Err(ProtocolError::MalformedPayload(format!(
                "header declares {} outputs but {} output records follow",
                header.num_outputs,
                outputs.len()
            )));
        }
        Ok(Self { header, outputs })
    }
}
