//! Validation of human-written module configuration descriptions.
//!
//! A [`ModuleConfigInput`] is what a configuration file deserialises into.
//! [`ModuleConfigInput::validate`] checks every output before building
//! anything, so a description with a single bad field yields no records at
//! all.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::records::{
    BaudRate, ConfigHeader, ModuleConfig, Mpr121Config, OutputConfig, OutputConfigKind,
    PixelsConfig, ProgramConfig, RgbConfig, Rs485Config, ValueConfig, XbeeConfig, CONFIG_MAGIC,
    MPR121_CHANNELS, PROGRAM_CONFIG_VALUES,
};

/// Largest trigger or release threshold an MPR121 channel accepts.
pub const MPR121_THRESHOLD_MAX: u8 = 0x0F;

/// Errors raised while validating a configuration description.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("'{field}' must have exactly {expected} entries, found {actual}")]
    WrongLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("'{field}' allows at most {max} entries, found {actual}")]
    TooManyValues {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{field}[{index}] = {value} exceeds the maximum threshold of 0xF")]
    ThresholdOutOfRange {
        field: &'static str,
        index: usize,
        value: u8,
    },

    #[error("invalid baud rate {0}: must be a non-zero multiple of 1200 no larger than 306000")]
    InvalidBaud(u32),

    #[error("too many outputs: {0} (a module holds at most 255)")]
    TooManyOutputs(usize),

    /// Wraps an error found in one entry of the output list.
    #[error("output {index} ({kind}): {source}")]
    Output {
        index: usize,
        kind: &'static str,
        #[source]
        source: Box<ConfigValidationError>,
    },
}

// ── Input description ─────────────────────────────────────────────────────────

/// Module configuration as written by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfigInput {
    pub header: HeaderInput,
    #[serde(default)]
    pub outputs: Vec<OutputInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderInput {
    pub protocol_version: u8,
    pub hardware_version: u8,
    pub address: u16,
    pub device_id: u16,
    /// Bits per second.
    pub baud: u32,
    #[serde(default)]
    pub flags: u8,
}

/// One output description, tagged by its `"type"` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputInput {
    Value {
        pin: u8,
        value: i16,
    },
    Rgb {
        pins: Vec<u8>,
        values: Vec<u8>,
    },
    Program {
        #[serde(default)]
        values: Vec<i16>,
    },
    Pixels {
        clockpin: u8,
        datapin: u8,
        numpixels: u16,
        rgbtype: u8,
    },
    Mpr121 {
        irqpin: u8,
        useinterrupt: bool,
        trigger: Vec<u8>,
        release: Vec<u8>,
    },
    Rs485 {
        recvpin: u8,
        xmitpin: u8,
        enablepin: u8,
    },
    Xbee {
        recvpin: u8,
        xmitpin: u8,
    },
}

impl OutputInput {
    pub fn kind_name(&self) -> &'static str {
        match self {
            OutputInput::Value { .. } => "value",
            OutputInput::Rgb { .. } => "rgb",
            OutputInput::Program { .. } => "program",
            OutputInput::Pixels { .. } => "pixels",
            OutputInput::Mpr121 { .. } => "mpr121",
            OutputInput::Rs485 { .. } => "rs485",
            OutputInput::Xbee { .. } => "xbee",
        }
    }

    fn to_kind(&self) -> Result<OutputConfigKind, ConfigValidationError> {
        let kind = match self {
            OutputInput::Value { pin, value } => OutputConfigKind::Value(ValueConfig {
                pin: *pin,
                value: *value,
            }),
            OutputInput::Rgb { pins, values } => OutputConfigKind::Rgb(RgbConfig {
                pins: fixed::<3>("pins", pins)?,
                values: fixed::<3>("values", values)?,
            }),
            OutputInput::Program { values } => {
                if values.len() > PROGRAM_CONFIG_VALUES {
                    return Err(ConfigValidationError::TooManyValues {
                        field: "values",
                        max: PROGRAM_CONFIG_VALUES,
                        actual: values.len(),
                    });
                }
                let mut padded = [0i16; PROGRAM_CONFIG_VALUES];
                padded[..values.len()].copy_from_slice(values);
                OutputConfigKind::Program(ProgramConfig { values: padded })
            }
            OutputInput::Pixels {
                clockpin,
                datapin,
                numpixels,
                rgbtype,
            } => OutputConfigKind::Pixels(PixelsConfig {
                clock_pin: *clockpin,
                data_pin: *datapin,
                num_pixels: *numpixels,
                rgb_type: *rgbtype,
            }),
            OutputInput::Mpr121 {
                irqpin,
                useinterrupt,
                trigger,
                release,
            } => OutputConfigKind::Mpr121(Mpr121Config {
                irq_pin: *irqpin,
                use_interrupt: *useinterrupt,
                thresholds: combine_mpr121_thresholds(trigger, release)?,
            }),
            OutputInput::Rs485 {
                recvpin,
                xmitpin,
                enablepin,
            } => OutputConfigKind::Rs485(Rs485Config {
                recv_pin: *recvpin,
                xmit_pin: *xmitpin,
                enable_pin: *enablepin,
            }),
            OutputInput::Xbee { recvpin, xmitpin } => OutputConfigKind::Xbee(XbeeConfig {
                recv_pin: *recvpin,
                xmit_pin: *xmitpin,
            }),
        };
        Ok(kind)
    }
}

impl ModuleConfigInput {
    /// Checks the whole description and converts it into a [`ModuleConfig`].
    ///
    /// Output indices are assigned from list position.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigValidationError`] found; nothing is built in
    /// that case.
    pub fn validate(&self) -> Result<ModuleConfig, ConfigValidationError> {
        let baud = BaudRate::from_bps(self.header.baud)?;
        if self.outputs.len() > u8::MAX as usize {
            return Err(ConfigValidationError::TooManyOutputs(self.outputs.len()));
        }

        let outputs = self
            .outputs
            .iter()
            .enumerate()
            .map(|(index, output)| {
                let kind = output.to_kind().map_err(|e| ConfigValidationError::Output {
                    index,
                    kind: output.kind_name(),
                    source: Box::new(e),
                })?;
                Ok(OutputConfig {
                    output_index: index as u8,
                    kind,
                })
            })
            .collect::<Result<Vec<_>, ConfigValidationError>>()?;

        let header = ConfigHeader {
            magic: CONFIG_MAGIC,
            protocol_version: self.header.protocol_version,
            hardware_version: self.header.hardware_version,
            baud,
            num_outputs: 0,
            flags: self.header.flags,
            device_id: self.header.device_id,
            address: self.header.address,
        };
        ModuleConfig::new(header, outputs)
    }
}

// ── MPR121 threshold packing ──────────────────────────────────────────────────

/// Packs per-channel trigger and release thresholds into the byte layout the
/// sensor firmware expects: `(release[i] << 4) | trigger[i]`.
///
/// # Errors
///
/// Returns [`ConfigValidationError`] if either array does not have exactly 12
/// entries or any entry exceeds [`MPR121_THRESHOLD_MAX`].
pub fn combine_mpr121_thresholds(
    trigger: &[u8],
    release: &[u8],
) -> Result<[u8; MPR121_CHANNELS], ConfigValidationError> {
    let trigger = fixed::<MPR121_CHANNELS>("trigger", trigger)?;
    let release = fixed::<MPR121_CHANNELS>("release", release)?;
    check_thresholds("trigger", &trigger)?;
    check_thresholds("release", &release)?;

    let mut combined = [0u8; MPR121_CHANNELS];
    for (i, slot) in combined.iter_mut().enumerate() {
        *slot = (release[i] << 4) | trigger[i];
    }
    Ok(combined)
}

fn check_thresholds(field: &'static str, values: &[u8]) -> Result<(), ConfigValidationError> {
    match values.iter().position(|&v| v > MPR121_THRESHOLD_MAX) {
        Some(index) => Err(ConfigValidationError::ThresholdOutOfRange {
            field,
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}

fn fixed<const N: usize>(field: &'static str, values: &[u8]) -> Result<[u8; N], ConfigValidationError> {
    <[u8; N]>::try_from(values).map_err(|_| ConfigValidationError::WrongLength {
        field,
        expected: N,
        actual: values.len(),
    })
}
