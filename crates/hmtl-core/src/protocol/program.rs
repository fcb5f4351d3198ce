//! PROGRAM payloads and typed builders for the standard program codes.
//!
//! Every PROGRAM payload is one code byte followed by a parameter block that is
//! always [`PROGRAM_PARAMS_LEN`] bytes on the wire, so all PROGRAM messages have
//! the same length.  Builders lay the parameters out little-endian at the front
//! of the block and leave the rest zeroed.

use serde::{Deserialize, Serialize};

use crate::protocol::codec::ProtocolError;
use crate::protocol::messages::Rgb;

/// Size of the opaque parameter block of a PROGRAM payload.
pub const PROGRAM_PARAMS_LEN: usize = 32;

/// Program codes understood by the module firmware.
pub mod codes {
    pub const NONE: u8 = 0x00;
    pub const BLINK: u8 = 0x01;
    pub const TIMED_CHANGE: u8 = 0x02;
    pub const LEVEL_VALUE: u8 = 0x03;
    pub const SOUND_VALUE: u8 = 0x04;
    pub const FADE: u8 = 0x05;
    pub const SPARKLE: u8 = 0x06;
    pub const BRIGHTNESS: u8 = 0x30;
}

/// A program code with its zero-padded parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramPayload {
    pub code: u8,
    pub params: [u8; PROGRAM_PARAMS_LEN],
}

impl ProgramPayload {
    /// Encoded size: code byte plus the full parameter block.
    pub const WIRE_LEN: usize = 1 + PROGRAM_PARAMS_LEN;

    /// Builds a payload from caller-supplied parameter bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::OversizedPayload`] if `params` is longer than
    /// [`PROGRAM_PARAMS_LEN`].
    pub fn new(code: u8, params: &[u8]) -> Result<Self, ProtocolError> {
        if params.len() > PROGRAM_PARAMS_LEN {
            return Err(ProtocolError::OversizedPayload {
                len: params.len(),
                max: PROGRAM_PARAMS_LEN,
            });
        }
        let mut block = [0u8; PROGRAM_PARAMS_LEN];
        block[..params.len()].copy_from_slice(params);
        Ok(Self {
            code,
            params: block,
        })
    }

    /// Stops whatever program is running on the output.
    pub fn none() -> Self {
        Self::zeroed(codes::NONE)
    }

    /// Output follows the module's level input.
    pub fn level_value() -> Self {
        Self::zeroed(codes::LEVEL_VALUE)
    }

    /// Output follows the module's sound input.
    pub fn sound_value() -> Self {
        Self::zeroed(codes::SOUND_VALUE)
    }

    /// Alternates between two colours with independent periods (milliseconds).
    pub fn blink(on_period: u16, on: Rgb, off_period: u16, off: Rgb) -> Self {
        let mut params = ParamWriter::default();
        params.u16(on_period);
        params.rgb(on);
        params.u16(off_period);
        params.rgb(off);
        params.finish(codes::BLINK)
    }

    /// Holds `start` for `change_period` milliseconds, then switches to `stop`.
    pub fn timed_change(change_period: u32, start: Rgb, stop: Rgb) -> Self {
        let mut params = ParamWriter::default();
        params.u32(change_period);
        params.rgb(start);
        params.rgb(stop);
        params.finish(codes::TIMED_CHANGE)
    }

    /// Fades from `start` to `stop` over `change_period` milliseconds.
    pub fn fade(change_period: u32, start: Rgb, stop: Rgb, flags: u8) -> Self {
        let mut params = ParamWriter::default();
        params.u32(change_period);
        params.rgb(start);
        params.rgb(stop);
        params.u8(flags);
        params.finish(codes::FADE)
    }

    fn zeroed(code: u8) -> Self {
        Self {
            code,
            params: [0u8; PROGRAM_PARAMS_LEN],
        }
    }
}

/// Sequential little-endian writer over a fixed parameter block.
///
/// Builders write far fewer than [`PROGRAM_PARAMS_LEN`] bytes, so writes never
/// run past the end.
#[derive(Default)]
struct ParamWriter {
    block: [u8; PROGRAM_PARAMS_LEN],
    pos: usize,
}

impl ParamWriter {
    fn bytes(&mut self, bytes: &[u8]) {
        self.block[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn u8(&mut self, v: u8) {
        self.bytes(&[v]);
    }

    fn u16(&mut self, v: u16) {
        self.bytes(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.bytes(&v.to_le_bytes());
    }

    fn rgb(&mut self, v: Rgb) {
        self.bytes(&v.to_array());
    }

    fn finish(self, code: u8) -> ProgramPayload {
        ProgramPayload {
            code,
            params: self.block,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_zero_pads_short_parameter_block() {
        // Arrange / Act
        let payload = ProgramPayload::new(codes::SPARKLE, &[1, 2, 3]).expect("fits");

        // Assert
        assert_eq!(payload.code, codes::SPARKLE);
        assert_eq!(&payload.params[..3], &[1, 2, 3]);
        assert!(payload.params[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_new_accepts_exactly_full_parameter_block() {
        let params = [0xAAu8; PROGRAM_PARAMS_LEN];
        let payload = ProgramPayload::new(codes::BRIGHTNESS, &params).expect("fits");
        assert_eq!(payload.params, params);
    }

    #[test]
    fn test_new_rejects_oversized_parameter_block() {
        // Arrange
        let params = [0u8; PROGRAM_PARAMS_LEN + 1];

        // Act
        let err = ProgramPayload::new(codes::BLINK, &params).unwrap_err();

        // Assert
        assert_eq!(
            err,
            ProtocolError::OversizedPayload {
                len: PROGRAM_PARAMS_LEN + 1,
                max: PROGRAM_PARAMS_LEN
            }
        );
    }

    #[test]
    fn test_blink_lays_out_periods_and_colours_little_endian() {
        // Arrange / Act
        let payload = ProgramPayload::blink(
            0x0102,
            Rgb::new(0xFF, 0x00, 0x10),
            500,
            Rgb::new(1, 2, 3),
        );

        // Assert
        assert_eq!(payload.code, codes::BLINK);
        assert_eq!(
            &payload.params[..10],
            &[0x02, 0x01, 0xFF, 0x00, 0x10, 0xF4, 0x01, 1, 2, 3]
        );
        assert!(payload.params[10..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_timed_change_writes_u32_period_first() {
        let payload =
            ProgramPayload::timed_change(0x0A0B0C0D, Rgb::new(1, 1, 1), Rgb::new(2, 2, 2));
        assert_eq!(payload.code, codes::TIMED_CHANGE);
        assert_eq!(
            &payload.params[..10],
            &[0x0D, 0x0C, 0x0B, 0x0A, 1, 1, 1, 2, 2, 2]
        );
    }

    #[test]
    fn test_fade_appends_flags_after_colours() {
        let payload = ProgramPayload::fade(1000, Rgb::new(0, 0, 0), Rgb::new(255, 255, 255), 0x01);
        assert_eq!(payload.code, codes::FADE);
        assert_eq!(payload.params[10], 0x01);
        assert!(payload.params[11..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_parameterless_programs_are_all_zero() {
        for (payload, code) in [
            (ProgramPayload::none(), codes::NONE),
            (ProgramPayload::level_value(), codes::LEVEL_VALUE),
            (ProgramPayload::sound_value(), codes::SOUND_VALUE),
        ] {
            assert_eq!(payload.code, code);
            assert_eq!(payload.params, [0u8; PROGRAM_PARAMS_LEN]);
        }
    }
}
