//! Turns a requested module command into an HMTL message, and decodes the
//! replies that come back.
//!
//! Commands that expect an answer (POLL, DUMP_CONFIG) report so through
//! [`ModuleCommand::expects_response`]; the caller then asks the relay for
//! reply fragments after the acknowledgement.

use hmtl_core::config::ModuleConfig;
use hmtl_core::protocol::{
    decode_message, MessageBody, OutputCommand, PollResponse, ProgramPayload, ProtocolError, Rgb,
};
use hmtl_core::HmtlMessage;

/// A command for one module (or all of them via the broadcast address).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleCommand {
    Value { output: u8, value: i16 },
    Rgb { output: u8, rgb: Rgb },
    Blink {
        output: u8,
        on_period: u16,
        on: Rgb,
        off_period: u16,
        off: Rgb,
    },
    TimedChange {
        output: u8,
        period: u32,
        start: Rgb,
        stop: Rgb,
    },
    Fade {
        output: u8,
        period: u32,
        start: Rgb,
        stop: Rgb,
        flags: u8,
    },
    /// Stops any running program.
    NoProgram { output: u8 },
    Poll,
    SetAddress { device_id: u16, new_address: u16 },
    DumpConfig,
}

impl ModuleCommand {
    /// Builds the message for `address`.
    pub fn to_message(&self, address: u16) -> HmtlMessage {
        match *self {
            ModuleCommand::Value { output, value } => HmtlMessage::value(address, output, value),
            ModuleCommand::Rgb { output, rgb } => HmtlMessage::rgb(address, output, rgb),
            ModuleCommand::Blink {
                output,
                on_period,
                on,
                off_period,
                off,
            } => HmtlMessage::program(
                address,
                output,
                ProgramPayload::blink(on_period, on, off_period, off),
            ),
            ModuleCommand::TimedChange {
                output,
                period,
                start,
                stop,
            } => HmtlMessage::program(
                address,
                output,
                ProgramPayload::timed_change(period, start, stop),
            ),
            ModuleCommand::Fade {
                output,
                period,
                start,
                stop,
                flags,
            } => HmtlMessage::program(
                address,
                output,
                ProgramPayload::fade(period, start, stop, flags),
            ),
            ModuleCommand::NoProgram { output } => {
                HmtlMessage::output(address, output, OutputCommand::Program(ProgramPayload::none()))
            }
            ModuleCommand::Poll => HmtlMessage::poll(address),
            ModuleCommand::SetAddress {
                device_id,
                new_address,
            } => HmtlMessage::set_address(address, device_id, new_address),
            ModuleCommand::DumpConfig => HmtlMessage::dump_config(address),
        }
    }

    pub fn expects_response(&self) -> bool {
        matches!(self, ModuleCommand::Poll | ModuleCommand::DumpConfig)
    }
}

/// Parses `r,g,b` (decimal, each 0..=255) into a colour.
///
/// # Errors
///
/// A message naming the bad component, suitable for command-line errors.
pub fn parse_rgb(s: &str) -> Result<Rgb, String> {
    let parts = s
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<u8>()
                .map_err(|e| format!("bad colour component '{p}': {e}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [r, g, b] => Ok(Rgb::new(*r, *g, *b)),
        _ => Err(format!("expected r,g,b but got '{s}'")),
    }
}

/// What a set of reply fragments decoded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// One entry per module that answered a poll.
    Modules(Vec<PollResponse>),
    /// A complete configuration reassembled from DUMP_CONFIG fragments.
    Config(ModuleConfig),
    /// Anything else, decoded but not interpreted.
    Other(Vec<HmtlMessage>),
}

/// Decodes reply fragments.
///
/// # Errors
///
/// [`ProtocolError`] if any fragment fails to decode, or if DUMP_CONFIG
/// fragments do not form a complete configuration.
pub fn decode_response(fragments: &[Vec<u8>]) -> Result<Response, ProtocolError> {
    let messages = fragments
        .iter()
        .map(|f| decode_message(f).map(|(msg, _)| msg))
        .collect::<Result<Vec<_>, _>>()?;

    if !messages.is_empty()
        && messages
            .iter()
            .all(|m| matches!(m.body, MessageBody::PollResponse(_)))
    {
        let modules = messages
            .into_iter()
            .filter_map(|m| match m.body {
                MessageBody::PollResponse(p) => Some(p),
                _ => None,
            })
            .collect();
        return Ok(Response::Modules(modules));
    }

    if !messages.is_empty()
        && messages
            .iter()
            .all(|m| matches!(m.body, MessageBody::DumpConfig(_)))
    {
        let records: Vec<_> = messages
            .iter()
            .flat_map(|m| match &m.body {
                MessageBody::DumpConfig(records) => records.clone(),
                _ => Vec::new(),
            })
            .collect();
        return ModuleConfig::from_records(&records).map(Response::Config);
    }

    Ok(Response::Other(messages))
}
