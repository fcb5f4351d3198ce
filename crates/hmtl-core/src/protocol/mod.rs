//! Protocol module containing message types, program builders, text tokens
//! and the binary codec.

pub mod codec;
pub mod messages;
pub mod program;
pub mod tokens;

pub use codec::{
    decode_header, decode_message, encode_message, peek_declared_length, ProtocolError,
    WireMessage,
};
pub use messages::*;
pub use program::{codes as program_codes, ProgramPayload, PROGRAM_PARAMS_LEN};
