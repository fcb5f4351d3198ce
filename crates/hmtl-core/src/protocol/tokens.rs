//! Text tokens of the line-oriented control channel and the relay channel.

/// Sent by a module once it has booted and is accepting commands.
pub const READY: &str = "ready";
/// Module acknowledgement of the last command.
pub const OK: &str = "ok";
/// Module rejection of the last command.
pub const FAIL: &str = "fail";

/// Legacy configuration commands.
pub const START: &str = "start";
pub const END: &str = "end";
pub const READ: &str = "read";
pub const PRINT: &str = "print";
pub const WRITE: &str = "write";

/// Appended to terminated (legacy configuration) writes.
pub const TERMINATOR: [u8; 4] = [0xFE, 0xFE, 0xFE, 0xFE];

/// Relay channel tokens, exchanged as whole relay items.
pub mod relay {
    pub const ACK: &[u8] = b"ack";
    pub const EXIT: &[u8] = b"exit";
    pub const DATA_REQUEST: &[u8] = b"data";
}

/// True if `line` is exactly `token`, ignoring surrounding whitespace.
pub fn matches(line: &[u8], token: &str) -> bool {
    std::str::from_utf8(line).map_or(false, |s| s.trim() == token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_ignores_surrounding_whitespace() {
        assert!(matches(b"ok", OK));
        assert!(matches(b" ok \t", OK));
        assert!(!matches(b"okay", OK));
        assert!(!matches(b"", OK));
    }
}
