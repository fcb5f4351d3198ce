//! The unit produced by the frame reader.

use std::fmt;
use std::time::Instant;

use crate::protocol::codec::{decode_header, decode_message, ProtocolError};
use crate::protocol::messages::{HmtlMessage, MessageHeader, START_CODE};
use crate::protocol::tokens;

/// One framed unit from a byte stream: a binary HMTL message or a text line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameItem {
    pub data: Vec<u8>,
    pub timestamp: Instant,
    /// True for binary protocol messages, false for text lines.
    pub is_hmtl: bool,
}

impl FrameItem {
    pub fn new(data: Vec<u8>, is_hmtl: bool) -> Self {
        Self {
            data,
            timestamp: Instant::now(),
            is_hmtl,
        }
    }

    /// Classifies raw bytes that arrived whole, e.g. a relay item.
    pub fn from_data(data: Vec<u8>) -> Self {
        let is_hmtl = data.first() == Some(&START_CODE);
        Self::new(data, is_hmtl)
    }

    /// The line as text, for non-binary items that are valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        if self.is_hmtl {
            return None;
        }
        std::str::from_utf8(&self.data).ok()
    }

    /// True if this is a text line equal to `token`.
    pub fn is_token(&self, token: &str) -> bool {
        !self.is_hmtl && tokens::matches(&self.data, token)
    }

    /// Decodes the header of a binary item.
    pub fn header(&self) -> Option<MessageHeader> {
        if !self.is_hmtl {
            return None;
        }
        decode_header(&self.data).ok().map(|(h, _)| h)
    }

    /// Decodes a binary item into a message.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedPayload`] for text lines, or whatever
    /// the codec reports for bad bytes.
    pub fn message(&self) -> Result<HmtlMessage, ProtocolError> {
        if !self.is_hmtl {
            return Err(ProtocolError::MalformedPayload(
                "text line is not a binary message".to_string(),
            ));
        }
        decode_message(&self.data).map(|(msg, _)| msg)
    }
}

impl fmt::Display for FrameItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_hmtl {
            return write!(f, "text: {}", String::from_utf8_lossy(&self.data));
        }
        match self.header() {
            Some(h) => write!(f, "{} to {} ({} bytes):", h.message_type, h.address, self.data.len())?,
            None => write!(f, "binary ({} bytes):", self.data.len())?,
        }
        for byte in &self.data {
            write!(f, " {byte:02x}")?;
        }
        Ok(())
    }
}
