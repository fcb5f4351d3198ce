//! In-memory stand-in for a module on the other end of a link.
//!
//! Lets tests drive a [`TransportSession`](super::TransportSession) without a
//! serial device.  The fake answers every write with `ok` (or `fail`, or
//! nothing), replies to POLLs for the modules it knows about, and can emit
//! arbitrary lines and binary messages on demand.

use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use hmtl_core::framing::ByteSource;
use hmtl_core::protocol::{
    decode_message, encode_message, MessageBody, MessageFlags, PollResponse, BROADCAST_ADDRESS,
};
use hmtl_core::HmtlMessage;

use super::ByteSink;

/// How the fake answers each write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Fail,
    Silent,
}

#[derive(Debug)]
struct FakeState {
    inbound: VecDeque<u8>,
    written: Vec<Vec<u8>>,
    reply: Reply,
    modules: BTreeMap<u16, PollResponse>,
    queued: VecDeque<Vec<u8>>,
    disconnected: bool,
}

/// A fake module.  Clones share the same state.
#[derive(Debug, Clone)]
pub struct FakeModule {
    state: Arc<Mutex<FakeState>>,
}

impl FakeModule {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                inbound: VecDeque::new(),
                written: Vec::new(),
                reply: Reply::Ok,
                modules: BTreeMap::new(),
                queued: VecDeque::new(),
                disconnected: false,
            })),
        }
    }

    /// The two halves to hand to a session.
    pub fn link(&self) -> (FakeSource, FakeSink) {
        (
            FakeSource {
                state: Arc::clone(&self.state),
            },
            FakeSink {
                state: Arc::clone(&self.state),
            },
        )
    }

    /// Emits a text line, `\r\n` terminated.
    pub fn emit_line(&self, line: &str) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.inbound.extend(line.as_bytes());
        state.inbound.extend(b"\r\n");
    }

    pub fn emit_bytes(&self, bytes: &[u8]) {
        self.state.lock().expect("lock poisoned").inbound.extend(bytes);
    }

    /// Emits an encoded message.
    ///
    /// Panics if the message cannot be encoded.
    pub fn emit_message(&self, msg: &HmtlMessage) {
        let bytes = encode_message(msg).expect("fake module emitted an unencodable message");
        self.emit_bytes(&bytes);
    }

    pub fn set_reply(&self, reply: Reply) {
        self.state.lock().expect("lock poisoned").reply = reply;
    }

    /// Registers a module that answers POLLs sent to its address or to the
    /// broadcast address.
    pub fn add_module(&self, identity: PollResponse) {
        self.state
            .lock()
            .expect("lock poisoned")
            .modules
            .insert(identity.address, identity);
    }

    pub fn remove_module(&self, address: u16) {
        self.state.lock().expect("lock poisoned").modules.remove(&address);
    }

    /// Queues bytes to emit right after the next acknowledged write.
    pub fn queue_response(&self, bytes: Vec<u8>) {
        self.state.lock().expect("lock poisoned").queued.push_back(bytes);
    }

    /// Every payload written so far, terminators included.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state.lock().expect("lock poisoned").written.clone()
    }

    /// Makes every further read and write fail.
    pub fn disconnect(&self) {
        self.state.lock().expect("lock poisoned").disconnected = true;
    }
}

impl Default for FakeModule {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the identity a module at `address` reports when polled.
pub fn sample_identity(device_id: u16, address: u16) -> PollResponse {
    PollResponse {
        magic: hmtl_core::config::CONFIG_MAGIC,
        protocol_version: 2,
        hardware_version: 3,
        baud: hmtl_core::config::BaudRate::from_raw(48),
        num_outputs: 2,
        flags: 0,
        device_id,
        address,
        object_type: 1,
        buffer_size: 128,
        msg_version: 2,
    }
}

fn poll_replies(state: &FakeState, data: &[u8]) -> Vec<Vec<u8>> {
    let Ok((msg, _)) = decode_message(data) else {
        return Vec::new();
    };
    if !matches!(msg.body, MessageBody::PollRequest) {
        return Vec::new();
    }
    state
        .modules
        .values()
        .filter(|m| msg.address == BROADCAST_ADDRESS || msg.address == m.address)
        .filter_map(|m| {
            let reply = HmtlMessage::new(m.address, MessageBody::PollResponse(*m))
                .with_flags(MessageFlags::RESPONSE);
            encode_message(&reply).ok()
        })
        .collect()
}

/// Inbound half of a [`FakeModule`] link.
pub struct FakeSource {
    state: Arc<Mutex<FakeState>>,
}

impl ByteSource for FakeSource {
    fn read_bytes(&mut self, max: usize) -> io::Result<Vec<u8>> {
        {
            let mut state = self.state.lock().expect("lock poisoned");
            if state.disconnected {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "fake module unplugged"));
            }
            if !state.inbound.is_empty() {
                let n = max.min(state.inbound.len());
                return Ok(state.inbound.drain(..n).collect());
            }
        }
        thread::sleep(Duration::from_millis(2));
        Ok(Vec::new())
    }
}

/// Outbound half of a [`FakeModule`] link.
pub struct FakeSink {
    state: Arc<Mutex<FakeState>>,
}

impl ByteSink for FakeSink {
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        if state.disconnected {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "fake module unplugged"));
        }
        state.written.push(data.to_vec());

        match state.reply {
            Reply::Ok => {
                state.inbound.extend(b"ok\r\n");
                let replies = poll_replies(&state, data);
                for reply in replies {
                    state.inbound.extend(reply);
                }
                if let Some(queued) = state.queued.pop_front() {
                    state.inbound.extend(queued);
                }
            }
            Reply::Fail => state.inbound.extend(b"fail\r\n"),
            Reply::Silent => {}
        }
        Ok(())
    }
}
