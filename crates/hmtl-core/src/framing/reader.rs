//! Turns a raw byte stream into [`FrameItem`]s.
//!
//! The reader runs on its own thread, pulling one byte at a time from a
//! [`ByteSource`] and feeding it to a [`FrameAssembler`].  Completed items go
//! into a shared [`RingBuffer`] that consumers drain at their own pace.
//!
//! # Framing rules
//!
//! - A `0xFC` byte outside a binary message starts one.  Once the 8-byte
//!   header is in, its length field says how many bytes to collect in total.
//! - Anything else is text: `\r` is dropped, `\n` ends the line.  Empty lines
//!   are not emitted.
//! - A read that returns no bytes throws away whatever was partially
//!   collected.  Sources are short-timeout and polled, so "no bytes" means the
//!   sender paused mid-frame.
//! - A read error stops the thread for good.  Owners notice through
//!   [`FrameReader::is_running`].

use std::io::{self, ErrorKind, Read};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::framing::frame::FrameItem;
use crate::framing::ring_buffer::RingBuffer;
use crate::protocol::codec::peek_declared_length;
use crate::protocol::messages::{HEADER_SIZE, START_CODE};

/// Default number of unread items kept before the oldest is dropped.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;

// ── Byte source abstraction ───────────────────────────────────────────────────

/// A blocking, short-timeout byte stream.
pub trait ByteSource: Send {
    /// Reads up to `max` bytes.
    ///
    /// Returns an empty vector when nothing arrived before the source's own
    /// timeout.  Any error is treated as the stream having gone away.
    fn read_bytes(&mut self, max: usize) -> io::Result<Vec<u8>>;
}

/// Adapts any [`Read`] implementation with a read timeout (serial ports,
/// sockets) into a [`ByteSource`].
pub struct ReaderSource<R> {
    inner: R,
}

impl<R: Read + Send> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Send> ByteSource for ReaderSource<R> {
    fn read_bytes(&mut self, max: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; max];
        match self.inner.read(&mut buf) {
            Ok(0) if max > 0 => Err(io::Error::new(ErrorKind::UnexpectedEof, "stream closed")),
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(e) if is_timeout_error(&e) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

/// Returns `true` for timeout-style errors that just mean "nothing yet".
fn is_timeout_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
    )
}

// ── Assembler state machine ───────────────────────────────────────────────────

/// Byte-at-a-time framing state machine, independent of any I/O.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    data: Vec<u8>,
    binary: bool,
    expected: Option<usize>,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte; returns a completed item's bytes and binary flag.
    pub fn push_byte(&mut self, byte: u8) -> Option<(Vec<u8>, bool)> {
        if !self.binary && byte == START_CODE {
            if !self.data.is_empty() {
                debug!("start code interrupted {} bytes of text", self.data.len());
            }
            self.data.clear();
            self.binary = true;
            self.expected = None;
        }

        if self.binary {
            self.data.push(byte);
            if self.expected.is_none() && self.data.len() == HEADER_SIZE {
                // A length shorter than the header itself completes at once.
                self.expected = peek_declared_length(&self.data).map(|n| n.max(HEADER_SIZE));
            }
            return match self.expected {
                Some(total) if self.data.len() >= total => Some(self.take(true)),
                _ => None,
            };
        }

        match byte {
            b'\r' => None,
            b'\n' if self.data.is_empty() => None,
            b'\n' => Some(self.take(false)),
            other => {
                self.data.push(other);
                None
            }
        }
    }

    /// Drops any partially collected frame.  Returns the number of bytes lost.
    pub fn reset(&mut self) -> usize {
        let dropped = self.data.len();
        self.data.clear();
        self.binary = false;
        self.expected = None;
        dropped
    }

    pub fn is_idle(&self) -> bool {
        self.data.is_empty() && !self.binary
    }

    fn take(&mut self, is_hmtl: bool) -> (Vec<u8>, bool) {
        self.binary = false;
        self.expected = None;
        (std::mem::take(&mut self.data), is_hmtl)
    }
}

// ── Reader thread ─────────────────────────────────────────────────────────────

/// Frame reader settings.
#[derive(Debug, Clone)]
pub struct FrameReaderConfig {
    /// Ring buffer capacity.
    pub buffer_capacity: usize,
    /// Name given to the reader thread.
    pub thread_name: String,
}

impl Default for FrameReaderConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            thread_name: "hmtl-frame-reader".to_string(),
        }
    }
}

/// Handle to a running reader thread and the buffer it fills.
pub struct FrameReader {
    buffer: Arc<RingBuffer<FrameItem>>,
    running: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    received: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl FrameReader {
    /// Starts reading `source` on a new thread.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn<S>(source: S, config: FrameReaderConfig) -> io::Result<Self>
    where
        S: ByteSource + 'static,
    {
        let buffer = Arc::new(RingBuffer::new(config.buffer_capacity));
        let running = Arc::new(AtomicBool::new(true));
        let stop = Arc::new(AtomicBool::new(false));
        let received = Arc::new(AtomicU64::new(0));

        let handle = {
            let buffer = Arc::clone(&buffer);
            let running = Arc::clone(&running);
            let stop = Arc::clone(&stop);
            let received = Arc::clone(&received);
            thread::Builder::new()
                .name(config.thread_name.clone())
                .spawn(move || {
                    read_loop(source, &buffer, &stop, &received);
                    running.store(false, Ordering::SeqCst);
                })?
        };

        info!("frame reader '{}' started", config.thread_name);
        Ok(Self {
            buffer,
            running,
            stop,
            received,
            handle: Some(handle),
        })
    }

    /// Takes the oldest unread item, waiting up to `wait`.
    pub fn get(&self, wait: Duration) -> Option<FrameItem> {
        self.buffer.get(wait)
    }

    pub fn buffer(&self) -> Arc<RingBuffer<FrameItem>> {
        Arc::clone(&self.buffer)
    }

    /// False once the thread has exited, normally after a read error.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of items produced so far, including any later evicted.
    pub fn total_received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Asks the thread to exit and waits for it.
    ///
    /// The thread notices within one source read timeout.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("frame reader thread panicked");
            }
        }
    }
}

impl Drop for FrameReader {
    fn drop(&mut self) {
        // Detach rather than join: a source without a timeout would hang here.
        self.stop.store(true, Ordering::SeqCst);
    }
}

fn read_loop<S: ByteSource>(
    mut source: S,
    buffer: &RingBuffer<FrameItem>,
    stop: &AtomicBool,
    received: &AtomicU64,
) {
    let mut assembler = FrameAssembler::new();

    while !stop.load(Ordering::SeqCst) {
        let bytes = match source.read_bytes(1) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("frame reader stopping after read error: {e}");
                return;
            }
        };

        if bytes.is_empty() {
            let dropped = assembler.reset();
            if dropped > 0 {
                debug!("discarded {dropped} bytes of an incomplete frame");
            }
            continue;
        }

        for byte in bytes {
            if let Some((data, is_hmtl)) = assembler.push_byte(byte) {
                let item = FrameItem::new(data, is_hmtl);
                debug!("received {item}");
                received.fetch_add(1, Ordering::Relaxed);
                if let Some(evicted) = buffer.put(item) {
                    debug!("ring buffer full, dropped {evicted}");
                }
            }
        }
    }
    info!("frame reader stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn feed(assembler: &mut FrameAssembler, bytes: &[u8]) -> Vec<(Vec<u8>, bool)> {
        bytes.iter().filter_map(|&b| assembler.push_byte(b)).collect()
    }

    /// Source that replays scripted reads, then reports an error.
    struct ScriptedSource {
        reads: Arc<Mutex<VecDeque<io::Result<Vec<u8>>>>>,
    }

    impl ByteSource for ScriptedSource {
        fn read_bytes(&mut self, _max: usize) -> io::Result<Vec<u8>> {
            let next = self.reads.lock().unwrap().pop_front();
            match next {
                Some(read) => read,
                None => Err(io::Error::new(ErrorKind::BrokenPipe, "script finished")),
            }
        }
    }

    fn scripted(reads: Vec<io::Result<Vec<u8>>>) -> ScriptedSource {
        ScriptedSource {
            reads: Arc::new(Mutex::new(reads.into())),
        }
    }

    // ── FrameAssembler ───────────────────────────────────────────────────────

    #[test]
    fn test_binary_message_yields_one_item_of_declared_length() {
        // Arrange: header declaring 12 bytes, then a 4-byte body.
        let mut assembler = FrameAssembler::new();
        let bytes = [0xFC, 0x00, 0x02, 12, 0x01, 0x00, 0x10, 0x00, 0x01, 0x00, 0x05, 0x00];

        // Act
        let items = feed(&mut assembler, &bytes);

        // Assert
        assert_eq!(items, vec![(bytes.to_vec(), true)]);
        assert!(assembler.is_idle());
    }

    #[test]
    fn test_text_line_strips_carriage_return() {
        let mut assembler = FrameAssembler::new();
        let items = feed(&mut assembler, b"hello\r\n");
        assert_eq!(items, vec![(b"hello".to_vec(), false)]);
    }

    #[test]
    fn test_empty_lines_are_not_emitted() {
        let mut assembler = FrameAssembler::new();
        assert!(feed(&mut assembler, b"\r\n\n").is_empty());
    }

    #[test]
    fn test_newline_inside_binary_message_is_payload() {
        // Arrange: header-only message whose address low byte is '\n'.
        let mut assembler = FrameAssembler::new();
        let bytes = [0xFC, 0x00, 0x02, 8, 0x02, 0x00, b'\n', 0x00];

        // Act
        let items = feed(&mut assembler, &bytes);

        // Assert
        assert_eq!(items, vec![(bytes.to_vec(), true)]);
    }

    #[test]
    fn test_start_code_drops_pending_text() {
        let mut assembler = FrameAssembler::new();
        let mut bytes = b"garb".to_vec();
        bytes.extend_from_slice(&[0xFC, 0x00, 0x02, 8, 0x02, 0x00, 0x01, 0x00]);
        let items = feed(&mut assembler, &bytes);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].0[0], 0xFC);
    }

    #[test]
    fn test_text_follows_binary_message() {
        let mut assembler = FrameAssembler::new();
        let mut bytes = vec![0xFC, 0x00, 0x02, 8, 0x02, 0x00, 0x01, 0x00];
        bytes.extend_from_slice(b"ok\n");
        let items = feed(&mut assembler, &bytes);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1], (b"ok".to_vec(), false));
    }

    #[test]
    fn test_declared_length_below_header_completes_at_header() {
        let mut assembler = FrameAssembler::new();
        let items = feed(&mut assembler, &[0xFC, 0x00, 0x02, 3, 0x02, 0x00, 0x01, 0x00]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].0.len(), HEADER_SIZE);
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        // Arrange
        let mut assembler = FrameAssembler::new();
        feed(&mut assembler, &[0xFC, 0x00, 0x02]);

        // Act
        let dropped = assembler.reset();

        // Assert
        assert_eq!(dropped, 3);
        assert_eq!(feed(&mut assembler, b"ok\n"), vec![(b"ok".to_vec(), false)]);
    }

    // ── ReaderSource ─────────────────────────────────────────────────────────

    #[test]
    fn test_reader_source_maps_eof_to_error() {
        let mut source = ReaderSource::new(io::empty());
        let err = source.read_bytes(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_reader_source_returns_available_bytes() {
        let mut source = ReaderSource::new(&b"ab"[..]);
        assert_eq!(source.read_bytes(1).unwrap(), b"a".to_vec());
        assert_eq!(source.read_bytes(4).unwrap(), b"b".to_vec());
    }

    #[test]
    fn test_is_timeout_error_recognises_timeouts() {
        assert!(is_timeout_error(&io::Error::new(ErrorKind::TimedOut, "t")));
        assert!(is_timeout_error(&io::Error::new(ErrorKind::WouldBlock, "w")));
        assert!(!is_timeout_error(&io::Error::new(ErrorKind::BrokenPipe, "b")));
    }

    // ── FrameReader ──────────────────────────────────────────────────────────

    #[test]
    fn test_reader_thread_buffers_items_then_stops_on_error() {
        // Arrange
        let mut reads: Vec<io::Result<Vec<u8>>> =
            b"ready\n".iter().map(|&b| Ok(vec![b])).collect();
        reads.extend([0xFC, 0, 2, 8, 2, 2, 0x80, 0].iter().map(|&b| Ok(vec![b])));

        // Act
        let reader = FrameReader::spawn(scripted(reads), FrameReaderConfig::default()).unwrap();
        let first = reader.get(Duration::from_secs(5)).expect("text item");
        let second = reader.get(Duration::from_secs(5)).expect("binary item");

        // Assert
        assert!(first.is_token("ready"));
        assert!(second.is_hmtl);
        assert_eq!(second.data.len(), 8);
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while reader.is_running() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!reader.is_running());
        assert_eq!(reader.total_received(), 2);
    }

    #[test]
    fn test_empty_read_abandons_partial_frame() {
        // Arrange: half a header, a quiet period, then a text line.
        let mut reads: Vec<io::Result<Vec<u8>>> = vec![Ok(vec![0xFC]), Ok(vec![0x00])];
        reads.push(Ok(Vec::new()));
        reads.extend(b"ok\n".iter().map(|&b| Ok(vec![b])));

        // Act
        let reader = FrameReader::spawn(scripted(reads), FrameReaderConfig::default()).unwrap();
        let item = reader.get(Duration::from_secs(5));

        // Assert
        assert!(item.expect("text item").is_token("ok"));
        assert!(reader.get(Duration::from_millis(50)).is_none());
    }
}
