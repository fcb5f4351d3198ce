//! Byte-stream framing: the frame reader, its output items and the ring
//! buffer between them.

pub mod frame;
pub mod reader;
pub mod ring_buffer;

pub use frame::FrameItem;
pub use reader::{
    ByteSource, FrameAssembler, FrameReader, FrameReaderConfig, ReaderSource,
    DEFAULT_BUFFER_CAPACITY,
};
pub use ring_buffer::RingBuffer;
