//! hmtl-server library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # Architecture overview (for beginners)
//!
//! ```text
//!  serial port ──► FrameReader thread ──► RingBuffer ──┐
//!       ▲                                              ▼
//!       └──────────── TransportSession (behind one Mutex)
//!                          ▲                 ▲
//!                 RelayServer (TCP)    DeviceScanner (optional)
//! ```
//!
//! - **`infrastructure::transport`** – the blocking command/acknowledgement
//!   session that owns a module link.
//! - **`infrastructure::serial`** – opens a serial port as such a link.
//! - **`infrastructure::relay`** – forwards messages from one network client
//!   at a time to the session.
//! - **`application::scan_devices`** – periodically polls an address range.
//! - **`application::configure_module`** – the text-command configuration
//!   upload used when a module is attached directly.

pub mod application;
pub mod infrastructure;
