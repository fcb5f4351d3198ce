//! hmtl-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does hmtl-client do? (for beginners)
//!
//! Modules hang off a serial link owned by `hmtl-server`.  The client never
//! touches the serial port; it talks to the server over TCP instead:
//!
//! 1. Connects to the relay.
//! 2. Sends one encoded HMTL message.
//! 3. Waits for `ack`, which the relay sends only after the module has
//!    answered `ok`.
//! 4. For POLL and DUMP_CONFIG, repeatedly sends `data` to pull the module's
//!    reply, one fragment at a time, until a fragment arrives without the
//!    MORE_DATA flag.
//! 5. Optionally sends `exit` to shut the relay down.

/// Application layer: use cases for the client.
pub mod application;

/// Infrastructure layer: the relay connection.
pub mod infrastructure;
