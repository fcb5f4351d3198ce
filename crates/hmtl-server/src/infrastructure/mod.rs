//! Infrastructure layer for the relay server.
//!
//! Contains OS-facing adapters: the serial link, the transport session built
//! on it, the TCP relay and file-system storage.
//!
//! **Dependency rule**: this layer may depend on `application` and `hmtl_core`,
//! but MUST NOT be imported by the domain layer.

pub mod relay;
pub mod serial;
pub mod storage;
pub mod transport;
