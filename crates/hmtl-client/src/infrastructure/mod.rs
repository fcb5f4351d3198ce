//! Infrastructure layer for the client.
//!
//! **Dependency rule**: this layer may depend on `application` and `hmtl_core`,
//! but MUST NOT be imported by the domain layer.
//!
//! # Sub-modules
//!
//! - **`remote`** – TCP connection to an `hmtl-server` relay: sends messages,
//!   waits for acknowledgements and pulls reply fragments.

pub mod remote;
