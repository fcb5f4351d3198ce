//! Application layer use cases for the client.
//!
//! - **`build_message`** – maps a requested module command onto an HMTL
//!   message and interprets the reply fragments collected afterwards.

pub mod build_message;
