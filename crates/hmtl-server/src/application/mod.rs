//! Application layer use cases for the relay server.
//!
//! - **`scan_devices`** – background POLL sweep that keeps a registry of the
//!   modules reachable through the link.
//! - **`configure_module`** – drives the terminated text protocol to upload
//!   or edit a module's stored configuration.

pub mod configure_module;
pub mod scan_devices;
