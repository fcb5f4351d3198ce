//! Network relay between remote clients and the module link.

pub mod server;

pub use server::{RelayError, RelayServer, RelayServerConfig, RelayState, DEFAULT_RELAY_PORT};
