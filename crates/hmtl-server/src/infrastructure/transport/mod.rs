//! Module link transport: the blocking session plus the glue that lets async
//! tasks share it.

pub mod fake;
pub mod session;

use std::sync::{Arc, Mutex};

pub use session::{ByteSink, SessionConfig, TransportError, TransportSession, WriteSink};

/// A session shared between the relay and the scanner.
///
/// Holding the lock is what makes one command/acknowledgement exchange
/// exclusive, so it must be held for the whole exchange.
pub type SharedSession = Arc<Mutex<TransportSession>>;

pub fn shared(session: TransportSession) -> SharedSession {
    Arc::new(Mutex::new(session))
}

/// Runs a blocking session operation on the blocking thread pool.
///
/// # Errors
///
/// Whatever `f` returns, or [`TransportError::SessionUnavailable`] if the lock
/// is poisoned or the blocking task panics.
pub async fn with_session<T, F>(session: &SharedSession, f: F) -> Result<T, TransportError>
where
    T: Send + 'static,
    F: FnOnce(&mut TransportSession) -> Result<T, TransportError> + Send + 'static,
{
    let session = Arc::clone(session);
    tokio::task::spawn_blocking(move || {
        let mut guard = session
            .lock()
            .map_err(|_| TransportError::SessionUnavailable("session lock poisoned".to_string()))?;
        f(&mut guard)
    })
    .await
    .map_err(|e| TransportError::SessionUnavailable(format!("session task failed: {e}")))?
}
