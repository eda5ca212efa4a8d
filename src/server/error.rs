//! Error type returned by [`Server::listen`](crate::Server::listen).

use thiserror::Error;

/// The error returned when the server itself cannot run; per-session problems
/// are logged and never tear the listener down.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding the control port failed.
    #[error("failed to bind control socket: {0}")]
    Bind(#[source] std::io::Error),
    /// Some other I/O problem on the listener.
    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),
}
