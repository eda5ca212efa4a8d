//! The service provider interface for authentication and authorization.

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The error returned by [`Authorizer::validate`] when credentials are
/// rejected. The text is for the server log only; clients always get the same
/// generic reply so that an unknown username cannot be told apart from a
/// wrong password.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AuthenticationError {
    message: String,
}

impl AuthenticationError {
    /// Creates a new error with the given log message.
    pub fn new<S: Into<String>>(message: S) -> Self {
        AuthenticationError { message: message.into() }
    }
}

/// The credential and permission oracle consulted by every session.
///
/// Implementations are injected into the [`Server`](crate::Server) at
/// construction time; the server never persists credentials itself.
#[async_trait]
pub trait Authorizer: Send + Sync + Debug {
    /// Validate the given username and password combination.
    async fn validate(&self, username: &str, password: &str) -> Result<(), AuthenticationError>;

    /// Tells whether a record for the given username exists.
    async fn has_user(&self, username: &str) -> bool;

    /// Returns the user's home directory, the host path that becomes the
    /// session root on login. `None` if the user is unknown.
    async fn home_of(&self, username: &str) -> Option<PathBuf>;

    /// The message sent along with the `230` reply after a successful login.
    async fn msg_login(&self, _username: &str) -> String {
        "Login successful.".to_string()
    }

    /// The message sent along with the `221` reply on QUIT.
    async fn msg_quit(&self, _username: &str) -> String {
        "Goodbye.".to_string()
    }

    /// Tells whether the user may read from the given host path.
    async fn may_read(&self, username: &str, path: &Path) -> bool;

    /// Tells whether the user may write to the given host path.
    async fn may_write(&self, username: &str, path: &Path) -> bool;
}
