//! The error type surfaced by every filesystem operation of the sandbox.

use std::io;
use thiserror::Error;

/// Result type used by the [`VirtualFs`](super::VirtualFs) operations.
pub type Result<T> = std::result::Result<T, FsError>;

/// A single "filesystem failure" kind carrying the OS message. Callers map it
/// to the appropriate FTP reply code; the message becomes the reply text.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct FsError {
    message: String,
}

impl FsError {
    pub(crate) fn new<S: Into<String>>(message: S) -> Self {
        FsError { message: message.into() }
    }
}

impl From<io::Error> for FsError {
    fn from(err: io::Error) -> Self {
        // "No such file or directory (os error 2)" reads poorly in a reply;
        // keep the strerror part only.
        let mut message = err.to_string();
        if let Some(pos) = message.find(" (os error") {
            message.truncate(pos);
        }
        FsError { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_the_os_error_suffix() {
        let err: FsError = io::Error::from_raw_os_error(2).into();
        assert_eq!(err.to_string(), "No such file or directory");
    }

    #[test]
    fn keeps_custom_messages_untouched() {
        let err: FsError = io::Error::other("something odd").into();
        assert_eq!(err.to_string(), "something odd");
    }
}
