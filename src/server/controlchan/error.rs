//! Contains the `ControlChanError` struct that defines the control channel error type.

use super::line_parser::error::{ParseError, ParseErrorKind};
use crate::BoxError;

use derive_more::Display;
use thiserror::Error;

/// The error type used on the control channel.
#[derive(Debug, Error)]
#[error("control channel error: {kind}")]
pub struct ControlChanError {
    kind: ControlChanErrorKind,
    #[source]
    source: Option<BoxError>,
}

/// A list specifying categories of FTP errors. It is meant to be used with the
/// [ControlChanError] type.
#[derive(Eq, PartialEq, Debug, Display)]
#[allow(dead_code)]
pub enum ControlChanErrorKind {
    /// We encountered a system IO error.
    #[display("Failed to perform IO")]
    IoError,
    /// Internal Server Error. This is probably a bug.
    #[display("Internal Server Error")]
    InternalServerError,
    /// We encountered a non-UTF8 character in the command.
    #[display("Non-UTF8 character in command")]
    Utf8Error,
    /// The client issued a command we don't know about.
    #[display("Unknown command: {}", command)]
    UnknownCommand {
        /// The command that we don't know about
        command: String,
    },
    /// A command that requires an argument arrived without one.
    #[display("Command is missing its argument")]
    MissingArgument,
    /// A command that takes no argument arrived with one.
    #[display("Command does not accept an argument")]
    UnexpectedArgument,
    /// The client issued a command we know about with an argument we cannot
    /// make sense of (e.g. a non-numeric REST offset).
    #[display("Invalid command argument")]
    InvalidArgument,
    /// The command line exceeded the line buffer.
    #[display("Command line too long")]
    CommandLineTooLong,
}

impl ControlChanError {
    /// Return the inner error kind of this error.
    pub fn kind(&self) -> &ControlChanErrorKind {
        &self.kind
    }
}

impl From<ControlChanErrorKind> for ControlChanError {
    fn from(kind: ControlChanErrorKind) -> ControlChanError {
        ControlChanError { kind, source: None }
    }
}

impl From<std::io::Error> for ControlChanError {
    fn from(err: std::io::Error) -> ControlChanError {
        ControlChanError {
            kind: ControlChanErrorKind::IoError,
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::str::Utf8Error> for ControlChanError {
    fn from(err: std::str::Utf8Error) -> ControlChanError {
        ControlChanError {
            kind: ControlChanErrorKind::Utf8Error,
            source: Some(Box::new(err)),
        }
    }
}

impl From<ParseError> for ControlChanError {
    fn from(err: ParseError) -> ControlChanError {
        let kind = match err.kind() {
            ParseErrorKind::UnknownCommand { command } => ControlChanErrorKind::UnknownCommand {
                command: command.clone(),
            },
            ParseErrorKind::MissingArgument => ControlChanErrorKind::MissingArgument,
            ParseErrorKind::UnexpectedArgument => ControlChanErrorKind::UnexpectedArgument,
            ParseErrorKind::InvalidArgument => ControlChanErrorKind::InvalidArgument,
            ParseErrorKind::InvalidUtf8 => ControlChanErrorKind::Utf8Error,
        };
        ControlChanError {
            kind,
            source: Some(Box::new(err)),
        }
    }
}
