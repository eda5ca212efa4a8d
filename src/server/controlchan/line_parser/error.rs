use derive_more::Display;
use std::{result, str::Utf8Error};
use thiserror::Error;

/// The error type returned by the [parse](super::parse) function.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("parse error: {kind}")]
pub struct ParseError {
    kind: ParseErrorKind,
}

/// A list specifying categories of parse errors.
#[derive(Clone, Eq, PartialEq, Debug, Display)]
pub enum ParseErrorKind {
    /// The token is not a command this server knows about.
    #[display("Unknown command: {}", command)]
    UnknownCommand {
        /// The token as the client sent it.
        command: String,
    },
    /// The command requires an argument and none was given.
    #[display("Missing argument")]
    MissingArgument,
    /// The command takes no argument but one was given.
    #[display("Unexpected argument")]
    UnexpectedArgument,
    /// The argument could not be interpreted (e.g. a non-numeric REST offset).
    #[display("Invalid argument")]
    InvalidArgument,
    /// Non-UTF8 character encountered.
    #[display("Non-UTF8 character while parsing")]
    InvalidUtf8,
}

impl ParseError {
    /// Returns the corresponding `ParseErrorKind` for this error.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

impl From<ParseErrorKind> for ParseError {
    fn from(kind: ParseErrorKind) -> ParseError {
        ParseError { kind }
    }
}

impl From<Utf8Error> for ParseError {
    fn from(_: Utf8Error) -> ParseError {
        ParseError {
            kind: ParseErrorKind::InvalidUtf8,
        }
    }
}

/// The Result type used in this module.
pub type Result<T> = result::Result<T, ParseError>;
