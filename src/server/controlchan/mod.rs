//! Contains code pertaining to the FTP *control* channel

pub mod command;

pub(crate) mod codecs;
pub(crate) use codecs::FtpCodec;

pub(super) mod commands;

pub(crate) mod control_loop;

pub(crate) mod error;
pub(crate) use error::{ControlChanError, ControlChanErrorKind};

pub(crate) mod event;
pub(crate) use event::Event;

pub(crate) mod handler;

pub mod line_parser;

pub(crate) mod reply;
pub(crate) use reply::{Reply, ReplyCode};
