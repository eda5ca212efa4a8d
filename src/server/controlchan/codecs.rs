use super::{command::Command, error::{ControlChanError, ControlChanErrorKind}, line_parser, Reply};

use bytes::BytesMut;
use std::io::Write;
use tokio_util::codec::{Decoder, Encoder};

// Longest command line we are willing to buffer. Anything longer is thrown
// away up to the next newline and reported as its own error kind so the
// control loop can answer "500 Command too long.".
const MAX_LINE_LEN: usize = 2048;

// FtpCodec implements tokio's `Decoder` and `Encoder` traits for the control channel, that we'll
// use to decode FTP commands and encode their replies.
pub struct FtpCodec {
    // Stored index of the next index to examine for a '\n' character. This is used to optimize
    // searching. For example, if `decode` was called with `abc`, it would hold `3`, because that
    // is the next index to examine. The next time `decode` is called with `abcde\n`, we will only
    // look at `de\n` before returning.
    next_index: usize,
    // True while we are dropping the tail of an oversized line.
    discarding: bool,
}

impl FtpCodec {
    pub fn new() -> Self {
        FtpCodec {
            next_index: 0,
            discarding: false,
        }
    }
}

impl Default for FtpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FtpCodec {
    type Item = Command;
    type Error = ControlChanError;

    // Here we decode the incoming bytes into a meaningful command. We'll split on newlines, and
    // parse the resulting line using the line parser. This method will be called by tokio.
    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Command>, Self::Error> {
        loop {
            match buf[self.next_index..].iter().position(|b| *b == b'\n') {
                Some(newline_offset) => {
                    let newline_index = newline_offset + self.next_index;
                    let line = buf.split_to(newline_index + 1);
                    self.next_index = 0;
                    if self.discarding {
                        // Tail of a line that was already reported as too long.
                        self.discarding = false;
                        continue;
                    }
                    if line.len() > MAX_LINE_LEN {
                        return Err(ControlChanErrorKind::CommandLineTooLong.into());
                    }
                    return Ok(Some(line_parser::parse(line)?));
                }
                None => {
                    if buf.len() > MAX_LINE_LEN {
                        buf.clear();
                        self.next_index = 0;
                        self.discarding = true;
                        return Err(ControlChanErrorKind::CommandLineTooLong.into());
                    }
                    self.next_index = buf.len();
                    return Ok(None);
                }
            }
        }
    }
}

impl Encoder<Reply> for FtpCodec {
    type Error = ControlChanError;

    // Here we encode the outgoing reply
    fn encode(&mut self, reply: Reply, buf: &mut BytesMut) -> Result<(), Self::Error> {
        let mut buffer = vec![];
        encode_reply(reply, &mut buffer)?;
        buf.extend(&buffer);
        Ok(())
    }
}

fn encode_reply(reply: Reply, buffer: &mut Vec<u8>) -> Result<(), ControlChanError> {
    match reply {
        Reply::None => {}
        Reply::CodeAndMsg { code, msg } => {
            if msg.is_empty() {
                write!(buffer, "{}\r\n", code as u32)?;
            } else {
                write!(buffer, "{} {}\r\n", code as u32, msg)?;
            }
        }
        Reply::MultiLine { code, mut lines } => {
            // Get the last line since it needs to be preceded by the reply code.
            let last_line = lines.pop().unwrap_or_default();

            // Lines starting with a digit should be indented
            for it in lines.iter_mut() {
                if it.starts_with(|c: char| c.is_ascii_digit()) {
                    it.insert(0, ' ');
                }
            }
            if lines.is_empty() {
                write!(buffer, "{} {}\r\n", code as u32, last_line)?;
            } else {
                write!(buffer, "{}-{}\r\n{} {}\r\n", code as u32, lines.join("\r\n"), code as u32, last_line)?;
            }
        }
        Reply::Sequence(replies) => {
            for reply in replies {
                encode_reply(reply, buffer)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::controlchan::ReplyCode;
    use pretty_assertions::assert_eq;

    fn encoded(reply: Reply) -> String {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(reply, &mut buf).unwrap();
        String::from_utf8(buf.to_vec()).unwrap()
    }

    #[test]
    fn encodes_single_line_replies() {
        assert_eq!(
            encoded(Reply::new(ReplyCode::CommandOkay, "Type set to: ASCII.")),
            "200 Type set to: ASCII.\r\n"
        );
    }

    #[test]
    fn encodes_multi_line_replies() {
        let reply = Reply::new_multiline(ReplyCode::SystemStatus, vec!["Features supported:", " MDTM", "End FEAT."]);
        assert_eq!(encoded(reply), "211-Features supported:\r\n MDTM\r\n211 End FEAT.\r\n");
    }

    #[test]
    fn indents_continuation_lines_starting_with_digits() {
        let reply = Reply::new_multiline(ReplyCode::SystemStatus, vec!["a", "211 fake", "end"]);
        assert_eq!(encoded(reply), "211-a\r\n 211 fake\r\n211 end\r\n");
    }

    #[test]
    fn encodes_reply_sequences_in_order() {
        let reply = Reply::Sequence(vec![
            Reply::new(ReplyCode::ConnectionClosed, "Connection closed; transfer aborted."),
            Reply::new(ReplyCode::ClosingDataConnection, "ABOR command successful."),
        ]);
        assert_eq!(
            encoded(reply),
            "426 Connection closed; transfer aborted.\r\n226 ABOR command successful.\r\n"
        );
    }

    #[test]
    fn decodes_complete_lines_only() {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::from("NOO");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"P\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Command::Noop));
    }

    #[test]
    fn oversized_lines_are_discarded_up_to_the_newline() {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::from(vec![b'A'; MAX_LINE_LEN + 1].as_slice());
        let err = codec.decode(&mut buf).unwrap_err();
        assert_eq!(err.kind(), &ControlChanErrorKind::CommandLineTooLong);
        // The tail of the long line is dropped, the next line parses fine.
        buf.extend_from_slice(b"AAAA\r\nNOOP\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Command::Noop));
    }
}
