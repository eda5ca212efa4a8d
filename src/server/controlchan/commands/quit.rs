//! The RFC 959 Logout (`QUIT`) command.
//
// This command terminates a USER and if file transfer is not in progress,
// the server closes the control connection. If file transfer is in progress,
// the connection will remain open for the result reply and the server will
// then close it.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::SessionState;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Quit;

#[async_trait]
impl CommandHandler for Quit {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        let reply = Reply::new_with_string(ReplyCode::ClosingControlConnection, session.msg_quit.clone());
        if session.data_chan.is_some() {
            // Keep the session alive for the running transfer, ignore any
            // further input, and close when the data channel reports back.
            session.state = SessionState::QuitPending;
        } else {
            session.close_when_done = true;
        }
        Ok(reply)
    }
}
