//! The RFC 959 Status (`STAT`) command
//
// Without an argument: a multi-line summary of the session, usable even
// while a transfer is running because it travels on the control channel.
// With an argument: a directory listing (glob patterns allowed) inside a
// 213 envelope, again on the control channel.

use super::vfs_or_login;
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::datachan::Endpoint;
use crate::server::session::SessionState;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Stat {
    path: Option<String>,
}

impl Stat {
    pub fn new(path: Option<String>) -> Self {
        Stat { path }
    }
}

#[async_trait]
impl CommandHandler for Stat {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        match &self.path {
            None => {
                let session = args.session.lock().await;
                let auth_line = match (&session.state, &session.username) {
                    (SessionState::WaitCmd, Some(username)) => format!("Logged in as: {}", username),
                    (SessionState::WaitPass, Some(username)) => format!("Waiting for password for: {}", username),
                    _ => "Waiting for username.".to_string(),
                };
                let data_line = match &session.data_chan {
                    None => "Data connection closed.".to_string(),
                    Some(chan) if !chan.is_open() => match chan.endpoint() {
                        Endpoint::Listening(addr) => format!("Passive data channel waiting for connection on {}.", addr),
                        Endpoint::Dialed(addr) => format!("Active data channel connecting to {}.", addr),
                    },
                    Some(chan) => {
                        let (sent, received) = chan.totals();
                        format!("Data connection open: sent {} bytes, received {} bytes.", sent, received)
                    }
                };
                let lines = vec![
                    "FTP server status:".to_string(),
                    format!("Connected to: {}", session.source),
                    auth_line,
                    format!("TYPE: {}; STRUcture: File; MODE: Stream", session.data_type),
                    data_line,
                    "End of status.".to_string(),
                ];
                Ok(Reply::new_multiline(ReplyCode::SystemStatus, lines))
            }
            Some(arg) => {
                let session = args.session.lock().await;
                let vfs = match vfs_or_login(&session) {
                    Ok(vfs) => vfs,
                    Err(reply) => return Ok(reply),
                };
                match vfs.stat_dir(arg).await {
                    Ok(listing) => {
                        let mut lines = vec![format!("Status of \"{}\":", vfs.ftpnorm(arg).display())];
                        lines.extend(listing);
                        lines.push("End of status.".to_string());
                        Ok(Reply::new_multiline(ReplyCode::FileStatus, lines))
                    }
                    Err(err) => Ok(Reply::new_with_string(ReplyCode::FileError, format!("{}.", err))),
                }
            }
        }
    }
}
