//! The RFC 959 Rename To (`RNTO`) command
//
// Consumes the RNFR source whatever happens next, so a failed rename does
// not leave a stale source behind.

use super::{fs_fail, not_enough_privileges, vfs_or_login};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Rnto {
    path: String,
}

impl Rnto {
    pub fn new(path: String) -> Self {
        Rnto { path }
    }
}

#[async_trait]
impl CommandHandler for Rnto {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        let vfs = match vfs_or_login(&session) {
            Ok(vfs) => vfs,
            Err(reply) => return Ok(reply),
        };
        let source = match session.rnfr_source.take() {
            Some(source) => source,
            None => return Ok(Reply::new(ReplyCode::BadCommandSequence, "Bad sequence of commands: use RNFR first.")),
        };
        let username = session.username.clone().unwrap_or_default();
        let to = vfs.ftp2fs(&self.path);
        if !args.authorizer.may_write(&username, &to).await {
            return Ok(not_enough_privileges("RNTO"));
        }
        let from = vfs.ftp2fs(&source);
        match vfs.rename(&from, &to).await {
            Ok(()) => Ok(Reply::new(ReplyCode::FileActionOkay, "Renaming ok.")),
            Err(err) => Ok(fs_fail(&err)),
        }
    }
}
