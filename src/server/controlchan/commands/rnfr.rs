//! The RFC 959 Rename From (`RNFR`) command
//
// Stores the rename source for the RNTO that must follow. The source is only
// accepted if it exists on the host (symlinks included).

use super::{not_enough_privileges, vfs_or_login};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Rnfr {
    path: String,
}

impl Rnfr {
    pub fn new(path: String) -> Self {
        Rnfr { path }
    }
}

#[async_trait]
impl CommandHandler for Rnfr {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        let vfs = match vfs_or_login(&session) {
            Ok(vfs) => vfs,
            Err(reply) => return Ok(reply),
        };
        let username = session.username.clone().unwrap_or_default();
        let host = vfs.ftp2fs(&self.path);
        if !args.authorizer.may_write(&username, &host).await {
            return Ok(not_enough_privileges("RNFR"));
        }
        if !vfs.lexists(&host).await {
            return Ok(Reply::new(ReplyCode::FileError, "No such file or directory."));
        }
        session.rnfr_source = Some(self.path.clone());
        Ok(Reply::new(ReplyCode::FileActionPending, "Ready for destination name."))
    }
}
