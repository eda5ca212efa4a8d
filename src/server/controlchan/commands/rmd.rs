//! The RFC 959 Remove Directory (`RMD`) command
//
// The session root itself is never removable.

use super::{fs_fail, not_enough_privileges, vfs_or_login};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;
use std::path::Path;

#[derive(Debug)]
pub struct Rmd {
    path: String,
}

impl Rmd {
    pub fn new(path: String) -> Self {
        Rmd { path }
    }
}

#[async_trait]
impl CommandHandler for Rmd {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let session = args.session.lock().await;
        let vfs = match vfs_or_login(&session) {
            Ok(vfs) => vfs,
            Err(reply) => return Ok(reply),
        };
        if vfs.ftpnorm(&self.path) == Path::new("/") {
            return Ok(Reply::new(ReplyCode::FileError, "Can't remove root directory."));
        }
        let username = session.username.clone().unwrap_or_default();
        let host = vfs.ftp2fs(&self.path);
        if !args.authorizer.may_write(&username, &host).await {
            return Ok(not_enough_privileges("RMD"));
        }
        match vfs.rmdir(&host).await {
            Ok(()) => Ok(Reply::new(ReplyCode::FileActionOkay, "Directory removed.")),
            Err(err) => Ok(fs_fail(&err)),
        }
    }
}
