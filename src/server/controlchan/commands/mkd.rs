//! The RFC 959 Make Directory (`MKD`) command

use super::{fs_fail, not_enough_privileges, vfs_or_login};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Mkd {
    path: String,
}

impl Mkd {
    pub fn new(path: String) -> Self {
        Mkd { path }
    }
}

#[async_trait]
impl CommandHandler for Mkd {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let session = args.session.lock().await;
        let vfs = match vfs_or_login(&session) {
            Ok(vfs) => vfs,
            Err(reply) => return Ok(reply),
        };
        let username = session.username.clone().unwrap_or_default();
        let host = vfs.ftp2fs(&self.path);
        if !args.authorizer.may_write(&username, &host).await {
            return Ok(not_enough_privileges("MKD"));
        }
        match vfs.mkdir(&host).await {
            Ok(()) => Ok(Reply::new_with_string(
                ReplyCode::DirCreated,
                format!("\"{}\" directory created.", vfs.ftpnorm(&self.path).display()),
            )),
            Err(err) => Ok(fs_fail(&err)),
        }
    }
}
