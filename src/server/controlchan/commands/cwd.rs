//! The RFC 959 Change Working Directory (`CWD`) command
//
// The target is probed by opening it for listing once; only then does the
// session's cwd move there.

use super::{fs_fail, vfs_or_login};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Cwd {
    path: String,
}

impl Cwd {
    pub fn new(path: String) -> Self {
        Cwd { path }
    }
}

#[async_trait]
impl CommandHandler for Cwd {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        let vfs = match vfs_or_login(&session) {
            Ok(vfs) => vfs,
            Err(reply) => return Ok(reply),
        };
        let host = vfs.ftp2fs(&self.path);
        if let Err(err) = vfs.probe_dir(&host).await {
            return Ok(fs_fail(&err));
        }
        let new_cwd = vfs.fs2ftp(&host);
        let reply = Reply::new_with_string(
            ReplyCode::FileActionOkay,
            format!("\"{}\" is the current directory.", new_cwd.display()),
        );
        if let Some(vfs) = session.vfs.as_mut() {
            vfs.set_cwd(new_cwd);
        }
        Ok(reply)
    }
}
