//! The RFC 3659 Size (`SIZE`) command
//
// The size in raw host bytes; the ASCII transfer type does not change it.
// Directories are refused.

use super::{fs_fail, vfs_or_login};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Size {
    path: String,
}

impl Size {
    pub fn new(path: String) -> Self {
        Size { path }
    }
}

#[async_trait]
impl CommandHandler for Size {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let session = args.session.lock().await;
        let vfs = match vfs_or_login(&session) {
            Ok(vfs) => vfs,
            Err(reply) => return Ok(reply),
        };
        let host = vfs.ftp2fs(&self.path);
        match vfs.metadata(&host).await {
            Ok(meta) if meta.is_dir() => Ok(Reply::new(ReplyCode::FileError, "Could not get a file size.")),
            Ok(meta) => Ok(Reply::new_with_string(ReplyCode::FileStatus, meta.len().to_string())),
            Err(err) => Ok(fs_fail(&err)),
        }
    }
}
