//! The RFC 3659 Modification Time (`MDTM`) command
//
// The timestamp goes out as YYYYMMDDHHMMSS in UTC, as the RFC mandates.
// Only regular files have one.

use super::{fs_fail, vfs_or_login};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug)]
pub struct Mdtm {
    path: String,
}

impl Mdtm {
    pub fn new(path: String) -> Self {
        Mdtm { path }
    }
}

#[async_trait]
impl CommandHandler for Mdtm {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let session = args.session.lock().await;
        let vfs = match vfs_or_login(&session) {
            Ok(vfs) => vfs,
            Err(reply) => return Ok(reply),
        };
        let host = vfs.ftp2fs(&self.path);
        let meta = match vfs.metadata(&host).await {
            Ok(meta) => meta,
            Err(err) => return Ok(fs_fail(&err)),
        };
        if !meta.is_file() {
            return Ok(Reply::new_with_string(
                ReplyCode::FileError,
                format!("{} is not retrievable.", vfs.ftpnorm(&self.path).display()),
            ));
        }
        match meta.modified() {
            Ok(mtime) => Ok(Reply::new_with_string(
                ReplyCode::FileStatus,
                DateTime::<Utc>::from(mtime).format("%Y%m%d%H%M%S").to_string(),
            )),
            Err(err) => Ok(fs_fail(&err.into())),
        }
    }
}
