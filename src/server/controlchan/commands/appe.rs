//! The RFC 959 Append (`APPE`) command
//
// Like STOR, but existing data is kept and the upload lands at the end.
// A pending REST offset makes no sense here and is refused.

use super::{fs_fail, not_enough_privileges, submit_transfer, vfs_or_login};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::datachan::TransferJob;
use crate::server::session::TransferType;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Appe {
    path: String,
}

impl Appe {
    pub fn new(path: String) -> Self {
        Appe { path }
    }
}

#[async_trait]
impl CommandHandler for Appe {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        let vfs = match vfs_or_login(&session) {
            Ok(vfs) => vfs,
            Err(reply) => return Ok(reply),
        };
        let username = session.username.clone().unwrap_or_default();
        if std::mem::take(&mut session.restart_pos) > 0 {
            return Ok(Reply::new(ReplyCode::FileError, "Can't APPE while REST request is pending."));
        }

        let host = vfs.ftp2fs(&self.path);
        if !args.authorizer.may_write(&username, &host).await {
            return Ok(not_enough_privileges("APPE"));
        }
        let file = match vfs.open_append(&host).await {
            Ok(file) => file,
            Err(err) => return Ok(fs_fail(&err)),
        };
        let ascii = session.data_type == TransferType::Ascii;
        Ok(submit_transfer(&mut session, TransferJob::Receive { file, ascii }))
    }
}
