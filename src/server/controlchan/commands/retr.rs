//! The RFC 959 Retrieve (`RETR`) command
//
// This command causes the server-DTP to transfer a copy of the file,
// specified in the pathname, to the server- or user-DTP at the other end of
// the data connection. The status and contents of the file at the server
// site shall be unaffected.

use super::{fs_fail, not_enough_privileges, submit_transfer, vfs_or_login};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::datachan::TransferJob;
use crate::server::session::TransferType;

use async_trait::async_trait;
use tokio::io::AsyncSeekExt;

#[derive(Debug)]
pub struct Retr {
    path: String,
}

impl Retr {
    pub fn new(path: String) -> Self {
        Retr { path }
    }
}

#[async_trait]
impl CommandHandler for Retr {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        let vfs = match vfs_or_login(&session) {
            Ok(vfs) => vfs,
            Err(reply) => return Ok(reply),
        };
        let username = session.username.clone().unwrap_or_default();
        // REST is consumed here, success or not.
        let restart = std::mem::take(&mut session.restart_pos);

        let host = vfs.ftp2fs(&self.path);
        if !args.authorizer.may_read(&username, &host).await {
            return Ok(not_enough_privileges("RETR"));
        }
        let mut file = match vfs.open_read(&host).await {
            Ok(file) => file,
            Err(err) => return Ok(fs_fail(&err)),
        };
        if restart > 0 {
            let size = match vfs.getsize(&host).await {
                Ok(size) => size,
                Err(err) => return Ok(fs_fail(&err)),
            };
            if restart > size {
                return Ok(Reply::new(ReplyCode::InvalidRestParameter, "Invalid REST parameter."));
            }
            if let Err(err) = file.seek(std::io::SeekFrom::Start(restart)).await {
                return Ok(fs_fail(&err.into()));
            }
        }
        let ascii = session.data_type == TransferType::Ascii;
        Ok(submit_transfer(&mut session, TransferJob::SendFile { file, ascii }))
    }
}
