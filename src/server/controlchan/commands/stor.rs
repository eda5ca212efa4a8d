//! The RFC 959 Store (`STOR`) command
//
// This command causes the server-DTP to accept the data transferred via the
// data connection and to store the data as a file at the server site. If the
// file exists it is replaced, unless a REST offset asks for a resume.

use super::{fs_fail, not_enough_privileges, submit_transfer, vfs_or_login};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::Reply;
use crate::server::datachan::TransferJob;
use crate::server::session::TransferType;

use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncSeekExt;

#[derive(Debug)]
pub struct Stor {
    path: String,
}

impl Stor {
    pub fn new(path: String) -> Self {
        Stor { path }
    }
}

#[async_trait]
impl CommandHandler for Stor {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        let vfs = match vfs_or_login(&session) {
            Ok(vfs) => vfs,
            Err(reply) => return Ok(reply),
        };
        let username = session.username.clone().unwrap_or_default();
        let restart = std::mem::take(&mut session.restart_pos);

        let host = vfs.ftp2fs(&self.path);
        // Creating a file needs write permission on the directory it lands in.
        let parent = host.parent().unwrap_or_else(|| Path::new("/")).to_path_buf();
        if !args.authorizer.may_write(&username, &parent).await {
            return Ok(not_enough_privileges("STOR"));
        }
        let file = if restart > 0 {
            match vfs.open_rw(&host).await {
                Ok(mut file) => match file.seek(std::io::SeekFrom::Start(restart)).await {
                    Ok(_) => file,
                    Err(err) => return Ok(fs_fail(&err.into())),
                },
                Err(err) => return Ok(fs_fail(&err)),
            }
        } else {
            match vfs.open_write(&host).await {
                Ok(file) => file,
                Err(err) => return Ok(fs_fail(&err)),
            }
        };
        let ascii = session.data_type == TransferType::Ascii;
        Ok(submit_transfer(&mut session, TransferJob::Receive { file, ascii }))
    }
}
