//! The RFC 3659 Machine Listing (`MLSD`) command
//
// Machine-readable fact lines over the data channel. Only directories can be
// MLSD'ed; anything else is a parameter error per the RFC.

use super::list::wire_lines;
use super::{fs_fail, submit_transfer, vfs_or_login};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::datachan::TransferJob;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Mlsd {
    path: Option<String>,
}

impl Mlsd {
    pub fn new(path: Option<String>) -> Self {
        Mlsd { path }
    }
}

#[async_trait]
impl CommandHandler for Mlsd {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        let vfs = match vfs_or_login(&session) {
            Ok(vfs) => vfs,
            Err(reply) => return Ok(reply),
        };
        let host = vfs.ftp2fs(self.path.as_deref().unwrap_or(""));
        if !vfs.is_dir(&host).await {
            return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "No such directory."));
        }
        let lines = match vfs.mlsd_lines(&host).await {
            Ok(lines) => lines,
            Err(err) => return Ok(fs_fail(&err)),
        };
        Ok(submit_transfer(&mut session, TransferJob::SendBuffer(wire_lines(lines))))
    }
}
