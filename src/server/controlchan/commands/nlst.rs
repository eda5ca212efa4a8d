//! The RFC 959 Name List (`NLST`) command
//
// Bare names, one per line, over the data channel.

use super::list::wire_lines;
use super::{fs_fail, submit_transfer, vfs_or_login};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::Reply;
use crate::server::datachan::TransferJob;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Nlst {
    path: Option<String>,
}

impl Nlst {
    pub fn new(path: Option<String>) -> Self {
        Nlst { path }
    }
}

#[async_trait]
impl CommandHandler for Nlst {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        let vfs = match vfs_or_login(&session) {
            Ok(vfs) => vfs,
            Err(reply) => return Ok(reply),
        };
        let host = vfs.ftp2fs(self.path.as_deref().unwrap_or(""));
        let lines = match vfs.nlst_lines(&host).await {
            Ok(lines) => lines,
            Err(err) => return Ok(fs_fail(&err)),
        };
        Ok(submit_transfer(&mut session, TransferJob::SendBuffer(wire_lines(lines))))
    }
}
