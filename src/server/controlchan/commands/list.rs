//! The RFC 959 List (`LIST`) command
//
// The ls-style listing of a directory (or the single line of a file),
// shipped over the data channel. The common `-a`-style switches clients send
// are accepted and ignored.

use super::{fs_fail, submit_transfer, vfs_or_login};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::Reply;
use crate::server::datachan::TransferJob;

use async_trait::async_trait;

#[derive(Debug)]
pub struct List {
    path: Option<String>,
}

impl List {
    pub fn new(path: Option<String>) -> Self {
        List { path }
    }
}

pub(super) fn wire_lines(lines: Vec<String>) -> Vec<u8> {
    let mut payload = Vec::new();
    for line in lines {
        payload.extend_from_slice(line.as_bytes());
        payload.extend_from_slice(b"\r\n");
    }
    payload
}

#[async_trait]
impl CommandHandler for List {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        let vfs = match vfs_or_login(&session) {
            Ok(vfs) => vfs,
            Err(reply) => return Ok(reply),
        };
        let arg = match self.path.as_deref() {
            Some("-a") | Some("-l") | Some("-al") | Some("-la") | None => "",
            Some(path) => path,
        };
        let host = vfs.ftp2fs(arg);
        let lines = match vfs.list_lines(&host).await {
            Ok(lines) => lines,
            Err(err) => return Ok(fs_fail(&err)),
        };
        Ok(submit_transfer(&mut session, TransferJob::SendBuffer(wire_lines(lines))))
    }
}
