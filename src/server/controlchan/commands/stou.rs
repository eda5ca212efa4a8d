//! The RFC 959 Store Unique (`STOU`) command
//
// Like STOR, but the server picks a name that does not exist yet. The chosen
// basename travels in the text of the preliminary reply, `150 FILE: <name>`.

use super::{fs_fail, not_enough_privileges, submit_transfer_with, vfs_or_login};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::datachan::TransferJob;
use crate::server::session::TransferType;

use async_trait::async_trait;

const DEFAULT_PREFIX: &str = "ftpd.";

#[derive(Debug)]
pub struct Stou {
    path: Option<String>,
}

impl Stou {
    pub fn new(path: Option<String>) -> Self {
        Stou { path }
    }
}

#[async_trait]
impl CommandHandler for Stou {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        let vfs = match vfs_or_login(&session) {
            Ok(vfs) => vfs,
            Err(reply) => return Ok(reply),
        };
        let username = session.username.clone().unwrap_or_default();
        // Resuming into a file that does not exist yet makes no sense.
        if std::mem::take(&mut session.restart_pos) > 0 {
            return Ok(Reply::new(ReplyCode::FileError, "Can't STOU while REST request is pending."));
        }

        // The argument, when given, contributes the directory and the name
        // prefix of the unique file.
        let (dir_arg, prefix) = match &self.path {
            Some(arg) => match arg.rfind('/') {
                Some(i) => (arg[..i + 1].to_string(), arg[i + 1..].to_string()),
                None => (String::new(), arg.clone()),
            },
            None => (String::new(), DEFAULT_PREFIX.to_string()),
        };
        let prefix = if prefix.is_empty() { DEFAULT_PREFIX.to_string() } else { prefix };

        let host_dir = vfs.ftp2fs(&dir_arg);
        if !args.authorizer.may_write(&username, &host_dir).await {
            return Ok(not_enough_privileges("STOU"));
        }
        let (file, basename) = match vfs.mkstemp(&host_dir, &prefix).await {
            Ok(pair) => pair,
            Err(err) => return Ok(fs_fail(&err)),
        };
        let ascii = session.data_type == TransferType::Ascii;
        let text = format!("FILE: {}", basename);
        Ok(submit_transfer_with(
            &mut session,
            TransferJob::Receive { file, ascii },
            text.clone(),
            text,
        ))
    }
}
