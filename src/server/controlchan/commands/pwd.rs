//! The RFC 959 Print Working Directory (`PWD`) command

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Pwd;

#[async_trait]
impl CommandHandler for Pwd {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let session = args.session.lock().await;
        match &session.vfs {
            Some(vfs) => Ok(Reply::new_with_string(
                ReplyCode::DirCreated,
                format!("\"{}\" is the current directory.", vfs.cwd().display()),
            )),
            None => Ok(Reply::new(ReplyCode::NotLoggedIn, "Log in with USER and PASS first.")),
        }
    }
}
