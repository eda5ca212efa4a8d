//! The RFC 959 Change To Parent Directory (`CDUP`) command
//
// Exactly CWD of "..".

use super::Cwd;
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::Reply;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Cdup;

#[async_trait]
impl CommandHandler for Cdup {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        Cwd::new("..".to_string()).handle(args).await
    }
}
