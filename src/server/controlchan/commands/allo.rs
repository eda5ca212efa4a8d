//! The RFC 959 Allocate (`ALLO`) command
//
// Storage is never pre-allocated, so this is a courtesy reply.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Allo;

#[async_trait]
impl CommandHandler for Allo {
    #[tracing_attributes::instrument]
    async fn handle(&self, _args: CommandContext) -> Result<Reply, ControlChanError> {
        Ok(Reply::new(ReplyCode::CommandOkayNotImplemented, "No storage allocation necessary."))
    }
}
