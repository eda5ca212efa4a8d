//! ACCT, SITE and SMNT are recognized but deliberately not implemented.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct NotImplemented {
    name: String,
}

impl NotImplemented {
    pub fn new(name: String) -> Self {
        NotImplemented { name }
    }
}

#[async_trait]
impl CommandHandler for NotImplemented {
    #[tracing_attributes::instrument]
    async fn handle(&self, _args: CommandContext) -> Result<Reply, ControlChanError> {
        Ok(Reply::new_with_string(
            ReplyCode::CommandNotImplemented,
            format!("{} not implemented.", self.name),
        ))
    }
}
