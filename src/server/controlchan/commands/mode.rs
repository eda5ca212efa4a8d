//! The RFC 959 Transfer Mode (`MODE`) command
//
// Only stream mode is supported.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Mode {
    param: String,
}

impl Mode {
    pub fn new(param: String) -> Self {
        Mode { param }
    }
}

#[async_trait]
impl CommandHandler for Mode {
    #[tracing_attributes::instrument]
    async fn handle(&self, _args: CommandContext) -> Result<Reply, ControlChanError> {
        if self.param.eq_ignore_ascii_case("s") {
            Ok(Reply::new(ReplyCode::CommandOkay, "Transfer mode set to: S."))
        } else {
            Ok(Reply::new(ReplyCode::CommandNotImplementedForParameter, "Unimplemented MODE type."))
        }
    }
}
