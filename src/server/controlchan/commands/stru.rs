//! The RFC 959 File Structure (`STRU`) command
//
// Only the default file structure is supported.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Stru {
    param: String,
}

impl Stru {
    pub fn new(param: String) -> Self {
        Stru { param }
    }
}

#[async_trait]
impl CommandHandler for Stru {
    #[tracing_attributes::instrument]
    async fn handle(&self, _args: CommandContext) -> Result<Reply, ControlChanError> {
        if self.param.eq_ignore_ascii_case("f") {
            Ok(Reply::new(ReplyCode::CommandOkay, "File transfer structure set to: F."))
        } else {
            Ok(Reply::new(ReplyCode::CommandNotImplementedForParameter, "Unimplemented STRU type."))
        }
    }
}
