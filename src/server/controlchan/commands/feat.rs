//! The RFC 2389 Feature (`FEAT`) command

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Feat;

#[async_trait]
impl CommandHandler for Feat {
    #[tracing_attributes::instrument]
    async fn handle(&self, _args: CommandContext) -> Result<Reply, ControlChanError> {
        // Each feature line must be indented by a space; kept in alphabetical
        // order.
        let feat_text = vec!["Features supported:", " MDTM", " REST STREAM", " SIZE", " TVFS", "End FEAT."];
        Ok(Reply::new_multiline(ReplyCode::SystemStatus, feat_text))
    }
}
