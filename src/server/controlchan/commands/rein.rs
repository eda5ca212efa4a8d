//! The RFC 959 Reinitialize (`REIN`) command
//
// Flushes the account: back to the unauthenticated state with every transfer
// parameter at its default, ready for a fresh USER.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Rein;

#[async_trait]
impl CommandHandler for Rein {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        session.flush_account();
        Ok(Reply::new(ReplyCode::UserLoggedIn, "Ready for new user."))
    }
}
