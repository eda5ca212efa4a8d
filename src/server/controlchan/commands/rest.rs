//! The RFC 3659 Restart (`REST`) command
//
// Stores the offset the next RETR or STOR resumes at; that command consumes
// (resets) it whether it succeeds or not.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Rest {
    position: u64,
}

impl Rest {
    pub fn new(position: u64) -> Self {
        Rest { position }
    }
}

#[async_trait]
impl CommandHandler for Rest {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        session.restart_pos = self.position;
        Ok(Reply::new_with_string(
            ReplyCode::FileActionPending,
            format!("Restarting at position {}.", self.position),
        ))
    }
}
