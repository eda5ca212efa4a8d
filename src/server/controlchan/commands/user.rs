//! The RFC 959 User Name (`USER`) command
//
// Always answered with 331, whether the user exists or not: nothing may
// reveal which usernames are real. A USER issued mid-session first flushes
// the current account.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::SessionState;

use async_trait::async_trait;

#[derive(Debug)]
pub struct User {
    username: String,
}

impl User {
    pub fn new(username: String) -> Self {
        User { username }
    }
}

#[async_trait]
impl CommandHandler for User {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        if session.state == SessionState::WaitCmd {
            session.flush_account();
        }
        // The anonymous account matches case-insensitively.
        let username = if self.username.eq_ignore_ascii_case(crate::auth::ANONYMOUS_USER) {
            crate::auth::ANONYMOUS_USER.to_string()
        } else {
            self.username.clone()
        };
        session.username = Some(username);
        session.state = SessionState::WaitPass;
        Ok(Reply::new(ReplyCode::NeedPassword, "Username ok, send password."))
    }
}
