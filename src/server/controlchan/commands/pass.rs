//! The RFC 959 Password (`PASS`) command
//
// The authentication gate. A failed attempt may never reveal whether the
// username or the password was wrong; the one exception is the anonymous
// account, whose absence is announced because clients probe for it.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::password::Password;
use crate::server::session::{Session, SessionState};
use crate::vfs::VirtualFs;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Pass {
    password: Password,
}

impl Pass {
    pub fn new(password: Password) -> Self {
        Pass { password }
    }
}

#[async_trait]
impl CommandHandler for Pass {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        if session.state == SessionState::WaitCmd {
            return Ok(Reply::new(ReplyCode::BadCommandSequence, "User already authenticated."));
        }
        let username = match session.username.clone() {
            Some(username) => username,
            None => return Ok(Reply::new(ReplyCode::BadCommandSequence, "Login with USER first.")),
        };

        if args.authorizer.validate(&username, self.password.as_str()).await.is_ok() {
            let home = args.authorizer.home_of(&username).await;
            let vfs = match home {
                Some(home) => VirtualFs::new(home).await,
                None => Err(crate::vfs::FsError::new("no home directory")),
            };
            match vfs {
                Ok(vfs) => {
                    session.vfs = Some(vfs);
                    session.state = SessionState::WaitCmd;
                    session.attempted_logins = 0;
                    session.msg_quit = args.authorizer.msg_quit(&username).await;
                    let msg = args.authorizer.msg_login(&username).await;
                    slog::info!(args.logger, "user {:?} logged in", username);
                    return Ok(Reply::new_with_string(ReplyCode::UserLoggedIn, msg));
                }
                Err(err) => {
                    // A user record pointing at a dead home directory must
                    // look like any other failed login to the client.
                    slog::error!(args.logger, "home directory unusable for {:?}: {}", username, err);
                }
            }
        } else {
            slog::warn!(args.logger, "authentication failed for {:?}", username);
        }

        self.reject(&mut session, &args, &username).await
    }
}

impl Pass {
    async fn reject(&self, session: &mut Session, args: &CommandContext, username: &str) -> Result<Reply, ControlChanError> {
        session.attempted_logins += 1;
        session.username = None;
        session.state = SessionState::New;
        if args.max_login_attempts > 0 && session.attempted_logins >= args.max_login_attempts {
            session.close_when_done = true;
            return Ok(Reply::new(ReplyCode::NotLoggedIn, "Maximum login attempts. Disconnecting."));
        }
        if username == crate::auth::ANONYMOUS_USER && !args.authorizer.has_user(username).await {
            return Ok(Reply::new(ReplyCode::NotLoggedIn, "Anonymous access not allowed."));
        }
        Ok(Reply::new(ReplyCode::NotLoggedIn, "Authentication failed."))
    }
}
