//! The RFC 959 Representation Type (`TYPE`) command
//
// ASCII and Image are supported; L8 is accepted as a synonym for Image, as
// RFC 1123 asks.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::TransferType;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Type {
    param: String,
}

impl Type {
    pub fn new(param: String) -> Self {
        Type { param }
    }
}

#[async_trait]
impl CommandHandler for Type {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        match self.param.to_uppercase().as_str() {
            "A" | "AN" | "A N" => {
                session.data_type = TransferType::Ascii;
                Ok(Reply::new(ReplyCode::CommandOkay, "Type set to: ASCII."))
            }
            "I" | "L8" | "L 8" => {
                session.data_type = TransferType::Binary;
                Ok(Reply::new(ReplyCode::CommandOkay, "Type set to: Binary."))
            }
            _ => Ok(Reply::new_with_string(
                ReplyCode::CommandNotImplementedForParameter,
                format!("Unsupported type \"{}\".", self.param),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::controlchan::handler::CommandContext;
    use crate::server::session::{Session, SessionState, TransferType};
    use std::sync::Arc;
    use tokio::sync::mpsc::channel;
    use tokio::sync::Mutex;

    fn context(session: crate::server::session::SharedSession) -> CommandContext {
        let (tx, _rx) = channel(1);
        CommandContext {
            session,
            authorizer: Arc::new(crate::auth::DefaultAuthorizer::new()),
            tx_control_chan: tx,
            local_addr: "127.0.0.1:21".parse().unwrap(),
            source: "127.0.0.1:54321".parse().unwrap(),
            passive_ports: None,
            passive_host: crate::options::PassiveHost::FromConnection,
            permit_foreign_addresses: false,
            permit_privileged_ports: false,
            max_login_attempts: 3,
            logger: slog::Logger::root(slog::Discard, slog::o!()),
        }
    }

    #[tokio::test]
    async fn switches_between_ascii_and_binary() {
        let mut session = Session::new("127.0.0.1:54321".parse().unwrap());
        session.state = SessionState::WaitCmd;
        let session = Arc::new(Mutex::new(session));

        let reply = Type::new("I".to_string()).handle(context(session.clone())).await.unwrap();
        assert!(matches!(reply, Reply::CodeAndMsg { code: ReplyCode::CommandOkay, .. }));
        assert_eq!(session.lock().await.data_type, TransferType::Binary);

        Type::new("a".to_string()).handle(context(session.clone())).await.unwrap();
        assert_eq!(session.lock().await.data_type, TransferType::Ascii);
    }

    #[tokio::test]
    async fn rejects_unsupported_types() {
        let session = Arc::new(Mutex::new(Session::new("127.0.0.1:54321".parse().unwrap())));
        let reply = Type::new("E".to_string()).handle(context(session.clone())).await.unwrap();
        assert!(matches!(
            reply,
            Reply::CodeAndMsg {
                code: ReplyCode::CommandNotImplementedForParameter,
                ..
            }
        ));
        assert_eq!(session.lock().await.data_type, TransferType::Ascii);
    }
}
