//! The RFC 959 Abort (`ABOR`) command
//
// Cancels whatever the data channel is doing. The reply tells apart four
// situations: no data channel at all, a channel that is still listening or
// dialing, an open channel that has not moved a byte yet, and a transfer in
// progress. Only the last one gets the 426/226 pair.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Abor;

#[async_trait]
impl CommandHandler for Abor {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        match session.data_chan.take() {
            None => Ok(Reply::new(ReplyCode::DataConnectionOpen, "No transfer to abort.")),
            Some(chan) => {
                let transferring = chan.is_open() && chan.in_progress();
                chan.abort();
                drop(chan);
                if transferring {
                    Ok(Reply::Sequence(vec![
                        Reply::new(ReplyCode::ConnectionClosed, "Connection closed; transfer aborted."),
                        Reply::new(ReplyCode::ClosingDataConnection, "ABOR command successful."),
                    ]))
                } else {
                    Ok(Reply::new(ReplyCode::DataConnectionOpen, "ABOR command successful; data channel closed."))
                }
            }
        }
    }
}
