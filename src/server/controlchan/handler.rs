use crate::auth::Authorizer;
use crate::options::PassiveHost;
use crate::server::chancomms::ControlChanMsg;
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::Reply;
use crate::server::session::SharedSession;

use async_trait::async_trait;
use std::fmt;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;

/// Convenience struct to group everything a command handler may need.
pub struct CommandContext {
    pub session: SharedSession,
    pub authorizer: Arc<dyn Authorizer>,
    pub tx_control_chan: Sender<ControlChanMsg>,
    pub local_addr: SocketAddr,
    pub source: SocketAddr,
    pub passive_ports: Option<RangeInclusive<u16>>,
    pub passive_host: PassiveHost,
    pub permit_foreign_addresses: bool,
    pub permit_privileged_ports: bool,
    pub max_login_attempts: u32,
    pub logger: slog::Logger,
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("source", &self.source)
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync + fmt::Debug {
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError>;
}
