//! The RFC 959 Data Port (`PORT`) command
//
// The client names an address, we dial it. Foreign addresses and privileged
// ports are refused unless configuration says otherwise (RFC 2577 bounce
// protection). A previous data channel, whatever its state, is closed first.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::datachan;

use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug)]
pub struct Port {
    addr: String,
}

impl Port {
    pub fn new(addr: String) -> Self {
        Port { addr }
    }

    // `h1,h2,h3,h4,p1,p2` with every field an u8; port = 256 * p1 + p2.
    fn parse_tuple(&self) -> Option<SocketAddr> {
        let fields: Vec<u8> = self
            .addr
            .split(',')
            .map(|part| part.parse::<u8>())
            .collect::<Result<_, _>>()
            .ok()?;
        if fields.len() != 6 {
            return None;
        }
        let ip = Ipv4Addr::new(fields[0], fields[1], fields[2], fields[3]);
        let port = 256 * u16::from(fields[4]) + u16::from(fields[5]);
        Some(SocketAddr::new(IpAddr::V4(ip), port))
    }
}

#[async_trait]
impl CommandHandler for Port {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let peer = match self.parse_tuple() {
            Some(peer) => peer,
            None => return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Invalid PORT format.")),
        };
        if peer.ip() != args.source.ip() && !args.permit_foreign_addresses {
            return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Can't connect to a foreign address."));
        }
        if peer.port() < 1024 && !args.permit_privileged_ports {
            return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Can't connect over a privileged port."));
        }

        let mut session = args.session.lock().await;
        // At most one data channel per session; dropping the old handle
        // closes it.
        session.data_chan = None;
        match datachan::connect_active(args.logger.clone(), peer, args.tx_control_chan.clone()).await {
            Ok(handle) => {
                session.data_chan = Some(handle);
                Ok(Reply::new(ReplyCode::CommandOkay, "PORT command successful."))
            }
            Err(err) => {
                slog::warn!(args.logger, "active connect to {} failed: {}", peer, err);
                Ok(Reply::new_with_string(
                    ReplyCode::CantOpenDataConnection,
                    format!("Can't connect to {}.", peer),
                ))
            }
        }
    }
}
