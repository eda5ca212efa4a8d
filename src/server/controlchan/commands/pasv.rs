//! The RFC 959 Passive (`PASV`) command
//
// This command requests the server-DTP to "listen" on a data port (which is
// not its default data port) and to wait for a connection rather than
// initiate one upon receipt of a transfer command. The reply to this command
// includes the host and port address this server is listening on.

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::datachan;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Pasv;

#[async_trait]
impl CommandHandler for Pasv {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        // The address advertised to the client: the masquerade address if one
        // is configured, otherwise the address the control connection
        // arrived on.
        let octets = match args.passive_host.octets_for(args.local_addr.ip()) {
            Some(octets) => octets,
            None => {
                slog::error!(args.logger, "PASV needs an IPv4 address to advertise");
                return Ok(Reply::new(ReplyCode::CantOpenDataConnection, "Can't open data connection."));
            }
        };

        let mut session = args.session.lock().await;
        // At most one data channel per session; dropping the old handle
        // closes it.
        session.data_chan = None;
        let listener = datachan::listen_passive(
            args.logger.clone(),
            args.local_addr.ip(),
            args.passive_ports.clone(),
            args.source,
            args.permit_foreign_addresses,
            args.tx_control_chan.clone(),
        )
        .await;
        match listener {
            Ok((handle, port)) => {
                session.data_chan = Some(handle);
                let (p1, p2) = (port >> 8, port & 0xff);
                Ok(Reply::new_with_string(
                    ReplyCode::EnteringPassiveMode,
                    format!(
                        "Entering passive mode ({},{},{},{},{},{}).",
                        octets[0], octets[1], octets[2], octets[3], p1, p2
                    ),
                ))
            }
            Err(err) => {
                slog::error!(args.logger, "could not bind passive socket: {}", err);
                Ok(Reply::new(ReplyCode::CantOpenDataConnection, "Can't open data connection."))
            }
        }
    }
}
