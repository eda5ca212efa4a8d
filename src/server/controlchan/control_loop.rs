//! The per-session control channel event loop.
//!
//! One task per accepted connection. It frames the socket with [`FtpCodec`],
//! then serves two event sources until the session dies: parsed commands
//! from the client and [`ControlChanMsg`] notifications from the session's
//! data channel. The argument-class check already happened in the parser;
//! the login gate and the path containment gate run here, so the per-command
//! handlers never see a command they are not allowed to execute.

use crate::auth::Authorizer;
use crate::options::PassiveHost;
use crate::server::chancomms::ControlChanMsg;
use crate::server::controlchan::command::Command;
use crate::server::controlchan::commands;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{ControlChanError, ControlChanErrorKind, Event, FtpCodec, Reply, ReplyCode};
use crate::server::ftpserver::ConnectionGuard;
use crate::server::session::{Session, SessionState, SharedSession};

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{channel, Sender};
use tokio::sync::Mutex;
use tokio_util::codec::Decoder;

/// Everything a session loop needs to know, handed down from the listener.
pub struct LoopConfig {
    pub authorizer: Arc<dyn Authorizer>,
    pub greeting: String,
    pub passive_ports: Option<RangeInclusive<u16>>,
    pub passive_host: PassiveHost,
    pub permit_foreign_addresses: bool,
    pub permit_privileged_ports: bool,
    pub max_login_attempts: u32,
    pub logger: slog::Logger,
}

/// Greets the client and spawns the session's event loop.
pub async fn spawn_loop(config: LoopConfig, tcp_stream: TcpStream, guard: ConnectionGuard) -> Result<(), ControlChanError> {
    let local_addr = tcp_stream.local_addr()?;
    let source = tcp_stream.peer_addr()?;
    let logger = config.logger.new(slog::o!("peer" => source.to_string()));
    let session: SharedSession = Arc::new(Mutex::new(Session::new(source)));
    let (tx_control_chan, mut rx_control_chan) = channel::<ControlChanMsg>(16);

    let codec = FtpCodec::new();
    let (mut reply_sink, command_source) = codec.framed(tcp_stream).split();
    reply_sink
        .send(Reply::new_with_string(ReplyCode::ServiceReady, config.greeting.clone()))
        .await?;
    let mut command_source = command_source.fuse();

    tokio::spawn(async move {
        // Connection accounting lives and dies with this task.
        let _guard = guard;
        loop {
            let event: Result<Event, ControlChanError> = tokio::select! {
                incoming = command_source.next() => match incoming {
                    None => {
                        slog::info!(logger, "control connection closed by peer");
                        return;
                    }
                    Some(Ok(cmd)) => Ok(Event::Command(cmd)),
                    Some(Err(err)) => Err(err),
                },
                Some(msg) = rx_control_chan.recv() => Ok(Event::InternalMsg(msg)),
            };

            let reply = match event {
                Ok(event) => {
                    handle_event(
                        event,
                        session.clone(),
                        &config,
                        tx_control_chan.clone(),
                        local_addr,
                        source,
                        logger.clone(),
                    )
                    .await
                }
                Err(err) => match error_reply(&err) {
                    Some(reply) => reply,
                    None => {
                        slog::warn!(logger, "fatal control channel error: {}", err);
                        return;
                    }
                },
            };

            if !matches!(reply, Reply::None) && reply_sink.send(reply).await.is_err() {
                slog::warn!(logger, "could not send reply");
                return;
            }

            let session = session.lock().await;
            if session.close_when_done {
                return;
            }
            if session.state == SessionState::QuitPending && session.data_chan.is_none() {
                return;
            }
        }
    });

    Ok(())
}

async fn handle_event(
    event: Event,
    session: SharedSession,
    config: &LoopConfig,
    tx_control_chan: Sender<ControlChanMsg>,
    local_addr: SocketAddr,
    source: SocketAddr,
    logger: slog::Logger,
) -> Reply {
    match event {
        Event::Command(cmd) => handle_command(cmd, session, config, tx_control_chan, local_addr, source, logger).await,
        Event::InternalMsg(msg) => handle_internal_msg(msg, session, logger).await,
    }
}

async fn handle_command(
    cmd: Command,
    session: SharedSession,
    config: &LoopConfig,
    tx_control_chan: Sender<ControlChanMsg>,
    local_addr: SocketAddr,
    source: SocketAddr,
    logger: slog::Logger,
) -> Reply {
    // The Display impl masks the PASS argument.
    slog::info!(logger, "<= {}", cmd);

    {
        let session = session.lock().await;
        if session.state == SessionState::QuitPending {
            // The client said QUIT; whatever else it sends is void.
            return Reply::none();
        }
        if session.state != SessionState::WaitCmd && !cmd.exempt_from_auth() {
            return Reply::new(ReplyCode::NotLoggedIn, "Log in with USER and PASS first.");
        }
        if let (Some(path), Some(vfs)) = (cmd.sandboxed_path(), &session.vfs) {
            let host = vfs.ftp2fs(path);
            if !vfs.validpath(&host).await {
                return Reply::new_with_string(
                    ReplyCode::FileError,
                    format!(
                        "\"{}\" points to a path which is outside the user's root directory.",
                        vfs.ftpnorm(path).display()
                    ),
                );
            }
        }
    }

    let args = CommandContext {
        session,
        authorizer: config.authorizer.clone(),
        tx_control_chan,
        local_addr,
        source,
        passive_ports: config.passive_ports.clone(),
        passive_host: config.passive_host,
        permit_foreign_addresses: config.permit_foreign_addresses,
        permit_privileged_ports: config.permit_privileged_ports,
        max_login_attempts: config.max_login_attempts,
        logger: logger.clone(),
    };

    let handler: Box<dyn CommandHandler> = match cmd {
        Command::User { username } => Box::new(commands::User::new(username)),
        Command::Pass { password } => Box::new(commands::Pass::new(password)),
        Command::Quit => Box::new(commands::Quit),
        Command::Rein => Box::new(commands::Rein),
        Command::Port { addr } => Box::new(commands::Port::new(addr)),
        Command::Pasv => Box::new(commands::Pasv),
        Command::Type { param } => Box::new(commands::Type::new(param)),
        Command::Stru { param } => Box::new(commands::Stru::new(param)),
        Command::Mode { param } => Box::new(commands::Mode::new(param)),
        Command::Rest { position } => Box::new(commands::Rest::new(position)),
        Command::Retr { path } => Box::new(commands::Retr::new(path)),
        Command::Stor { path } => Box::new(commands::Stor::new(path)),
        Command::Appe { path } => Box::new(commands::Appe::new(path)),
        Command::Stou { path } => Box::new(commands::Stou::new(path)),
        Command::List { path } => Box::new(commands::List::new(path)),
        Command::Nlst { path } => Box::new(commands::Nlst::new(path)),
        Command::Mlsd { path } => Box::new(commands::Mlsd::new(path)),
        Command::Mlst { path } => Box::new(commands::Mlst::new(path)),
        Command::Pwd => Box::new(commands::Pwd),
        Command::Cwd { path } => Box::new(commands::Cwd::new(path)),
        Command::Cdup => Box::new(commands::Cdup),
        Command::Mkd { path } => Box::new(commands::Mkd::new(path)),
        Command::Rmd { path } => Box::new(commands::Rmd::new(path)),
        Command::Dele { path } => Box::new(commands::Dele::new(path)),
        Command::Rnfr { path } => Box::new(commands::Rnfr::new(path)),
        Command::Rnto { path } => Box::new(commands::Rnto::new(path)),
        Command::Size { path } => Box::new(commands::Size::new(path)),
        Command::Mdtm { path } => Box::new(commands::Mdtm::new(path)),
        Command::Stat { path } => Box::new(commands::Stat::new(path)),
        Command::Abor => Box::new(commands::Abor),
        Command::Feat => Box::new(commands::Feat),
        Command::Help { topic } => Box::new(commands::Help::new(topic)),
        Command::Syst => Box::new(commands::Syst),
        Command::Noop => Box::new(commands::Noop),
        Command::Allo => Box::new(commands::Allo),
        Command::NotImplemented { name } => Box::new(commands::NotImplemented::new(name)),
    };

    match handler.handle(args).await {
        Ok(reply) => reply,
        Err(err) => {
            // Never leak internals to the client; the log gets the details.
            slog::error!(logger, "error handling command: {}", err);
            Reply::new(ReplyCode::LocalError, "Unknown internal server error, please try again later.")
        }
    }
}

async fn handle_internal_msg(msg: ControlChanMsg, session: SharedSession, logger: slog::Logger) -> Reply {
    match msg {
        ControlChanMsg::DataConnected { peer } => {
            slog::info!(logger, "data connection established with {}", peer);
            Reply::none()
        }
        ControlChanMsg::ForeignPeerRejected { peer } => Reply::new_with_string(
            ReplyCode::CantOpenDataConnection,
            format!("Rejected data connection from foreign address {}:{}.", peer.ip(), peer.port()),
        ),
        ControlChanMsg::TransferDone { bytes } => {
            let mut session = session.lock().await;
            session.data_chan = None;
            slog::info!(logger, "transfer complete, {} bytes", bytes);
            Reply::new(ReplyCode::ClosingDataConnection, "Transfer complete.")
        }
        ControlChanMsg::TransferFailed { reason } => {
            let mut session = session.lock().await;
            session.data_chan = None;
            Reply::new_with_string(ReplyCode::ConnectionClosed, format!("{}; transfer aborted.", reason))
        }
    }
}

// Maps a recoverable control channel error to its reply; `None` means the
// session cannot go on.
fn error_reply(err: &ControlChanError) -> Option<Reply> {
    match err.kind() {
        ControlChanErrorKind::UnknownCommand { command } => Some(Reply::new_with_string(
            ReplyCode::CommandSyntaxError,
            format!("Command \"{}\" not understood.", command),
        )),
        ControlChanErrorKind::MissingArgument => Some(Reply::new(
            ReplyCode::ParameterSyntaxError,
            "Syntax error: command needs an argument.",
        )),
        ControlChanErrorKind::UnexpectedArgument => Some(Reply::new(
            ReplyCode::ParameterSyntaxError,
            "Syntax error: command does not accept arguments.",
        )),
        ControlChanErrorKind::InvalidArgument => Some(Reply::new(ReplyCode::ParameterSyntaxError, "Syntax error in command argument.")),
        ControlChanErrorKind::Utf8Error => Some(Reply::new(ReplyCode::ParameterSyntaxError, "Can't decode command.")),
        ControlChanErrorKind::CommandLineTooLong => Some(Reply::new(ReplyCode::CommandSyntaxError, "Command too long.")),
        ControlChanErrorKind::IoError | ControlChanErrorKind::InternalServerError => None,
    }
}
