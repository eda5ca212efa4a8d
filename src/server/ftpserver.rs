//! The [`Server`] and [`ServerBuilder`] types: configuration, the accept
//! loop and connection accounting.

use crate::auth::Authorizer;
use crate::options::{self, PassiveHost};
use crate::server::controlchan::control_loop::{spawn_loop, LoopConfig};
use crate::server::error::ServerError;

use dashmap::DashMap;
use slog::Drain;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpSocket, TcpStream};

/// An instance of an FTP server. It aggregates an
/// [`Authorizer`](crate::auth::Authorizer) implementation that is consulted
/// for authentication and per-user permissions; every session is sandboxed
/// into the home directory of the user it logged in as.
///
/// The server is created through a [`ServerBuilder`] and started with
/// [`listen`](Server::listen):
///
/// ```no_run
/// use std::sync::Arc;
/// use sandftp::{auth::DefaultAuthorizer, ServerBuilder};
///
/// #[tokio::main]
/// async fn main() {
///     let auth = DefaultAuthorizer::with_anonymous("/srv/ftp/pub").unwrap();
///     let server = ServerBuilder::new(Arc::new(auth))
///         .greeting("Welcome to my FTP server")
///         .passive_ports(50000..=65535)
///         .build();
///     server.listen("0.0.0.0:2121").await.unwrap();
/// }
/// ```
pub struct Server {
    authorizer: Arc<dyn Authorizer>,
    greeting: String,
    passive_ports: Option<RangeInclusive<u16>>,
    passive_host: PassiveHost,
    permit_foreign_addresses: bool,
    permit_privileged_ports: bool,
    max_connections: usize,
    max_connections_per_ip: usize,
    max_login_attempts: u32,
    logger: slog::Logger,
}

/// Used to create [`Server`]s.
pub struct ServerBuilder {
    authorizer: Arc<dyn Authorizer>,
    greeting: Option<String>,
    passive_ports: Option<RangeInclusive<u16>>,
    passive_host: PassiveHost,
    permit_foreign_addresses: bool,
    permit_privileged_ports: bool,
    max_connections: usize,
    max_connections_per_ip: usize,
    max_login_attempts: u32,
    logger: slog::Logger,
}

impl ServerBuilder {
    /// Creates a builder around the given [`Authorizer`] with every knob at
    /// its default: no passive port range (the kernel picks), no masquerade
    /// address, foreign data connections and privileged ports refused, no
    /// connection caps, three login attempts.
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        ServerBuilder {
            authorizer,
            greeting: None,
            passive_ports: None,
            passive_host: options::DEFAULT_PASSIVE_HOST,
            permit_foreign_addresses: false,
            permit_privileged_ports: false,
            max_connections: 0,
            max_connections_per_ip: 0,
            max_login_attempts: options::DEFAULT_MAX_LOGIN_ATTEMPTS,
            logger: slog::Logger::root(slog_stdlog::StdLog {}.fuse(), slog::o!()),
        }
    }

    /// The text of the `220` greeting.
    pub fn greeting<S: Into<String>>(mut self, greeting: S) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    /// Restrict passive data sockets to this port range. Ports are drawn
    /// from it uniformly, without replacement; an exhausted range falls back
    /// to a kernel-assigned port.
    pub fn passive_ports(mut self, range: RangeInclusive<u16>) -> Self {
        self.passive_ports = Some(range);
        self
    }

    /// Advertise this address in `227` replies instead of the address the
    /// control connection arrived on. For servers behind NAT.
    pub fn masquerade_address(mut self, ip: Ipv4Addr) -> Self {
        self.passive_host = PassiveHost::Ip(ip);
        self
    }

    /// Accept data connections from (PASV) and to (PORT) addresses other
    /// than the control channel peer. Off by default (RFC 2577 bounce
    /// protection).
    pub fn permit_foreign_addresses(mut self, permit: bool) -> Self {
        self.permit_foreign_addresses = permit;
        self
    }

    /// Allow PORT targets below 1024. Off by default.
    pub fn permit_privileged_ports(mut self, permit: bool) -> Self {
        self.permit_privileged_ports = permit;
        self
    }

    /// Cap the number of simultaneous sessions; 0 means unlimited.
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Cap the number of simultaneous sessions per client IP; 0 means
    /// unlimited.
    pub fn max_connections_per_ip(mut self, max: usize) -> Self {
        self.max_connections_per_ip = max;
        self
    }

    /// How many failed PASS attempts disconnect the client.
    pub fn max_login_attempts(mut self, max: u32) -> Self {
        self.max_login_attempts = max;
        self
    }

    /// Replaces the default stdlog-backed logger.
    pub fn logger(mut self, logger: slog::Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Finalize the options and build a [`Server`].
    pub fn build(self) -> Server {
        Server {
            authorizer: self.authorizer,
            greeting: self
                .greeting
                .unwrap_or_else(|| format!("sandftp {} ready.", env!("CARGO_PKG_VERSION"))),
            passive_ports: self.passive_ports,
            passive_host: self.passive_host,
            permit_foreign_addresses: self.permit_foreign_addresses,
            permit_privileged_ports: self.permit_privileged_ports,
            max_connections: self.max_connections,
            max_connections_per_ip: self.max_connections_per_ip,
            max_login_attempts: self.max_login_attempts,
            logger: self.logger,
        }
    }
}

// The listen backlog for the control socket.
const BACKLOG: u32 = 5;

impl Server {
    /// Binds the control port and serves clients until the task is dropped.
    pub async fn listen(self, bind_address: &str) -> Result<(), ServerError> {
        let addr: std::net::SocketAddr = bind_address
            .parse()
            .map_err(|err| ServerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, err)))?;
        let socket = match addr {
            std::net::SocketAddr::V4(_) => TcpSocket::new_v4().map_err(ServerError::Bind)?,
            std::net::SocketAddr::V6(_) => TcpSocket::new_v6().map_err(ServerError::Bind)?,
        };
        socket.set_reuseaddr(true).map_err(ServerError::Bind)?;
        socket.bind(addr).map_err(ServerError::Bind)?;
        let listener = socket.listen(BACKLOG).map_err(ServerError::Bind)?;
        let logger = self.logger.clone();
        slog::info!(logger, "listening on {}", listener.local_addr()?);
        let counts = Arc::new(ConnectionCounts::new());
        loop {
            match listener.accept().await {
                Ok((tcp_stream, peer)) => {
                    let (guard, total_now, ip_now) = counts.register(peer.ip());
                    if self.max_connections > 0 && total_now > self.max_connections {
                        slog::warn!(logger, "refusing connection from {}: too many connections", peer);
                        deny(tcp_stream, "Too many connections. Service temporary unavailable.").await;
                        continue;
                    }
                    if self.max_connections_per_ip > 0 && ip_now > self.max_connections_per_ip {
                        slog::warn!(logger, "refusing connection from {}: too many from this address", peer);
                        deny(tcp_stream, "Too many connections from the same IP address.").await;
                        continue;
                    }
                    slog::info!(logger, "incoming control connection from {}", peer);
                    let config = LoopConfig {
                        authorizer: self.authorizer.clone(),
                        greeting: self.greeting.clone(),
                        passive_ports: self.passive_ports.clone(),
                        passive_host: self.passive_host,
                        permit_foreign_addresses: self.permit_foreign_addresses,
                        permit_privileged_ports: self.permit_privileged_ports,
                        max_login_attempts: self.max_login_attempts,
                        logger: logger.clone(),
                    };
                    if let Err(err) = spawn_loop(config, tcp_stream, guard).await {
                        slog::error!(logger, "could not spawn control loop for {}: {}", peer, err);
                    }
                }
                Err(err) => {
                    slog::error!(logger, "error accepting incoming control connection: {}", err);
                }
            }
        }
    }
}

// The capacity reply takes the place of the greeting; the socket goes down
// right after it.
async fn deny(mut stream: TcpStream, msg: &str) {
    let line = format!("421 {}\r\n", msg);
    let _ = stream.write_all(line.as_bytes()).await;
    let _ = stream.shutdown().await;
}

// A multiset of the peer addresses of live sessions, plus the total.
struct ConnectionCounts {
    total: AtomicUsize,
    per_ip: DashMap<IpAddr, usize>,
}

impl ConnectionCounts {
    fn new() -> Self {
        ConnectionCounts {
            total: AtomicUsize::new(0),
            per_ip: DashMap::new(),
        }
    }

    // Counts the new arrival in and hands out the guard that will count it
    // back out. Returns the totals as of this arrival.
    fn register(self: &Arc<Self>, ip: IpAddr) -> (ConnectionGuard, usize, usize) {
        let total = self.total.fetch_add(1, Ordering::SeqCst) + 1;
        let ip_count = {
            let mut entry = self.per_ip.entry(ip).or_insert(0);
            *entry += 1;
            *entry
        };
        let guard = ConnectionGuard { counts: self.clone(), ip };
        (guard, total, ip_count)
    }
}

/// Removes one occurrence of the session's peer IP from the multiset when
/// the session ends, however it ends.
pub struct ConnectionGuard {
    counts: Arc<ConnectionCounts>,
    ip: IpAddr,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counts.total.fetch_sub(1, Ordering::SeqCst);
        self.counts.per_ip.remove_if_mut(&self.ip, |_, count| {
            *count -= 1;
            *count == 0
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn connection_counts_track_a_multiset_of_ips() {
        let counts = Arc::new(ConnectionCounts::new());
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        let other: IpAddr = "10.0.0.2".parse().unwrap();

        let (g1, total, per_ip) = counts.register(ip);
        assert_eq!((total, per_ip), (1, 1));
        let (g2, total, per_ip) = counts.register(ip);
        assert_eq!((total, per_ip), (2, 2));
        let (g3, total, per_ip) = counts.register(other);
        assert_eq!((total, per_ip), (3, 1));

        drop(g2);
        let (g4, total, per_ip) = counts.register(ip);
        assert_eq!((total, per_ip), (3, 2));

        drop(g1);
        drop(g3);
        drop(g4);
        assert_eq!(counts.total.load(Ordering::SeqCst), 0);
        assert!(counts.per_ip.is_empty());
    }

    #[test]
    fn builder_defaults() {
        let server = ServerBuilder::new(Arc::new(crate::auth::DefaultAuthorizer::new())).build();
        assert!(server.greeting.starts_with("sandftp"));
        assert_eq!(server.max_login_attempts, 3);
        assert!(!server.permit_foreign_addresses);
        assert!(server.passive_ports.is_none());
    }
}
