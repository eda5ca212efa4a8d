//! Contains code pertaining to the FTP *data* channel.
//!
//! A [`DataChanHandle`] is what the session owns; the socket itself lives in
//! a task spawned here. The task accepts (passive) or already holds (active)
//! the one connection, waits for the transfer the control loop queues on the
//! handle, streams it, and reports back over the control message channel.
//! Dropping the handle closes every channel the task selects on, which makes
//! it shut the socket down: replacing or discarding a data channel can never
//! leak one.

use crate::server::ascii::{to_crlf, FromCrlf};
use crate::server::chancomms::ControlChanMsg;

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{channel, Receiver, Sender};

// Slice size for in-memory payloads such as listings.
const SMALL_BUF_SIZE: usize = 8 * 1024;
// Read size for file producers, so memory stays O(buffer) per transfer.
const FILE_BUF_SIZE: usize = 64 * 1024;

/// What the data channel should move once its connection is open.
#[derive(Debug)]
pub enum TransferJob {
    /// Send an in-memory payload (a rendered listing). Already wire-formatted,
    /// so no ASCII translation applies.
    SendBuffer(Vec<u8>),
    /// Stream a file to the peer, optionally translating line endings.
    SendFile { file: File, ascii: bool },
    /// Receive from the peer into an open file until EOF.
    Receive { file: File, ascii: bool },
}

/// How this data channel came to be; reported by STAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// PASV: we listen at this address.
    Listening(SocketAddr),
    /// PORT: we dialed the client at this address.
    Dialed(SocketAddr),
}

/// The session's grip on its one data channel.
#[derive(Debug)]
pub struct DataChanHandle {
    cmd_tx: Sender<TransferJob>,
    abort_tx: Sender<()>,
    connected: Arc<AtomicBool>,
    bytes_sent: Arc<AtomicU64>,
    bytes_received: Arc<AtomicU64>,
    endpoint: Endpoint,
}

impl DataChanHandle {
    /// True once the peer connection is established.
    pub fn is_open(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// A transfer is in progress iff any payload byte has crossed the socket.
    pub fn in_progress(&self) -> bool {
        let (tx, rx) = self.totals();
        tx + rx > 0
    }

    /// Bytes sent and received so far.
    pub fn totals(&self) -> (u64, u64) {
        (self.bytes_sent.load(Ordering::SeqCst), self.bytes_received.load(Ordering::SeqCst))
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Queues the transfer. The slot holds exactly one job; it is consumed
    /// the moment the connection is open.
    pub fn queue(&self, job: TransferJob) -> bool {
        self.cmd_tx.try_send(job).is_ok()
    }

    /// Cancels whatever the channel is doing without generating a completion
    /// message; the caller owns the replies.
    pub fn abort(&self) {
        let _ = self.abort_tx.try_send(());
    }
}

/// Binds a passive listener next to the control connection and spawns the
/// task that will accept exactly one origin-checked peer. Returns the handle
/// and the chosen port.
pub async fn listen_passive(
    logger: slog::Logger,
    local_ip: IpAddr,
    passive_ports: Option<RangeInclusive<u16>>,
    control_peer: SocketAddr,
    permit_foreign: bool,
    tx: Sender<ControlChanMsg>,
) -> io::Result<(DataChanHandle, u16)> {
    let listener = bind_passive(&logger, local_ip, passive_ports).await?;
    let addr = listener.local_addr()?;
    let (handle, chan) = handle_pair(Endpoint::Listening(addr));
    let logger = logger.new(slog::o!("datachan" => addr.to_string()));
    tokio::spawn(async move {
        DataChan {
            logger,
            chan,
            tx,
        }
        .accept_and_run(listener, control_peer, permit_foreign)
        .await;
    });
    Ok((handle, addr.port()))
}

/// Dials the address a PORT command named and spawns the transfer task over
/// the established connection.
pub async fn connect_active(logger: slog::Logger, peer: SocketAddr, tx: Sender<ControlChanMsg>) -> io::Result<DataChanHandle> {
    let stream = TcpStream::connect(peer).await?;
    let (handle, chan) = handle_pair(Endpoint::Dialed(peer));
    chan.connected.store(true, Ordering::SeqCst);
    let logger = logger.new(slog::o!("datachan" => peer.to_string()));
    tokio::spawn(async move {
        DataChan {
            logger,
            chan,
            tx,
        }
        .run(stream)
        .await;
    });
    Ok(handle)
}

// Draw ports from the configured range uniformly, without replacement, until
// one binds; an exhausted range falls back to a kernel-assigned port.
async fn bind_passive(logger: &slog::Logger, local_ip: IpAddr, passive_ports: Option<RangeInclusive<u16>>) -> io::Result<TcpListener> {
    let range = match passive_ports {
        Some(range) => range,
        None => return TcpListener::bind(SocketAddr::new(local_ip, 0)).await,
    };
    let mut ports: Vec<u16> = range.collect();
    shuffle(&mut ports);
    for port in ports {
        if let Ok(listener) = TcpListener::bind(SocketAddr::new(local_ip, port)).await {
            return Ok(listener);
        }
    }
    slog::warn!(logger, "passive port range exhausted, falling back to an ephemeral port");
    TcpListener::bind(SocketAddr::new(local_ip, 0)).await
}

fn shuffle(ports: &mut [u16]) {
    for i in (1..ports.len()).rev() {
        let mut raw = [0u8; 4];
        getrandom::fill(&mut raw).expect("Error generating random port");
        let j = (u32::from_ne_bytes(raw) as usize) % (i + 1);
        ports.swap(i, j);
    }
}

struct ChanState {
    cmd_rx: Receiver<TransferJob>,
    abort_rx: Receiver<()>,
    connected: Arc<AtomicBool>,
    bytes_sent: Arc<AtomicU64>,
    bytes_received: Arc<AtomicU64>,
}

fn handle_pair(endpoint: Endpoint) -> (DataChanHandle, ChanState) {
    let (cmd_tx, cmd_rx) = channel(1);
    let (abort_tx, abort_rx) = channel(1);
    let connected = Arc::new(AtomicBool::new(false));
    let bytes_sent = Arc::new(AtomicU64::new(0));
    let bytes_received = Arc::new(AtomicU64::new(0));
    let handle = DataChanHandle {
        cmd_tx,
        abort_tx,
        connected: connected.clone(),
        bytes_sent: bytes_sent.clone(),
        bytes_received: bytes_received.clone(),
        endpoint,
    };
    let state = ChanState {
        cmd_rx,
        abort_rx,
        connected,
        bytes_sent,
        bytes_received,
    };
    (handle, state)
}

enum Outcome {
    Done(u64),
    Failed(String),
    Aborted,
}

struct DataChan {
    logger: slog::Logger,
    chan: ChanState,
    tx: Sender<ControlChanMsg>,
}

impl DataChan {
    // Passive path: accept the one peer, rejecting foreign origins without
    // giving up the listener, then run the transfer phase.
    async fn accept_and_run(mut self, listener: TcpListener, control_peer: SocketAddr, permit_foreign: bool) {
        let stream = loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        if peer.ip() != control_peer.ip() && !permit_foreign {
                            slog::warn!(self.logger, "rejecting data connection from foreign address {}", peer);
                            let _ = self.tx.send(ControlChanMsg::ForeignPeerRejected { peer }).await;
                            continue;
                        }
                        self.chan.connected.store(true, Ordering::SeqCst);
                        let _ = self.tx.send(ControlChanMsg::DataConnected { peer }).await;
                        break stream;
                    }
                    Err(err) => {
                        slog::error!(self.logger, "error accepting data connection: {}", err);
                        return;
                    }
                },
                _ = self.chan.abort_rx.recv() => return,
            }
        };
        // One connection only; the listener closes here.
        drop(listener);
        self.run(stream).await;
    }

    async fn run(mut self, mut stream: TcpStream) {
        let job = tokio::select! {
            job = self.chan.cmd_rx.recv() => match job {
                Some(job) => job,
                None => return,
            },
            _ = self.chan.abort_rx.recv() => return,
        };
        let outcome = match job {
            TransferJob::SendBuffer(payload) => {
                let outcome = self.send_bytes(&mut stream, &payload, SMALL_BUF_SIZE).await;
                self.finish_send(&mut stream, outcome).await
            }
            TransferJob::SendFile { file, ascii } => {
                let outcome = self.send_file(&mut stream, file, ascii).await;
                self.finish_send(&mut stream, outcome).await
            }
            TransferJob::Receive { file, ascii } => self.receive(&mut stream, file, ascii).await,
        };
        match outcome {
            Outcome::Done(bytes) => {
                let _ = self.tx.send(ControlChanMsg::TransferDone { bytes }).await;
            }
            Outcome::Failed(reason) => {
                slog::warn!(self.logger, "transfer failed: {}", reason);
                let _ = self.tx.send(ControlChanMsg::TransferFailed { reason }).await;
            }
            // The control loop already answered; closing the socket is all
            // that is left to do.
            Outcome::Aborted => {}
        }
    }

    // The server side closes first on sends, so the 226 only goes out once
    // the socket is down.
    async fn finish_send(&self, stream: &mut TcpStream, outcome: Outcome) -> Outcome {
        if let Outcome::Done(_) = &outcome {
            if let Err(err) = stream.shutdown().await {
                return Outcome::Failed(reason(&err));
            }
        }
        outcome
    }

    async fn send_bytes(&mut self, stream: &mut TcpStream, payload: &[u8], chunk_size: usize) -> Outcome {
        for chunk in payload.chunks(chunk_size) {
            tokio::select! {
                written = stream.write_all(chunk) => {
                    if let Err(err) = written {
                        return Outcome::Failed(reason(&err));
                    }
                    self.chan.bytes_sent.fetch_add(chunk.len() as u64, Ordering::SeqCst);
                }
                _ = self.chan.abort_rx.recv() => return Outcome::Aborted,
            }
        }
        Outcome::Done(self.chan.bytes_sent.load(Ordering::SeqCst))
    }

    async fn send_file(&mut self, stream: &mut TcpStream, mut file: File, ascii: bool) -> Outcome {
        let mut buf = vec![0u8; FILE_BUF_SIZE];
        loop {
            let n = match file.read(&mut buf).await {
                Ok(0) => return Outcome::Done(self.chan.bytes_sent.load(Ordering::SeqCst)),
                Ok(n) => n,
                Err(err) => return Outcome::Failed(reason(&err)),
            };
            let outcome = if ascii {
                let translated = to_crlf(&buf[..n]);
                self.send_bytes(stream, &translated, FILE_BUF_SIZE).await
            } else {
                self.send_bytes(stream, &buf[..n], FILE_BUF_SIZE).await
            };
            match outcome {
                Outcome::Done(_) => {}
                other => return other,
            }
        }
    }

    async fn receive(&mut self, stream: &mut TcpStream, mut file: File, ascii: bool) -> Outcome {
        let mut buf = vec![0u8; FILE_BUF_SIZE];
        let mut decoder = FromCrlf::new();
        loop {
            let n = tokio::select! {
                read = stream.read(&mut buf) => match read {
                    Ok(n) => n,
                    Err(err) => return Outcome::Failed(reason(&err)),
                },
                _ = self.chan.abort_rx.recv() => return Outcome::Aborted,
            };
            if n == 0 {
                if let Some(cr) = decoder.finish() {
                    if let Err(err) = file.write_all(&[cr]).await {
                        return Outcome::Failed(reason(&err));
                    }
                }
                if let Err(err) = file.flush().await {
                    return Outcome::Failed(reason(&err));
                }
                return Outcome::Done(self.chan.bytes_received.load(Ordering::SeqCst));
            }
            self.chan.bytes_received.fetch_add(n as u64, Ordering::SeqCst);
            let written = if ascii {
                file.write_all(&decoder.transform(&buf[..n])).await
            } else {
                file.write_all(&buf[..n]).await
            };
            if let Err(err) = written {
                return Outcome::Failed(reason(&err));
            }
        }
    }
}

// The OS message without the "(os error N)" decoration; it goes verbatim
// into the 426 reply.
fn reason(err: &io::Error) -> String {
    let mut message = err.to_string();
    if let Some(pos) = message.find(" (os error") {
        message.truncate(pos);
    }
    if message.is_empty() {
        "Unknown error".to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passive_channel_accepts_and_receives() {
        let (tx, mut rx) = channel(8);
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let control_peer: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let (handle, port) = listen_passive(logger, "127.0.0.1".parse().unwrap(), None, control_peer, true, tx)
            .await
            .unwrap();
        assert!(!handle.is_open());

        let dir = tempfile::tempdir().unwrap();
        let sink = File::create(dir.path().join("upload")).await.unwrap();
        assert!(handle.queue(TransferJob::Receive { file: sink, ascii: false }));

        let mut client = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        client.write_all(b"hello data channel").await.unwrap();
        client.shutdown().await.unwrap();

        match rx.recv().await.unwrap() {
            ControlChanMsg::DataConnected { .. } => {}
            other => panic!("expected DataConnected, got {:?}", other),
        }
        match rx.recv().await.unwrap() {
            ControlChanMsg::TransferDone { bytes } => assert_eq!(bytes, 18),
            other => panic!("expected TransferDone, got {:?}", other),
        }
        let stored = std::fs::read(dir.path().join("upload")).unwrap();
        assert_eq!(stored, b"hello data channel");
        assert!(handle.is_open());
        assert_eq!(handle.totals(), (0, 18));
    }

    #[tokio::test]
    async fn send_side_streams_a_file() {
        let (tx, mut rx) = channel(8);
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let control_peer: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let (handle, port) = listen_passive(logger, "127.0.0.1".parse().unwrap(), None, control_peer, true, tx)
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload");
        tokio::fs::write(&path, vec![7u8; 100_000]).await.unwrap();
        let file = File::open(&path).await.unwrap();
        assert!(handle.queue(TransferJob::SendFile { file, ascii: false }));

        let mut client = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        assert_eq!(received.len(), 100_000);

        let mut done = false;
        while let Some(msg) = rx.recv().await {
            if let ControlChanMsg::TransferDone { bytes } = msg {
                assert_eq!(bytes, 100_000);
                done = true;
                break;
            }
        }
        assert!(done);
    }

    #[tokio::test]
    async fn dropping_the_handle_closes_a_waiting_listener() {
        let (tx, _rx) = channel(8);
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let control_peer: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let (handle, port) = listen_passive(logger, "127.0.0.1".parse().unwrap(), None, control_peer, true, tx)
            .await
            .unwrap();
        drop(handle);
        // Give the task a beat to observe the closed channels.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        match TcpStream::connect(("127.0.0.1", port)).await {
            Err(_) => {}
            Ok(mut stream) => {
                // The connect may win a race with the listener teardown; the
                // socket must then yield EOF right away.
                let mut buf = [0u8; 1];
                assert_eq!(stream.read(&mut buf).await.unwrap(), 0);
            }
        }
    }
}
