#![allow(dead_code)]

use sandftp::auth::DefaultAuthorizer;
use sandftp::ServerBuilder;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// Spawns a server on the given port with two virtual users sharing the
/// returned root: `alice`/`secret` with read-write access and a read-only
/// `anonymous`. The directory handle keeps the sandbox alive for the test.
pub async fn start_server(port: u16) -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    let auth = DefaultAuthorizer::new();
    auth.add_user("alice", "secret", root.path(), "rw").unwrap();
    auth.add_user("anonymous", "", root.path(), "r").unwrap();
    spawn_listener(port, auth).await;
    root
}

/// Same, but with no anonymous record in the table.
pub async fn start_server_no_anonymous(port: u16) -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    let auth = DefaultAuthorizer::new();
    auth.add_user("alice", "secret", root.path(), "rw").unwrap();
    spawn_listener(port, auth).await;
    root
}

async fn spawn_listener(port: u16, auth: DefaultAuthorizer) {
    let server = ServerBuilder::new(Arc::new(auth))
        .greeting("test server ready.")
        .max_login_attempts(3)
        .build();
    tokio::spawn(async move {
        server.listen(&format!("127.0.0.1:{}", port)).await.unwrap();
    });
}

/// A raw-socket FTP client: sends command lines, reads complete replies.
pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    /// Connects to the server, retrying while it finishes binding, and
    /// swallows the greeting.
    pub async fn connect(port: u16) -> Client {
        let mut client = Client::connect_raw(port).await;
        let greeting = client.read_reply().await;
        assert!(greeting.starts_with("220 "), "unexpected greeting: {}", greeting);
        client
    }

    /// Connects without consuming anything, for tests that inspect the
    /// greeting (or its 421 replacement) themselves.
    pub async fn connect_raw(port: u16) -> Client {
        for _ in 0..50 {
            if let Ok(stream) = TcpStream::connect(("127.0.0.1", port)).await {
                let (read, writer) = stream.into_split();
                return Client {
                    reader: BufReader::new(read),
                    writer,
                };
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("server on port {} never came up", port);
    }

    pub async fn send(&mut self, line: &str) {
        self.writer.write_all(format!("{}\r\n", line).as_bytes()).await.unwrap();
    }

    /// Reads one complete reply: either a single `NNN text` line or a
    /// `NNN-` multi-line block up to its `NNN ` terminator.
    pub async fn read_reply(&mut self) -> String {
        let mut reply = String::new();
        loop {
            let mut line = String::new();
            let n = self.reader.read_line(&mut line).await.unwrap();
            assert!(n > 0, "connection closed mid-reply; got so far: {:?}", reply);
            reply.push_str(&line);
            let bytes = line.as_bytes();
            if bytes.len() > 3 && bytes[..3].iter().all(u8::is_ascii_digit) && bytes[3] == b' ' {
                return reply;
            }
        }
    }

    /// True once the server has closed the control connection.
    pub async fn at_eof(&mut self) -> bool {
        let mut line = String::new();
        self.reader.read_line(&mut line).await.unwrap() == 0
    }

    pub async fn cmd(&mut self, line: &str) -> String {
        self.send(line).await;
        self.read_reply().await
    }

    /// Logs in as `alice`/`secret`.
    pub async fn login(&mut self) {
        let reply = self.cmd("USER alice").await;
        assert!(reply.starts_with("331 "), "{}", reply);
        let reply = self.cmd("PASS secret").await;
        assert!(reply.starts_with("230 "), "{}", reply);
    }

    /// Issues PASV and returns the data port the server listens on.
    pub async fn pasv(&mut self) -> u16 {
        let reply = self.cmd("PASV").await;
        parse_pasv_port(&reply)
    }
}

/// Extracts the port from `227 Entering passive mode (h1,h2,h3,h4,p1,p2).`.
pub fn parse_pasv_port(reply: &str) -> u16 {
    assert!(reply.starts_with("227 "), "not a PASV reply: {}", reply);
    let open = reply.find('(').unwrap();
    let close = reply.find(')').unwrap();
    let fields: Vec<u16> = reply[open + 1..close].split(',').map(|f| f.parse().unwrap()).collect();
    assert_eq!(fields.len(), 6, "{}", reply);
    fields[4] * 256 + fields[5]
}

/// Connects a data socket, drains it to EOF and returns the payload.
pub async fn read_data_connection(port: u16) -> Vec<u8> {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let mut payload = Vec::new();
    stream.read_to_end(&mut payload).await.unwrap();
    payload
}

/// Connects a data socket and uploads the payload.
pub async fn write_data_connection(port: u16, payload: &[u8]) {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream.write_all(payload).await.unwrap();
    stream.shutdown().await.unwrap();
}
