//! Per-connection session state.

use crate::server::datachan::DataChanHandle;
use crate::vfs::VirtualFs;

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedSession = Arc<Mutex<Session>>;

/// Where a session stands in the login conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing has happened yet, or the last login attempt failed.
    New,
    /// USER was accepted, PASS is outstanding.
    WaitPass,
    /// Authenticated; commands are served.
    WaitCmd,
    /// QUIT arrived while a transfer was running; further input is ignored
    /// and the session ends when the data channel closes.
    QuitPending,
}

/// The representation type of a transfer, set by TYPE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferType::Ascii => write!(f, "ASCII"),
            TransferType::Binary => write!(f, "Binary"),
        }
    }
}

// This is where we keep the state for an FTP session.
#[derive(Debug)]
pub struct Session {
    pub source: SocketAddr,
    pub state: SessionState,
    pub username: Option<String>,
    pub attempted_logins: u32,
    pub data_type: TransferType,
    // Offset for the next RETR/STOR, set by REST and consumed (reset to 0)
    // by the transfer command that follows, successful or not.
    pub restart_pos: u64,
    // The rename source stored by RNFR, consumed by the next RNTO.
    pub rnfr_source: Option<String>,
    // Present from the moment PASS succeeds; its root is the user's home.
    pub vfs: Option<VirtualFs>,
    // At most one data channel exists per session at any instant.
    pub data_chan: Option<DataChanHandle>,
    pub msg_quit: String,
    // Set by handlers that must end the session once their reply is out.
    pub close_when_done: bool,
}

impl Session {
    pub fn new(source: SocketAddr) -> Self {
        Session {
            source,
            state: SessionState::New,
            username: None,
            attempted_logins: 0,
            data_type: TransferType::Ascii,
            restart_pos: 0,
            rnfr_source: None,
            vfs: None,
            data_chan: None,
            msg_quit: "Goodbye.".to_string(),
            close_when_done: false,
        }
    }

    /// Forgets everything tied to the authenticated account. Used by REIN, by
    /// a USER issued mid-session and by failed PASS attempts. Dropping the
    /// data channel handle makes its task shut the socket down.
    pub fn flush_account(&mut self) {
        self.state = SessionState::New;
        self.username = None;
        self.data_type = TransferType::Ascii;
        self.restart_pos = 0;
        self.rnfr_source = None;
        self.vfs = None;
        self.data_chan = None;
        self.msg_quit = "Goodbye.".to_string();
    }
}
