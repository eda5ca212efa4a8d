//! Loading the user table from a JSON document.
//!
//! The expected shape is a list of objects:
//!
//! ```json
//! [
//!   {"username": "alice", "password": "12345678", "home": "/srv/ftp/alice", "perms": "rw"},
//!   {"username": "anonymous", "password": "", "home": "/srv/ftp/pub", "perms": "r",
//!    "msg_login": "Welcome, guest.", "msg_quit": "Come again."}
//! ]
//! ```

use super::{DefaultAuthorizer, Permissions, UserRecord, UserTableError};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Deserialize)]
struct JsonUser {
    username: String,
    password: String,
    home: PathBuf,
    perms: String,
    msg_login: Option<String>,
    msg_quit: Option<String>,
}

/// The error returned when a JSON user file cannot be turned into a table.
#[derive(Debug, Error)]
pub enum JsonUserFileError {
    /// The file could not be read.
    #[error("failed to read user file: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not valid JSON of the expected shape.
    #[error("malformed user file: {0}")]
    Json(#[from] serde_json::Error),
    /// A record failed table validation.
    #[error("invalid user record: {0}")]
    Record(#[from] UserTableError),
}

impl DefaultAuthorizer {
    /// Builds a user table from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, JsonUserFileError> {
        let users: Vec<JsonUser> = serde_json::from_str(json)?;
        let table = DefaultAuthorizer::new();
        for user in users {
            let perms = Permissions::from_chars(&user.perms).map_err(UserTableError::BadPermission)?;
            let mut record = UserRecord::new(user.username, user.password, user.home, perms);
            if let Some(msg) = user.msg_login {
                record.msg_login = msg;
            }
            if let Some(msg) = user.msg_quit {
                record.msg_quit = msg;
            }
            table.add_record(record)?;
        }
        Ok(table)
    }

    /// Builds a user table from a JSON file on disk.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, JsonUserFileError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
