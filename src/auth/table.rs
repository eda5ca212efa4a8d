use super::{AuthenticationError, Authorizer, Permissions, UserRecord, ANONYMOUS_USER};

use async_trait::async_trait;
use slog::Drain;
use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::RwLock,
};
use thiserror::Error;

/// The error returned by [`DefaultAuthorizer::add_user`] when a record is
/// rejected.
#[derive(Debug, Error)]
pub enum UserTableError {
    /// A record with that username already exists.
    #[error("user {0:?} already exists")]
    DuplicateUser(String),
    /// The home directory does not exist or is not a directory.
    #[error("home directory {0:?} is not an existing directory")]
    HomeDirectory(PathBuf),
    /// The permission string contained a character other than `r` or `w`.
    #[error("unknown permission character {0:?}")]
    BadPermission(char),
}

/// An in-memory, read-mostly user table.
///
/// Records are added up front with [`add_user`](DefaultAuthorizer::add_user);
/// sessions only ever read the table. Permissions are granted by user-wide
/// flags. The `anonymous` account, when present, validates with any password.
pub struct DefaultAuthorizer {
    logger: slog::Logger,
    users: RwLock<HashMap<String, UserRecord>>,
}

impl DefaultAuthorizer {
    /// Creates an empty user table.
    pub fn new() -> Self {
        DefaultAuthorizer {
            logger: slog::Logger::root(slog_stdlog::StdLog {}.fuse(), slog::o!()),
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a table holding only a read-only `anonymous` account rooted at
    /// the given directory.
    pub fn with_anonymous<P: Into<PathBuf>>(home_dir: P) -> Result<Self, UserTableError> {
        let table = Self::new();
        table.add_user(ANONYMOUS_USER, "", home_dir, "r")?;
        Ok(table)
    }

    /// Replaces the logger used for configuration-time warnings.
    pub fn logger(mut self, logger: slog::Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Adds a user record, validating it first: duplicate usernames,
    /// non-existent home directories and permission characters outside
    /// `{r, w}` are rejected. Granting write access to `anonymous` is
    /// permitted but logged as a warning.
    pub fn add_user<P: Into<PathBuf>>(&self, username: &str, password: &str, home_dir: P, perms: &str) -> Result<(), UserTableError> {
        let perms = Permissions::from_chars(perms).map_err(UserTableError::BadPermission)?;
        let record = UserRecord::new(username, password, home_dir, perms);
        self.add_record(record)
    }

    /// Adds a pre-built record, applying the same validation as
    /// [`add_user`](DefaultAuthorizer::add_user).
    pub fn add_record(&self, record: UserRecord) -> Result<(), UserTableError> {
        if !record.home_dir.is_dir() {
            return Err(UserTableError::HomeDirectory(record.home_dir));
        }
        if record.username == ANONYMOUS_USER && record.perms.contains(Permissions::WRITE) {
            slog::warn!(self.logger, "write permissions assigned to anonymous user");
        }
        let mut users = self.users.write().expect("user table lock poisoned");
        if users.contains_key(&record.username) {
            return Err(UserTableError::DuplicateUser(record.username));
        }
        users.insert(record.username.clone(), record);
        Ok(())
    }

    fn with_user<T>(&self, username: &str, f: impl FnOnce(&UserRecord) -> T) -> Option<T> {
        let users = self.users.read().expect("user table lock poisoned");
        users.get(username).map(f)
    }
}

impl Default for DefaultAuthorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DefaultAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let users = self.users.read().expect("user table lock poisoned");
        write!(f, "DefaultAuthorizer({} users)", users.len())
    }
}

// Compares every byte regardless of where the first mismatch sits, so the
// comparison time does not depend on the password contents.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut diff = a.len() ^ b.len();
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= (x ^ y) as usize;
    }
    diff == 0
}

#[async_trait]
impl Authorizer for DefaultAuthorizer {
    async fn validate(&self, username: &str, password: &str) -> Result<(), AuthenticationError> {
        let ok = self
            .with_user(username, |user| {
                username == ANONYMOUS_USER || constant_time_eq(user.password.as_bytes(), password.as_bytes())
            })
            .unwrap_or(false);
        if ok {
            Ok(())
        } else {
            Err(AuthenticationError::new(format!("login rejected for {:?}", username)))
        }
    }

    async fn has_user(&self, username: &str) -> bool {
        self.with_user(username, |_| ()).is_some()
    }

    async fn home_of(&self, username: &str) -> Option<PathBuf> {
        self.with_user(username, |user| user.home_dir.clone())
    }

    async fn msg_login(&self, username: &str) -> String {
        self.with_user(username, |user| user.msg_login.clone())
            .unwrap_or_else(|| "Login successful.".to_string())
    }

    async fn msg_quit(&self, username: &str) -> String {
        self.with_user(username, |user| user.msg_quit.clone())
            .unwrap_or_else(|| "Goodbye.".to_string())
    }

    async fn may_read(&self, username: &str, _path: &Path) -> bool {
        self.with_user(username, |user| user.perms.contains(Permissions::READ)).unwrap_or(false)
    }

    async fn may_write(&self, username: &str, _path: &Path) -> bool {
        self.with_user(username, |user| user.perms.contains(Permissions::WRITE)).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> (tempfile::TempDir, DefaultAuthorizer) {
        let home = tempfile::tempdir().unwrap();
        let auth = DefaultAuthorizer::new();
        auth.add_user("alice", "secret", home.path(), "rw").unwrap();
        (home, auth)
    }

    #[tokio::test]
    async fn validates_known_user() {
        let (_home, auth) = table();
        assert!(auth.validate("alice", "secret").await.is_ok());
        assert!(auth.validate("alice", "wrong").await.is_err());
        assert!(auth.validate("bob", "secret").await.is_err());
    }

    #[tokio::test]
    async fn anonymous_accepts_any_password() {
        let home = tempfile::tempdir().unwrap();
        let auth = DefaultAuthorizer::with_anonymous(home.path()).unwrap();
        assert!(auth.validate("anonymous", "guest@example.com").await.is_ok());
        assert!(auth.validate("anonymous", "").await.is_ok());
    }

    #[tokio::test]
    async fn permissions_follow_user_flags() {
        let (home, auth) = table();
        auth.add_user("carol", "pw", home.path(), "r").unwrap();
        assert!(auth.may_read("carol", Path::new("/x")).await);
        assert!(!auth.may_write("carol", Path::new("/x")).await);
        assert!(auth.may_write("alice", Path::new("/x")).await);
    }

    #[test]
    fn add_user_rejects_duplicates() {
        let (home, auth) = table();
        let err = auth.add_user("alice", "other", home.path(), "r").unwrap_err();
        assert!(matches!(err, UserTableError::DuplicateUser(_)));
    }

    #[test]
    fn add_user_rejects_missing_home() {
        let auth = DefaultAuthorizer::new();
        let err = auth.add_user("alice", "pw", "/definitely/not/there", "r").unwrap_err();
        assert!(matches!(err, UserTableError::HomeDirectory(_)));
    }

    #[test]
    fn add_user_rejects_bad_perm_chars() {
        let home = tempfile::tempdir().unwrap();
        let auth = DefaultAuthorizer::new();
        let err = auth.add_user("alice", "pw", home.path(), "rwx").unwrap_err();
        assert!(matches!(err, UserTableError::BadPermission('x')));
    }

    #[test]
    fn home_must_be_a_directory() {
        let home = tempfile::tempdir().unwrap();
        let file = home.path().join("plain");
        std::fs::write(&file, b"x").unwrap();
        let auth = DefaultAuthorizer::new();
        assert!(matches!(
            auth.add_user("alice", "pw", &file, "r").unwrap_err(),
            UserTableError::HomeDirectory(_)
        ));
    }

    #[tokio::test]
    async fn messages_default_when_unset() {
        let (_home, auth) = table();
        assert_eq!(auth.msg_login("alice").await, "Login successful.");
        assert_eq!(auth.msg_quit("alice").await, "Goodbye.");
    }
}
