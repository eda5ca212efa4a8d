//! Contains the [`Authorizer`] trait that the server consults for
//! authentication and per-user authorization, together with the
//! implementations shipped with the crate.
//!
//! An `Authorizer` is the credential and permission oracle of a server: it
//! validates `USER`/`PASS` credentials, hands out the user's home directory
//! (which becomes the root of the session's filesystem sandbox) and answers
//! read/write permission queries. You can define your own implementation to
//! integrate the server with whatever user directory you need:
//!
//! ```no_run
//! use sandftp::auth::{AuthenticationError, Authorizer};
//! use async_trait::async_trait;
//! use std::path::{Path, PathBuf};
//!
//! #[derive(Debug)]
//! struct SingleUser;
//!
//! #[async_trait]
//! impl Authorizer for SingleUser {
//!     async fn validate(&self, username: &str, password: &str) -> Result<(), AuthenticationError> {
//!         if username == "bjorn" && password == "hunter2" {
//!             Ok(())
//!         } else {
//!             Err(AuthenticationError::new("bad credentials"))
//!         }
//!     }
//!
//!     async fn has_user(&self, username: &str) -> bool {
//!         username == "bjorn"
//!     }
//!
//!     async fn home_of(&self, _username: &str) -> Option<PathBuf> {
//!         Some(PathBuf::from("/srv/ftp/bjorn"))
//!     }
//!
//!     async fn may_read(&self, _username: &str, _path: &Path) -> bool {
//!         true
//!     }
//!
//!     async fn may_write(&self, _username: &str, _path: &Path) -> bool {
//!         false
//!     }
//! }
//! ```

mod authorizer;
mod jsonfile;
mod table;
mod user;

pub use authorizer::{AuthenticationError, Authorizer};
pub use jsonfile::JsonUserFileError;
pub use table::{DefaultAuthorizer, UserTableError};
pub use user::{Permissions, UserRecord};

/// The username that denotes anonymous access. Any password is accepted for
/// it, provided a record with this name exists in the user table.
pub const ANONYMOUS_USER: &str = "anonymous";
