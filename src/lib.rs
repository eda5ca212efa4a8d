#![deny(clippy::all)]
#![forbid(unsafe_code)]

//! sandftp is an asynchronous RFC 959 FTP server library with virtual users
//! and a per-user sandboxed filesystem.
//!
//! Every session is confined to the home directory of the user it
//! authenticated as: client-visible paths are translated into host paths and
//! checked for containment before any filesystem call. Authentication is
//! plug-able through the [`Authorizer`](crate::auth::Authorizer) trait; an
//! in-memory table and a JSON user-file implementation ship with the crate.
//!
//! The server runs on top of the Tokio asynchronous run-time and tries to
//! make use of Async IO as much as possible.
//!
//! # Quick Start
//!
//! Add the sandftp and tokio crates to your project's dependencies in Cargo.toml
//!
//! ```toml
//! [dependencies]
//! sandftp = "0.2"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Now you're ready to develop your server! Add the following to src/main.rs:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! pub async fn main() {
//!     let ftp_home = std::env::temp_dir();
//!     let auth = sandftp::auth::DefaultAuthorizer::with_anonymous(ftp_home).unwrap();
//!     let server = sandftp::ServerBuilder::new(Arc::new(auth))
//!         .greeting("Welcome to my FTP server")
//!         .passive_ports(50000..=65535)
//!         .build();
//!
//!     server.listen("127.0.0.1:2121").await.unwrap();
//! }
//! ```
//!
//! You can now run your server with cargo run and connect to localhost:2121
//! with your favourite FTP client.

pub mod auth;
pub mod options;
pub(crate) mod server;
pub mod vfs;

pub use crate::server::error::ServerError;
pub use crate::server::ftpserver::{Server, ServerBuilder};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
