//! This module contains the implementations for the FTP commands defined in
//!
//! - [RFC 959 - FTP](https://tools.ietf.org/html/rfc959)
//! - [RFC 2389 - Feature negotiation](https://tools.ietf.org/html/rfc2389)
//! - [RFC 3659 - Extensions to FTP](https://tools.ietf.org/html/rfc3659)

mod abor;
mod allo;
mod appe;
mod cdup;
mod cwd;
mod dele;
mod feat;
mod help;
mod list;
mod mdtm;
mod mkd;
mod mlsd;
mod mlst;
mod mode;
mod nlst;
mod noop;
mod not_implemented;
mod pass;
mod pasv;
mod port;
mod pwd;
mod quit;
mod rein;
mod rest;
mod retr;
mod rmd;
mod rnfr;
mod rnto;
mod size;
mod stat;
mod stor;
mod stou;
mod stru;
mod syst;
mod type_;
mod user;

pub use abor::Abor;
pub use allo::Allo;
pub use appe::Appe;
pub use cdup::Cdup;
pub use cwd::Cwd;
pub use dele::Dele;
pub use feat::Feat;
pub use help::Help;
pub use list::List;
pub use mdtm::Mdtm;
pub use mkd::Mkd;
pub use mlsd::Mlsd;
pub use mlst::Mlst;
pub use mode::Mode;
pub use nlst::Nlst;
pub use noop::Noop;
pub use not_implemented::NotImplemented;
pub use pass::Pass;
pub use pasv::Pasv;
pub use port::Port;
pub use pwd::Pwd;
pub use quit::Quit;
pub use rein::Rein;
pub use rest::Rest;
pub use retr::Retr;
pub use rmd::Rmd;
pub use rnfr::Rnfr;
pub use rnto::Rnto;
pub use size::Size;
pub use stat::Stat;
pub use stor::Stor;
pub use stou::Stou;
pub use stru::Stru;
pub use syst::Syst;
pub use type_::Type;
pub use user::User;

use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::datachan::TransferJob;
use crate::server::session::Session;
use crate::vfs::FsError;

// The 550 reply for a filesystem failure; the text is the OS message.
fn fs_fail(err: &FsError) -> Reply {
    Reply::new_with_string(ReplyCode::FileError, format!("{}.", err))
}

// The 550 reply for an authorizer denial.
fn not_enough_privileges(cmd: &str) -> Reply {
    Reply::new_with_string(ReplyCode::FileError, format!("Can't {}: not enough privileges.", cmd))
}

// Queues a transfer on the session's data channel and produces the matching
// half of the two-phase reply pair: 125 when the peer is already connected,
// 150 when the payload waits for the connection to open.
fn submit_transfer(session: &mut Session, job: TransferJob) -> Reply {
    submit_transfer_with(
        session,
        job,
        "Data connection already open. Transfer starting.".to_string(),
        "File status okay. About to open data connection.".to_string(),
    )
}

fn submit_transfer_with(session: &mut Session, job: TransferJob, open_msg: String, queued_msg: String) -> Reply {
    match &session.data_chan {
        None => Reply::new(ReplyCode::BadCommandSequence, "Use PORT or PASV first."),
        Some(chan) => {
            if !chan.queue(job) {
                return Reply::new(ReplyCode::BadCommandSequence, "Only one transfer at a time.");
            }
            if chan.is_open() {
                Reply::new_with_string(ReplyCode::ConnectionAlreadyOpen, open_msg)
            } else {
                Reply::new_with_string(ReplyCode::FileStatusOkay, queued_msg)
            }
        }
    }
}

// Handlers behind the login gate can assume a sandbox exists; this guards
// the impossible case without panicking.
fn vfs_or_login(session: &Session) -> Result<crate::vfs::VirtualFs, Reply> {
    session
        .vfs
        .clone()
        .ok_or_else(|| Reply::new(ReplyCode::NotLoggedIn, "Log in with USER and PASS first."))
}
