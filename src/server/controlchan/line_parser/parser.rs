use super::error::{ParseErrorKind, Result};
use crate::server::controlchan::command::{lookup, ArgClass, Command};
use crate::server::password::Password;

use bytes::Bytes;
use std::str;

/// Parse the given bytes into a [`Command`].
///
/// The line is split once on SPACE into a command token and an argument; the
/// token is matched case-insensitively against the command table, which also
/// settles whether the argument may, must or must not be present.
pub fn parse<T>(line: T) -> Result<Command>
where
    T: AsRef<[u8]> + Into<Bytes>,
{
    let line = line.into();
    let line = str::from_utf8(&line)?.trim_end_matches(['\r', '\n']);
    let (token, arg) = match line.split_once(' ') {
        Some((token, arg)) => (token, arg),
        None => (line, ""),
    };
    let token = token.to_uppercase();
    let arg = if arg.is_empty() { None } else { Some(arg.to_string()) };

    let spec = lookup(&token).ok_or(ParseErrorKind::UnknownCommand { command: token.clone() })?;
    match (spec.arg, &arg) {
        (ArgClass::Required, None) => return Err(ParseErrorKind::MissingArgument.into()),
        (ArgClass::Forbidden, Some(_)) => return Err(ParseErrorKind::UnexpectedArgument.into()),
        _ => {}
    }
    // The check above makes the argument present for every Required command.
    let required = |arg: Option<String>| arg.unwrap_or_default();

    let cmd = match token.as_str() {
        "USER" => Command::User {
            username: required(arg),
        },
        "PASS" => Command::Pass {
            password: Password::new(arg.unwrap_or_default()),
        },
        "QUIT" => Command::Quit,
        "REIN" => Command::Rein,
        "PORT" => Command::Port {
            addr: required(arg),
        },
        "PASV" => Command::Pasv,
        "TYPE" => Command::Type {
            param: required(arg),
        },
        "STRU" => Command::Stru {
            param: required(arg),
        },
        "MODE" => Command::Mode {
            param: required(arg),
        },
        "REST" => {
            let raw = required(arg);
            let position = raw.parse::<u64>().map_err(|_| ParseErrorKind::InvalidArgument)?;
            Command::Rest { position }
        }
        "RETR" => Command::Retr {
            path: required(arg),
        },
        "STOR" => Command::Stor {
            path: required(arg),
        },
        "APPE" => Command::Appe {
            path: required(arg),
        },
        "STOU" => Command::Stou { path: arg },
        "LIST" => Command::List { path: arg },
        "NLST" => Command::Nlst { path: arg },
        "MLSD" => Command::Mlsd { path: arg },
        "MLST" => Command::Mlst { path: arg },
        "PWD" | "XPWD" => Command::Pwd,
        "CWD" | "XCWD" => Command::Cwd {
            path: arg.unwrap_or_else(|| "/".to_string()),
        },
        "CDUP" | "XCUP" => Command::Cdup,
        "MKD" | "XMKD" => Command::Mkd {
            path: required(arg),
        },
        "RMD" | "XRMD" => Command::Rmd {
            path: required(arg),
        },
        "DELE" => Command::Dele {
            path: required(arg),
        },
        "RNFR" => Command::Rnfr {
            path: required(arg),
        },
        "RNTO" => Command::Rnto {
            path: required(arg),
        },
        "SIZE" => Command::Size {
            path: required(arg),
        },
        "MDTM" => Command::Mdtm {
            path: required(arg),
        },
        "STAT" => Command::Stat { path: arg },
        "ABOR" => Command::Abor,
        "FEAT" => Command::Feat,
        "HELP" => Command::Help { topic: arg },
        "SYST" => Command::Syst,
        "NOOP" => Command::Noop,
        "ALLO" => Command::Allo,
        "ACCT" | "SITE" | "SMNT" => Command::NotImplemented { name: token.clone() },
        _ => return Err(ParseErrorKind::UnknownCommand { command: token.clone() }.into()),
    };
    Ok(cmd)
}
