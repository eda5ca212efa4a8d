use crate::server::password::Password;

use std::fmt;

/// A successfully parsed control channel command.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Command {
    User { username: String },
    Pass { password: Password },
    Quit,
    Rein,
    Port { addr: String },
    Pasv,
    Type { param: String },
    Stru { param: String },
    Mode { param: String },
    Rest { position: u64 },
    Retr { path: String },
    Stor { path: String },
    Appe { path: String },
    Stou { path: Option<String> },
    List { path: Option<String> },
    Nlst { path: Option<String> },
    Mlsd { path: Option<String> },
    Mlst { path: Option<String> },
    Pwd,
    Cwd { path: String },
    Cdup,
    Mkd { path: String },
    Rmd { path: String },
    Dele { path: String },
    Rnfr { path: String },
    Rnto { path: String },
    Size { path: String },
    Mdtm { path: String },
    Stat { path: Option<String> },
    Abor,
    Feat,
    Help { topic: Option<String> },
    Syst,
    Noop,
    Allo,
    /// ACCT, SITE and SMNT: recognized but answered with 502.
    NotImplemented { name: String },
}

impl Command {
    /// Commands that run before authentication. STAT is only exempt in its
    /// no-argument form; directory listings stay behind the login gate.
    pub fn exempt_from_auth(&self) -> bool {
        matches!(
            self,
            Command::User { .. }
                | Command::Pass { .. }
                | Command::Quit
                | Command::Feat
                | Command::Help { .. }
                | Command::Noop
                | Command::Syst
                | Command::Stat { path: None }
        )
    }

    /// The client path argument that must stay inside the session root. The
    /// dispatcher containment-checks it before the handler runs.
    pub fn sandboxed_path(&self) -> Option<&str> {
        match self {
            Command::Retr { path }
            | Command::Stor { path }
            | Command::Appe { path }
            | Command::Cwd { path }
            | Command::Mkd { path }
            | Command::Rmd { path }
            | Command::Dele { path }
            | Command::Rnfr { path }
            | Command::Rnto { path }
            | Command::Size { path }
            | Command::Mdtm { path } => Some(path),
            Command::List { path: Some(path) }
            | Command::Nlst { path: Some(path) }
            | Command::Mlsd { path: Some(path) }
            | Command::Mlst { path: Some(path) }
            | Command::Stou { path: Some(path) } => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    // Renders the command the way it came in on the wire, with the PASS
    // argument masked; used for session logging.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::User { username } => write!(f, "USER {}", username),
            Command::Pass { password } => write!(f, "PASS {}", password),
            Command::Quit => write!(f, "QUIT"),
            Command::Rein => write!(f, "REIN"),
            Command::Port { addr } => write!(f, "PORT {}", addr),
            Command::Pasv => write!(f, "PASV"),
            Command::Type { param } => write!(f, "TYPE {}", param),
            Command::Stru { param } => write!(f, "STRU {}", param),
            Command::Mode { param } => write!(f, "MODE {}", param),
            Command::Rest { position } => write!(f, "REST {}", position),
            Command::Retr { path } => write!(f, "RETR {}", path),
            Command::Stor { path } => write!(f, "STOR {}", path),
            Command::Appe { path } => write!(f, "APPE {}", path),
            Command::Stou { path } => opt(f, "STOU", path),
            Command::List { path } => opt(f, "LIST", path),
            Command::Nlst { path } => opt(f, "NLST", path),
            Command::Mlsd { path } => opt(f, "MLSD", path),
            Command::Mlst { path } => opt(f, "MLST", path),
            Command::Pwd => write!(f, "PWD"),
            Command::Cwd { path } => write!(f, "CWD {}", path),
            Command::Cdup => write!(f, "CDUP"),
            Command::Mkd { path } => write!(f, "MKD {}", path),
            Command::Rmd { path } => write!(f, "RMD {}", path),
            Command::Dele { path } => write!(f, "DELE {}", path),
            Command::Rnfr { path } => write!(f, "RNFR {}", path),
            Command::Rnto { path } => write!(f, "RNTO {}", path),
            Command::Size { path } => write!(f, "SIZE {}", path),
            Command::Mdtm { path } => write!(f, "MDTM {}", path),
            Command::Stat { path } => opt(f, "STAT", path),
            Command::Abor => write!(f, "ABOR"),
            Command::Feat => write!(f, "FEAT"),
            Command::Help { topic } => opt(f, "HELP", topic),
            Command::Syst => write!(f, "SYST"),
            Command::Noop => write!(f, "NOOP"),
            Command::Allo => write!(f, "ALLO"),
            Command::NotImplemented { name } => write!(f, "{}", name),
        }
    }
}

fn opt(f: &mut fmt::Formatter, name: &str, arg: &Option<String>) -> fmt::Result {
    match arg {
        Some(arg) => write!(f, "{} {}", name, arg),
        None => write!(f, "{}", name),
    }
}

/// Whether a command requires, forbids or merely accepts an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgClass {
    Required,
    Forbidden,
    Optional,
}

/// One row of the static command table: the argument class drives the syntax
/// check in the parser, the help text feeds HELP.
pub struct CmdSpec {
    pub name: &'static str,
    pub arg: ArgClass,
    pub help: &'static str,
}

/// Every command the server recognizes, including the RFC 775 X-synonyms.
/// Kept sorted by name; HELP renders it in this order.
pub const COMMAND_TABLE: &[CmdSpec] = &[
    CmdSpec { name: "ABOR", arg: ArgClass::Forbidden, help: "Syntax: ABOR (abort transfer)." },
    CmdSpec { name: "ACCT", arg: ArgClass::Optional, help: "Syntax: ACCT account-info (not implemented)." },
    CmdSpec { name: "ALLO", arg: ArgClass::Required, help: "Syntax: ALLO bytes (obsolete; allocate storage)." },
    CmdSpec { name: "APPE", arg: ArgClass::Required, help: "Syntax: APPE file-name (append data to an existent file)." },
    CmdSpec { name: "CDUP", arg: ArgClass::Forbidden, help: "Syntax: CDUP (go to parent directory)." },
    CmdSpec { name: "CWD", arg: ArgClass::Optional, help: "Syntax: CWD dir-name (change current working directory)." },
    CmdSpec { name: "DELE", arg: ArgClass::Required, help: "Syntax: DELE file-name (delete file)." },
    CmdSpec { name: "FEAT", arg: ArgClass::Forbidden, help: "Syntax: FEAT (list all new features supported)." },
    CmdSpec { name: "HELP", arg: ArgClass::Optional, help: "Syntax: HELP [cmd] (show help)." },
    CmdSpec { name: "LIST", arg: ArgClass::Optional, help: "Syntax: LIST [path-name] (list files)." },
    CmdSpec { name: "MDTM", arg: ArgClass::Required, help: "Syntax: MDTM file-name (get last modification time)." },
    CmdSpec { name: "MKD", arg: ArgClass::Required, help: "Syntax: MKD dir-name (create directory)." },
    CmdSpec { name: "MLSD", arg: ArgClass::Optional, help: "Syntax: MLSD [dir-name] (list directory in a machine-readable form)." },
    CmdSpec { name: "MLST", arg: ArgClass::Optional, help: "Syntax: MLST [path-name] (show a path in a machine-readable form)." },
    CmdSpec { name: "MODE", arg: ArgClass::Required, help: "Syntax: MODE mode (noop; set data transfer mode)." },
    CmdSpec { name: "NLST", arg: ArgClass::Optional, help: "Syntax: NLST [path-name] (list file names)." },
    CmdSpec { name: "NOOP", arg: ArgClass::Forbidden, help: "Syntax: NOOP (just do nothing)." },
    CmdSpec { name: "PASS", arg: ArgClass::Optional, help: "Syntax: PASS password (set user password)." },
    CmdSpec { name: "PASV", arg: ArgClass::Forbidden, help: "Syntax: PASV (set server in passive mode)." },
    CmdSpec { name: "PORT", arg: ArgClass::Required, help: "Syntax: PORT h1,h2,h3,h4,p1,p2 (set server in active mode)." },
    CmdSpec { name: "PWD", arg: ArgClass::Forbidden, help: "Syntax: PWD (get current working directory)." },
    CmdSpec { name: "QUIT", arg: ArgClass::Forbidden, help: "Syntax: QUIT (quit current session)." },
    CmdSpec { name: "REIN", arg: ArgClass::Forbidden, help: "Syntax: REIN (reinitialize / flush account)." },
    CmdSpec { name: "REST", arg: ArgClass::Required, help: "Syntax: REST marker (restart file position)." },
    CmdSpec { name: "RETR", arg: ArgClass::Required, help: "Syntax: RETR file-name (retrieve a file)." },
    CmdSpec { name: "RMD", arg: ArgClass::Required, help: "Syntax: RMD dir-name (remove directory)." },
    CmdSpec { name: "RNFR", arg: ArgClass::Required, help: "Syntax: RNFR file-name (file renaming source)." },
    CmdSpec { name: "RNTO", arg: ArgClass::Required, help: "Syntax: RNTO file-name (file renaming destination)." },
    CmdSpec { name: "SITE", arg: ArgClass::Optional, help: "Syntax: SITE site-command (not implemented)." },
    CmdSpec { name: "SIZE", arg: ArgClass::Required, help: "Syntax: SIZE file-name (get file size)." },
    CmdSpec { name: "SMNT", arg: ArgClass::Optional, help: "Syntax: SMNT path-name (not implemented)." },
    CmdSpec { name: "STAT", arg: ArgClass::Optional, help: "Syntax: STAT [path-name] (server stats or directory listing)." },
    CmdSpec { name: "STOR", arg: ArgClass::Required, help: "Syntax: STOR file-name (store a file)." },
    CmdSpec { name: "STOU", arg: ArgClass::Optional, help: "Syntax: STOU [file-name] (store a file with a unique name)." },
    CmdSpec { name: "STRU", arg: ArgClass::Required, help: "Syntax: STRU type (noop; set file structure)." },
    CmdSpec { name: "SYST", arg: ArgClass::Forbidden, help: "Syntax: SYST (get operating system type)." },
    CmdSpec { name: "TYPE", arg: ArgClass::Required, help: "Syntax: TYPE [A | I] (set transfer type)." },
    CmdSpec { name: "USER", arg: ArgClass::Required, help: "Syntax: USER user-name (set username)." },
    CmdSpec { name: "XCUP", arg: ArgClass::Forbidden, help: "Syntax: XCUP (obsolete; go to parent directory)." },
    CmdSpec { name: "XCWD", arg: ArgClass::Optional, help: "Syntax: XCWD dir-name (obsolete; change current directory)." },
    CmdSpec { name: "XMKD", arg: ArgClass::Required, help: "Syntax: XMKD dir-name (obsolete; create directory)." },
    CmdSpec { name: "XPWD", arg: ArgClass::Forbidden, help: "Syntax: XPWD (obsolete; get current dir)." },
    CmdSpec { name: "XRMD", arg: ArgClass::Required, help: "Syntax: XRMD dir-name (obsolete; remove directory)." },
];

/// Looks a command up by its (already uppercased) name.
pub fn lookup(name: &str) -> Option<&'static CmdSpec> {
    COMMAND_TABLE.iter().find(|spec| spec.name == name)
}
