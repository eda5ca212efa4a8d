use bitflags::bitflags;
use std::{
    fmt::{self, Display, Formatter},
    path::PathBuf,
};

bitflags! {
    /// The filesystem operations a user is entitled to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Permissions: u8 {
        /// Allows downloads and directory listings.
        const READ = 0b01;
        /// Allows uploads, deletes, renames and directory creation/removal.
        const WRITE = 0b10;
    }
}

impl Permissions {
    /// Parses a permission string the way user files spell it: `r` for read,
    /// `w` for write. Any other character is rejected.
    pub fn from_chars(s: &str) -> Result<Permissions, char> {
        let mut perms = Permissions::empty();
        for c in s.chars() {
            match c {
                'r' => perms |= Permissions::READ,
                'w' => perms |= Permissions::WRITE,
                other => return Err(other),
            }
        }
        Ok(perms)
    }
}

/// A single entry in the virtual-user directory.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// The unique login name.
    pub username: String,
    /// The password the account validates against. Ignored for the
    /// `anonymous` account.
    pub password: String,
    /// The host directory that becomes the session root on login.
    pub home_dir: PathBuf,
    /// What the user is allowed to do.
    pub perms: Permissions,
    /// Sent with the `230` reply after login.
    pub msg_login: String,
    /// Sent with the `221` reply on QUIT.
    pub msg_quit: String,
}

impl UserRecord {
    /// Creates a record with the default login and quit messages.
    pub fn new<S: Into<String>, P: Into<PathBuf>>(username: S, password: S, home_dir: P, perms: Permissions) -> Self {
        UserRecord {
            username: username.into(),
            password: password.into(),
            home_dir: home_dir.into(),
            perms,
            msg_login: "Login successful.".to_string(),
            msg_quit: "Goodbye.".to_string(),
        }
    }
}

impl Display for UserRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn perm_string_parses() {
        assert_eq!(Permissions::from_chars("rw"), Ok(Permissions::READ | Permissions::WRITE));
        assert_eq!(Permissions::from_chars("r"), Ok(Permissions::READ));
        assert_eq!(Permissions::from_chars(""), Ok(Permissions::empty()));
    }

    #[test]
    fn perm_string_rejects_unknown_chars() {
        assert_eq!(Permissions::from_chars("rwx"), Err('x'));
    }
}
