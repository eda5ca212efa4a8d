//! Rendering of directory entries into the LIST and MLSx wire formats.

use chrono::{DateTime, Local, Utc};
use std::fmt::Write;
use std::fs::Metadata;
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::{MetadataExt, PermissionsExt};

/// One directory entry as gathered by the sandbox: the bare name, its lstat
/// metadata and, for symlinks, the link target.
#[derive(Debug)]
pub struct Entry {
    /// File name without any directory components.
    pub name: String,
    /// Metadata from `lstat`, so symlinks describe themselves.
    pub metadata: Metadata,
    /// The target a symlink points at.
    pub link_target: Option<PathBuf>,
}

/// Formats one `/bin/ls -lA` style line:
/// `-rw-r--r--   1 0        0            1024 Nov 30 12:30 name`.
pub fn format_list_line(entry: &Entry) -> String {
    let meta = &entry.metadata;
    let mtime = match meta.modified() {
        Ok(t) => DateTime::<Local>::from(t).format("%b %d %H:%M").to_string(),
        Err(_) => "Jan 01 00:00".to_string(),
    };
    let link = match &entry.link_target {
        Some(target) => format!(" -> {}", target.display()),
        None => String::new(),
    };
    format!(
        "{}{} {:>3} {:<8} {:<8} {:>8} {} {}{}",
        file_type_char(meta),
        mode_string(meta),
        nlink(meta),
        owner(meta),
        group(meta),
        meta.len(),
        mtime,
        entry.name,
        link,
    )
}

/// Formats the semicolon-separated MLSx fact list followed by a space and the
/// name. `name` is the bare entry name for MLSD and the fully qualified
/// virtual path for MLST.
pub fn format_mlsx_line(name: &str, meta: &Metadata) -> String {
    let mut facts = String::new();
    let ftype = match name {
        "." => "cdir",
        ".." => "pdir",
        _ if meta.is_dir() => "dir",
        _ => "file",
    };
    let _ = write!(facts, "type={};size={};", ftype, meta.len());
    if let Ok(t) = meta.modified() {
        let _ = write!(facts, "modify={};", DateTime::<Utc>::from(t).format("%Y%m%d%H%M%S"));
    }
    #[cfg(windows)]
    if let Ok(t) = meta.created() {
        let _ = write!(facts, "create={};", DateTime::<Utc>::from(t).format("%Y%m%d%H%M%S"));
    }
    #[cfg(unix)]
    {
        let _ = write!(
            facts,
            "UNIX.mode={:04o};UNIX.uid={};UNIX.gid={};unique={:x}{:x};",
            meta.permissions().mode() & 0o7777,
            meta.uid(),
            meta.gid(),
            meta.dev(),
            meta.ino(),
        );
    }
    format!("{} {}", facts, name)
}

fn file_type_char(meta: &Metadata) -> char {
    if meta.file_type().is_symlink() {
        'l'
    } else if meta.is_dir() {
        'd'
    } else {
        '-'
    }
}

#[cfg(unix)]
fn mode_string(meta: &Metadata) -> String {
    let mode = meta.permissions().mode();
    let mut out = String::with_capacity(9);
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

#[cfg(not(unix))]
fn mode_string(meta: &Metadata) -> String {
    if meta.permissions().readonly() {
        "r--r--r--".to_string()
    } else {
        "rw-rw-rw-".to_string()
    }
}

#[cfg(unix)]
fn nlink(meta: &Metadata) -> u64 {
    meta.nlink()
}

#[cfg(not(unix))]
fn nlink(_meta: &Metadata) -> u64 {
    1
}

#[cfg(unix)]
fn owner(meta: &Metadata) -> String {
    meta.uid().to_string()
}

#[cfg(not(unix))]
fn owner(_meta: &Metadata) -> String {
    "owner".to_string()
}

#[cfg(unix)]
fn group(meta: &Metadata) -> String {
    meta.gid().to_string()
}

#[cfg(not(unix))]
fn group(_meta: &Metadata) -> String {
    "group".to_string()
}
