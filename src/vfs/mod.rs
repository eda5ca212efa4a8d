//! The virtual filesystem sandbox.
//!
//! Every session owns a [`VirtualFs`] anchored at the host directory of the
//! user it logged in as (the *root*) and a working directory expressed in the
//! client's virtual namespace (the *cwd*, always starting at `/`). All paths
//! a client supplies are translated to host paths with [`VirtualFs::ftp2fs`]
//! and must pass the [`VirtualFs::validpath`] containment check, symlinks
//! resolved, before any filesystem call touches them.

mod error;
mod glob;
mod listing;

pub use error::{FsError, Result};
pub use listing::Entry;

use listing::{format_list_line, format_mlsx_line};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tokio::fs::{File, OpenOptions};

// Attempts at creating a unique STOU file name before giving up.
const MKSTEMP_RETRIES: u32 = 16;

/// A sandboxed view on the host filesystem, bound to one session.
#[derive(Debug, Clone)]
pub struct VirtualFs {
    root: PathBuf,
    cwd: PathBuf,
}

impl VirtualFs {
    /// Creates a sandbox rooted at the given host directory, with the working
    /// directory at `/`. Fails if the root is not an existing directory.
    pub async fn new<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let root = root.into();
        let meta = tokio::fs::metadata(&root).await?;
        if !meta.is_dir() {
            return Err(FsError::new("Not a directory"));
        }
        Ok(VirtualFs { root, cwd: PathBuf::from("/") })
    }

    /// The host path acting as the virtual `/`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The current working directory in the client's namespace.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub(crate) fn set_cwd(&mut self, cwd: PathBuf) {
        self.cwd = cwd;
    }

    /// Normalizes a client-supplied path into an absolute virtual path:
    /// relative input is anchored at the cwd, `.`/`..`/repeated separators
    /// collapse, and `..` never ascends above `/`.
    pub fn ftpnorm(&self, path: &str) -> PathBuf {
        let path = path.replace(std::path::MAIN_SEPARATOR, "/");
        let mut out = if path.starts_with('/') || !self.cwd.is_absolute() {
            PathBuf::from("/")
        } else {
            self.cwd.clone()
        };
        for part in path.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    out.pop();
                }
                segment => out.push(segment),
            }
        }
        out
    }

    /// Translates a client-supplied path into a host path candidate. The
    /// result still has to pass [`validpath`](VirtualFs::validpath).
    pub fn ftp2fs(&self, path: &str) -> PathBuf {
        let virtual_path = self.ftpnorm(path);
        let relative = virtual_path.strip_prefix("/").unwrap_or(&virtual_path);
        self.root.join(relative)
    }

    /// Translates a host path back into the client's namespace. Host paths
    /// outside the root map to `/`.
    pub fn fs2ftp(&self, path: &Path) -> PathBuf {
        match path.strip_prefix(&self.root) {
            Ok(rest) if rest.as_os_str().is_empty() => PathBuf::from("/"),
            Ok(rest) => Path::new("/").join(rest),
            Err(_) => PathBuf::from("/"),
        }
    }

    /// The containment predicate: true iff the candidate, with symlinks
    /// resolved in both it and the root, still lies under the root.
    pub async fn validpath(&self, path: &Path) -> bool {
        let root = realpath(&self.root).await;
        let path = realpath(path).await;
        path.starts_with(&root)
    }

    /// Opens a file for reading.
    pub async fn open_read(&self, path: &Path) -> Result<File> {
        Ok(OpenOptions::new().read(true).open(path).await?)
    }

    /// Opens a file for writing, creating or truncating it.
    pub async fn open_write(&self, path: &Path) -> Result<File> {
        Ok(OpenOptions::new().write(true).create(true).truncate(true).open(path).await?)
    }

    /// Opens a file for appending, creating it if needed.
    pub async fn open_append(&self, path: &Path) -> Result<File> {
        Ok(OpenOptions::new().append(true).create(true).open(path).await?)
    }

    /// Opens a file for reading and writing without truncation, as needed to
    /// resume an upload at an offset.
    pub async fn open_rw(&self, path: &Path) -> Result<File> {
        Ok(OpenOptions::new().read(true).write(true).create(true).open(path).await?)
    }

    /// Creates a uniquely named file under `dir`, returning the open handle
    /// and the chosen basename.
    pub async fn mkstemp(&self, dir: &Path, prefix: &str) -> Result<(File, String)> {
        for _ in 0..MKSTEMP_RETRIES {
            let mut raw = [0u8; 4];
            getrandom::fill(&mut raw).expect("Error generating random file name");
            let name = format!("{}{:08x}", prefix, u32::from_ne_bytes(raw));
            match OpenOptions::new().write(true).create_new(true).open(dir.join(&name)).await {
                Ok(file) => return Ok((file, name)),
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(FsError::new("Could not create a unique file name"))
    }

    /// Verifies a directory can be entered by opening it for listing once.
    pub async fn probe_dir(&self, path: &Path) -> Result<()> {
        tokio::fs::read_dir(path).await?;
        Ok(())
    }

    /// Creates a directory.
    pub async fn mkdir(&self, path: &Path) -> Result<()> {
        Ok(tokio::fs::create_dir(path).await?)
    }

    /// Removes an empty directory.
    pub async fn rmdir(&self, path: &Path) -> Result<()> {
        Ok(tokio::fs::remove_dir(path).await?)
    }

    /// Removes a file.
    pub async fn remove(&self, path: &Path) -> Result<()> {
        Ok(tokio::fs::remove_file(path).await?)
    }

    /// Renames a file or directory.
    pub async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        Ok(tokio::fs::rename(from, to).await?)
    }

    /// Returns metadata, following symlinks.
    pub async fn metadata(&self, path: &Path) -> Result<std::fs::Metadata> {
        Ok(tokio::fs::metadata(path).await?)
    }

    /// Returns metadata without following symlinks.
    pub async fn symlink_metadata(&self, path: &Path) -> Result<std::fs::Metadata> {
        Ok(tokio::fs::symlink_metadata(path).await?)
    }

    /// Tells whether the path is an existing directory.
    pub async fn is_dir(&self, path: &Path) -> bool {
        matches!(tokio::fs::metadata(path).await, Ok(meta) if meta.is_dir())
    }

    /// Tells whether the path is an existing regular file.
    pub async fn is_file(&self, path: &Path) -> bool {
        matches!(tokio::fs::metadata(path).await, Ok(meta) if meta.is_file())
    }

    /// Tells whether the path is a symbolic link.
    pub async fn is_link(&self, path: &Path) -> bool {
        matches!(tokio::fs::symlink_metadata(path).await, Ok(meta) if meta.file_type().is_symlink())
    }

    /// Tells whether the path exists at all, symlinks not followed.
    pub async fn lexists(&self, path: &Path) -> bool {
        tokio::fs::symlink_metadata(path).await.is_ok()
    }

    /// The size in raw host bytes, regardless of the transfer type.
    pub async fn getsize(&self, path: &Path) -> Result<u64> {
        Ok(tokio::fs::metadata(path).await?.len())
    }

    /// The last modification time.
    pub async fn getmtime(&self, path: &Path) -> Result<SystemTime> {
        Ok(tokio::fs::metadata(path).await?.modified()?)
    }

    /// Resolves symlinks the way `realpath` does, tolerating paths whose
    /// tail does not exist yet.
    pub async fn realpath(&self, path: &Path) -> PathBuf {
        realpath(path).await
    }

    /// Lists a directory, entries sorted by name.
    pub async fn list_dir(&self, path: &Path) -> Result<Vec<Entry>> {
        let mut dir = tokio::fs::read_dir(path).await?;
        let mut entries = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name().to_string_lossy().into_owned();
            let metadata = tokio::fs::symlink_metadata(item.path()).await?;
            let link_target = if metadata.file_type().is_symlink() {
                tokio::fs::read_link(item.path()).await.ok()
            } else {
                None
            };
            entries.push(Entry { name, metadata, link_target });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// LIST lines for a path: the directory's entries, or the single line
    /// describing a non-directory.
    pub async fn list_lines(&self, path: &Path) -> Result<Vec<String>> {
        if self.metadata(path).await?.is_dir() {
            Ok(self.list_dir(path).await?.iter().map(format_list_line).collect())
        } else {
            Ok(vec![format_list_line(&self.single_entry(path).await?)])
        }
    }

    /// NLST lines: bare names.
    pub async fn nlst_lines(&self, path: &Path) -> Result<Vec<String>> {
        if self.metadata(path).await?.is_dir() {
            Ok(self.list_dir(path).await?.into_iter().map(|e| e.name).collect())
        } else {
            Ok(vec![self.single_entry(path).await?.name])
        }
    }

    /// MLSD lines: one fact list per entry of a directory.
    pub async fn mlsd_lines(&self, path: &Path) -> Result<Vec<String>> {
        Ok(self
            .list_dir(path)
            .await?
            .iter()
            .map(|e| format_mlsx_line(&e.name, &e.metadata))
            .collect())
    }

    /// The single MLST fact line for a path, named by the fully qualified
    /// virtual path.
    pub async fn mlst_line(&self, path: &Path, virtual_path: &Path) -> Result<String> {
        let meta = self.metadata(path).await?;
        Ok(format_mlsx_line(&virtual_path.display().to_string(), &meta))
    }

    /// The listing behind STAT-with-argument: a plain LIST when the argument
    /// has no glob characters, otherwise the entries of the argument's
    /// directory part filtered by its pattern part, non-recursively.
    pub async fn stat_dir(&self, arg: &str) -> Result<Vec<String>> {
        if !glob::has_magic(arg) {
            let host = self.contained(arg).await?;
            return self.list_lines(&host).await;
        }
        let (dir, pattern) = match arg.rfind('/') {
            Some(i) => (&arg[..i], &arg[i + 1..]),
            None => ("", arg),
        };
        if glob::has_magic(dir) {
            return Err(FsError::new("Directory recursion not supported"));
        }
        let host = self.contained(dir).await?;
        let entries = self.list_dir(&host).await?;
        Ok(entries
            .iter()
            .filter(|e| glob::fnmatch(pattern, &e.name))
            .map(format_list_line)
            .collect())
    }

    // Translates and containment-checks in one step, for callers that take
    // raw client input.
    async fn contained(&self, arg: &str) -> Result<PathBuf> {
        let host = self.ftp2fs(arg);
        if self.validpath(&host).await {
            Ok(host)
        } else {
            Err(FsError::new(format!(
                "\"{}\" points to a path which is outside the user's root directory",
                self.ftpnorm(arg).display()
            )))
        }
    }

    async fn single_entry(&self, path: &Path) -> Result<Entry> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string());
        let metadata = self.symlink_metadata(path).await?;
        let link_target = if metadata.file_type().is_symlink() {
            tokio::fs::read_link(path).await.ok()
        } else {
            None
        };
        Ok(Entry { name, metadata, link_target })
    }
}

// Resolves symlinks the way `realpath` does for paths that may not fully
// exist: the deepest existing ancestor is canonicalized, the remainder is
// appended untouched.
async fn realpath(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut tail: Vec<std::ffi::OsString> = Vec::new();
    loop {
        match tokio::fs::canonicalize(&existing).await {
            Ok(mut resolved) => {
                for part in tail.iter().rev() {
                    resolved.push(part);
                }
                return lexical_clean(&resolved);
            }
            Err(_) => match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    tail.push(name.to_os_string());
                    existing = parent.to_path_buf();
                }
                _ => return lexical_clean(path),
            },
        }
    }
}

// Collapses `.` and `..` components without touching the filesystem.
fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn sandbox() -> (tempfile::TempDir, VirtualFs) {
        let dir = tempfile::tempdir().unwrap();
        let fs = VirtualFs::new(dir.path()).await.unwrap();
        (dir, fs)
    }

    #[tokio::test]
    async fn ftpnorm_anchors_and_collapses() {
        let (_dir, mut fs) = sandbox().await;
        assert_eq!(fs.ftpnorm("a/b/../c"), PathBuf::from("/a/c"));
        assert_eq!(fs.ftpnorm("/a//b/./c"), PathBuf::from("/a/b/c"));
        assert_eq!(fs.ftpnorm("../../.."), PathBuf::from("/"));
        fs.set_cwd(PathBuf::from("/sub"));
        assert_eq!(fs.ftpnorm("x"), PathBuf::from("/sub/x"));
        assert_eq!(fs.ftpnorm(".."), PathBuf::from("/"));
        assert_eq!(fs.ftpnorm("/abs"), PathBuf::from("/abs"));
    }

    #[tokio::test]
    async fn ftp2fs_and_back_is_ftpnorm() {
        let (_dir, fs) = sandbox().await;
        for p in ["a/b", "/a/b/../c", "deep/./x", "/"] {
            assert_eq!(fs.fs2ftp(&fs.ftp2fs(p)), fs.ftpnorm(p), "path {p:?}");
        }
    }

    #[tokio::test]
    async fn fs2ftp_maps_outsiders_to_root() {
        let (_dir, fs) = sandbox().await;
        assert_eq!(fs.fs2ftp(Path::new("/definitely/elsewhere")), PathBuf::from("/"));
        assert_eq!(fs.fs2ftp(fs.root()), PathBuf::from("/"));
    }

    #[tokio::test]
    async fn validpath_accepts_inside_rejects_outside() {
        let (dir, fs) = sandbox().await;
        let inside = dir.path().join("ok.txt");
        std::fs::write(&inside, b"x").unwrap();
        assert!(fs.validpath(&inside).await);
        assert!(fs.validpath(fs.root()).await);
        assert!(!fs.validpath(Path::new("/etc")).await);
        // A lexical escape through the translated form must fail too.
        assert!(!fs.validpath(&fs.root().join("../../etc")).await);
    }

    #[tokio::test]
    async fn validpath_covers_nonexistent_children() {
        let (_dir, fs) = sandbox().await;
        assert!(fs.validpath(&fs.root().join("not/yet/there")).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn validpath_resolves_symlink_escapes() {
        let (dir, fs) = sandbox().await;
        let outside = tempfile::tempdir().unwrap();
        let link = dir.path().join("sneaky");
        std::os::unix::fs::symlink(outside.path(), &link).unwrap();
        assert!(!fs.validpath(&link).await);
    }

    #[tokio::test]
    async fn mkstemp_creates_unique_files() {
        let (dir, fs) = sandbox().await;
        let (_f1, n1) = fs.mkstemp(dir.path(), "ftpd.").await.unwrap();
        let (_f2, n2) = fs.mkstemp(dir.path(), "ftpd.").await.unwrap();
        assert_ne!(n1, n2);
        assert!(n1.starts_with("ftpd."));
        assert!(dir.path().join(&n1).exists());
    }

    #[tokio::test]
    async fn list_lines_for_file_and_directory() {
        let (dir, fs) = sandbox().await;
        std::fs::write(dir.path().join("b.txt"), b"bb").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let lines = fs.list_lines(fs.root()).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("a.txt"), "sorted: {lines:?}");
        let single = fs.list_lines(&dir.path().join("a.txt")).await.unwrap();
        assert_eq!(single.len(), 1);
        assert!(single[0].ends_with("a.txt"));
    }

    #[tokio::test]
    async fn stat_dir_globs_non_recursively() {
        let (dir, fs) = sandbox().await;
        std::fs::write(dir.path().join("data.1"), b"x").unwrap();
        std::fs::write(dir.path().join("data.2"), b"x").unwrap();
        std::fs::write(dir.path().join("other"), b"x").unwrap();
        let lines = fs.stat_dir("data.*").await.unwrap();
        assert_eq!(lines.len(), 2);
        let err = fs.stat_dir("da*/x.*").await.unwrap_err();
        assert_eq!(err.to_string(), "Directory recursion not supported");
        let plain = fs.stat_dir("other").await.unwrap();
        assert_eq!(plain.len(), 1);
    }

    #[tokio::test]
    async fn stat_dir_rejects_escaped_directories() {
        let (_dir, fs) = sandbox().await;
        let err = fs.stat_dir("../../etc/*").await.unwrap_err();
        assert!(err.to_string().contains("outside the user's root directory"));
    }

    #[tokio::test]
    async fn new_rejects_missing_root() {
        assert!(VirtualFs::new("/definitely/not/there").await.is_err());
    }
}
