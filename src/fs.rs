//! Thin, semantic view over the host filesystem.
//!
//! All operations here take already-[`crate::sandbox`]-resolved absolute
//! paths; this module never re-derives or re-checks the virtual root, it
//! only distinguishes filesystem *outcomes* and types them for the protocol
//! layer to translate into reply codes.

use crate::error::{FsError, FsErrorKind};
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Result type used throughout this module.
pub type Result<T> = std::result::Result<T, FsError>;

/// Metadata for a single directory entry or stat target.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub is_dir: bool,
    pub is_file: bool,
    pub len: u64,
    pub modified: SystemTime,
    pub uid: u32,
    pub gid: u32,
    pub nlink: u64,
    pub mode: u32,
}

impl From<std::fs::Metadata> for Metadata {
    fn from(meta: std::fs::Metadata) -> Self {
        Metadata {
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            len: meta.len(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            uid: meta.uid(),
            gid: meta.gid(),
            nlink: meta.nlink(),
            mode: meta.permissions().mode(),
        }
    }
}

/// A single entry returned by [`Filesystem::list`], paired with its metadata.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub metadata: Metadata,
}

/// A view over the host filesystem, scoped by the caller to paths already
/// confined to the virtual root.
#[derive(Debug, Clone)]
pub struct Filesystem;

impl Filesystem {
    /// Creates a new adapter. Stateless: the virtual root is enforced by the
    /// caller via [`crate::sandbox::resolve`], not held here.
    pub fn new() -> Self {
        Filesystem
    }

    /// Returns metadata for `path`, or [`FsErrorKind::NotFound`] if nothing
    /// exists there.
    #[tracing_attributes::instrument(skip(self))]
    pub async fn stat(&self, path: &Path) -> Result<Metadata> {
        Ok(fs::metadata(path).await?.into())
    }

    /// Lists the entries of the directory at `path`.
    ///
    /// Fails with [`FsErrorKind::NotADirectory`] if `path` is a regular file,
    /// or [`FsErrorKind::NotFound`] if nothing exists there.
    #[tracing_attributes::instrument(skip(self))]
    pub async fn list(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let meta = fs::metadata(path).await?;
        if !meta.is_dir() {
            return Err(FsErrorKind::NotADirectory.into());
        }
        let mut read_dir = fs::read_dir(path).await?;
        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let metadata: Metadata = entry.metadata().await?.into();
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                metadata,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Opens `path` for reading. Fails with [`FsErrorKind::NotAFile`] if the
    /// target is not a regular file (directories in particular are refused,
    /// per `RETR`'s contract).
    #[tracing_attributes::instrument(skip(self))]
    pub async fn open_read(&self, path: &Path) -> Result<fs::File> {
        let meta = fs::metadata(path).await?;
        if !meta.is_file() {
            return Err(FsErrorKind::NotAFile.into());
        }
        Ok(fs::File::open(path).await?)
    }

    /// Creates (or truncates) `path` for writing.
    #[tracing_attributes::instrument(skip(self))]
    pub async fn create_write(&self, path: &Path) -> Result<fs::File> {
        Ok(fs::File::create(path).await?)
    }

    /// Copies all bytes from `reader` into `path`, returning the number of
    /// bytes written.
    pub async fn write_all_from(&self, path: &Path, mut reader: impl tokio::io::AsyncRead + Unpin) -> Result<u64> {
        let mut file = self.create_write(path).await?;
        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        Ok(written)
    }

    /// Creates a directory at `path`. The parent must already exist; fails
    /// with [`FsErrorKind::AlreadyExists`] if `path` already exists.
    #[tracing_attributes::instrument(skip(self))]
    pub async fn create_dir(&self, path: &Path) -> Result<()> {
        if fs::metadata(path).await.is_ok() {
            return Err(FsErrorKind::AlreadyExists.into());
        }
        match fs::create_dir(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FsErrorKind::NotFound.into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Recursively removes the directory tree rooted at `path`. Deviates
    /// from strict FTP (which requires an empty directory for `RMD`) for
    /// compatibility with the reference behavior; see the design notes.
    #[tracing_attributes::instrument(skip(self))]
    pub async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let meta = fs::metadata(path).await?;
        if !meta.is_dir() {
            return Err(FsErrorKind::NotADirectory.into());
        }
        Ok(fs::remove_dir_all(path).await?)
    }

    /// Removes the regular file at `path`. Fails with
    /// [`FsErrorKind::NotAFile`] if `path` is a directory.
    #[tracing_attributes::instrument(skip(self))]
    pub async fn remove_file(&self, path: &Path) -> Result<()> {
        let meta = fs::metadata(path).await?;
        if !meta.is_file() {
            return Err(FsErrorKind::NotAFile.into());
        }
        Ok(fs::remove_file(path).await?)
    }
}

impl Default for Filesystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Seeds a fresh virtual root with a sample file and nested subdirectory, as
/// described by the specification's startup side effects.
pub async fn seed_root(root: &Path) -> std::io::Result<()> {
    fs::create_dir_all(root).await?;
    fs::write(root.join("message.md"), b"hello\nftp\n").await?;
    let sub = root.join("server");
    fs::create_dir_all(&sub).await?;
    fs::write(sub.join("main.go"), b"package main\n\nfunc main() {}\n").await?;
    Ok(())
}

/// Removes the scratch root directory tree, if present. Safe to call more
/// than once.
pub async fn cleanup_root(root: &Path) -> std::io::Result<()> {
    match fs::remove_dir_all(root).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Joins `name` under `path`, used by listing/path display code that needs
/// the full entry path rather than just its basename.
pub fn entry_path(path: &Path, name: &str) -> PathBuf {
    path.join(name)
}
