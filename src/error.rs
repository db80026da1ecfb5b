//! Error types shared by the filesystem adapter and the control channel.

use thiserror::Error;

/// A filesystem outcome that is not plain success, typed for translation into an FTP reply.
///
/// Mirrors the `Error`/`ErrorKind` split storage backends use: a closed set of
/// semantic kinds the protocol layer can match on, carrying the underlying
/// I/O error for logging.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct FsError {
    kind: FsErrorKind,
    #[source]
    source: Option<std::io::Error>,
}

/// The kinds of filesystem outcome a handler needs to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum FsErrorKind {
    /// No entry exists at the resolved path.
    #[display("no such file or directory")]
    NotFound,
    /// The entry exists but is not a directory where one was required.
    #[display("not a directory")]
    NotADirectory,
    /// The entry exists but is not a regular file where one was required.
    #[display("not a regular file")]
    NotAFile,
    /// An entry already exists at the resolved path.
    #[display("already exists")]
    AlreadyExists,
    /// The host denied the operation.
    #[display("permission denied")]
    PermissionDenied,
    /// Any other I/O failure not classified above.
    #[display("local filesystem error")]
    Other,
}

impl FsError {
    /// Creates a new error of the given kind, with an I/O source for logging.
    pub fn new(kind: FsErrorKind, source: std::io::Error) -> Self {
        FsError { kind, source: Some(source) }
    }

    /// The semantic kind of failure.
    pub fn kind(&self) -> FsErrorKind {
        self.kind
    }
}

impl From<FsErrorKind> for FsError {
    fn from(kind: FsErrorKind) -> Self {
        FsError { kind, source: None }
    }
}

impl From<std::io::Error> for FsError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => FsErrorKind::NotFound,
            std::io::ErrorKind::AlreadyExists => FsErrorKind::AlreadyExists,
            std::io::ErrorKind::PermissionDenied => FsErrorKind::PermissionDenied,
            _ => FsErrorKind::Other,
        };
        FsError::new(kind, err)
    }
}

/// Errors that can terminate a control channel's dispatch loop.
///
/// Everything else a session encounters is recoverable and gets turned into
/// a 4xx/5xx [`crate::reply::Reply`] instead of reaching this type.
#[derive(Debug, Error)]
pub enum ControlChanError {
    /// The control connection could not be read from or written to.
    #[error("control channel I/O error: {0}")]
    Io(#[from] std::io::Error),
}
