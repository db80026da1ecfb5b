//! Per-connection session state and the command dispatch loop.
//!
//! One [`Session`] exists per control connection and owns that connection's
//! mutable state (`cwd`, the pending passive listener) exclusively: nothing
//! here is shared across sessions except the immutable virtual root, so no
//! synchronization is needed (see §5 of the specification).

use crate::command::{self, Command, ParseError};
use crate::error::{ControlChanError, FsErrorKind};
use crate::fs::Filesystem;
use crate::pasv::PassiveListener;
use crate::reply::{Reply, ReplyCode};
use crate::sandbox;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Where a session sits in the (trivial) connection lifecycle. Authentication
/// is a formality in this server - `USER`/`PASS` never gate other commands -
/// so this only tracks whether the control loop should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Ready,
    Closed,
}

/// Per-connection state: the virtual root, the current working directory,
/// and at most one pending passive listener.
pub struct Session {
    root: PathBuf,
    cwd: PathBuf,
    pasv: Option<PassiveListener>,
    local_addr: SocketAddr,
    fs: Filesystem,
    state: SessionState,
}

impl Session {
    /// Creates a new session rooted at `root`, with `cwd` starting at `root`.
    pub fn new(root: PathBuf, local_addr: SocketAddr) -> Self {
        Session {
            cwd: root.clone(),
            root,
            pasv: None,
            local_addr,
            fs: Filesystem::new(),
            state: SessionState::Ready,
        }
    }

    fn resolve(&self, reference: &str) -> PathBuf {
        sandbox::resolve(&self.root, &self.cwd, reference)
    }

    fn virtual_cwd(&self) -> String {
        sandbox::to_virtual(&self.cwd, &self.root)
    }

    /// Runs the session's dispatch loop to completion: sends the greeting,
    /// then reads one line at a time, dispatches it, and writes the reply,
    /// until `QUIT`, EOF, or an unrecoverable write error.
    pub async fn run(mut self, stream: TcpStream) {
        let peer = stream.peer_addr().map(|a| a.to_string()).unwrap_or_default();
        tracing::info!(%peer, "session started");
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        if let Err(e) = Self::send(&mut write_half, &Reply::new(ReplyCode::ServiceReady, "Service ready")).await {
            tracing::warn!("failed to send greeting: {e}");
            return;
        }

        let mut line = String::new();
        let reason = loop {
            line.clear();
            let n = match reader.read_line(&mut line).await {
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!("control channel read error: {e}");
                    break "io-error";
                }
            };
            if n == 0 {
                break "eof";
            }

            let reply = match command::parse(&line) {
                Ok(cmd) => {
                    let is_quit = cmd == Command::Quit;
                    let reply = self.dispatch(cmd, &mut write_half).await;
                    if self.state == SessionState::Closed || is_quit {
                        if let Err(e) = Self::send(&mut write_half, &reply).await {
                            tracing::warn!("failed to send final reply: {e}");
                        }
                        break "quit";
                    }
                    reply
                }
                Err(ParseError::Empty) => continue,
                Err(ParseError::MissingArgument(verb)) => Reply::new(ReplyCode::CommandFailed, format!("'{verb}' requires an argument")),
            };

            if let Err(e) = Self::send(&mut write_half, &reply).await {
                tracing::warn!("control channel write error, terminating session: {e}");
                break "io-error";
            }
        };

        tracing::info!(%peer, reason, "session terminated");
        if let Some(pasv) = self.pasv.take() {
            drop(pasv);
        }
    }

    async fn send(writer: &mut tokio::net::tcp::OwnedWriteHalf, reply: &Reply) -> Result<(), ControlChanError> {
        writer.write_all(reply.to_wire().as_bytes()).await?;
        Ok(())
    }

    /// Dispatches one parsed command, performing its side effects and
    /// returning the reply to send. Data-transferring commands send their
    /// own preliminary `150` directly on `writer` before this returns.
    async fn dispatch(&mut self, cmd: Command, writer: &mut tokio::net::tcp::OwnedWriteHalf) -> Reply {
        match cmd {
            Command::User(name) => Reply::new(ReplyCode::NeedPassword, format!("User {name} okay, need password")),
            Command::Pass(_) => Reply::new(ReplyCode::UserLoggedIn, "User logged in, proceed"),
            Command::Syst => Reply::new(ReplyCode::SystemType, "UNIX Type: L8"),
            Command::Feat => Reply::new(ReplyCode::SystemStatus, "No features supported"),
            Command::Type(flag) => Reply::new(ReplyCode::CommandOkay, format!("Type set to {flag}")),
            Command::Pwd => Reply::new(ReplyCode::PathCreated, format!("\"{}\" is the current directory", self.virtual_cwd())),
            Command::Cwd(path) => self.cwd_cmd(&path).await,
            Command::Pasv => self.pasv_cmd().await,
            Command::Epsv => Reply::new(ReplyCode::CommandNotImplemented, "EPSV not implemented"),
            Command::Size(path) => self.size_cmd(&path).await,
            Command::Mkd(path) => self.mkd_cmd(&path).await,
            Command::Rmd(path) => self.rmd_cmd(&path).await,
            Command::Dele(path) => self.dele_cmd(&path).await,
            Command::List(path) => self.data_cmd(writer, path, DataTransfer::List).await,
            Command::Nlst(path) => self.data_cmd(writer, path, DataTransfer::Nlst).await,
            Command::Retr(path) => self.data_cmd(writer, Some(path), DataTransfer::Retr).await,
            Command::Stor(path) => self.data_cmd(writer, Some(path), DataTransfer::Stor).await,
            Command::Quit => {
                self.state = SessionState::Closed;
                Reply::new(ReplyCode::ClosingControlConnection, "Service closing control connection")
            }
            Command::Unknown(verb) => Reply::new(ReplyCode::CommandNotImplemented, format!("Command not implemented \"{verb}\"")),
        }
    }

    async fn cwd_cmd(&mut self, path: &str) -> Reply {
        let target = self.resolve(path);
        match self.fs.stat(&target).await {
            Ok(meta) if meta.is_dir => {
                self.cwd = target;
                Reply::new(ReplyCode::FileActionOkay, format!("Directory changed to {}", self.virtual_cwd()))
            }
            Ok(_) => Reply::new(ReplyCode::ActionNotTaken, "Not a directory"),
            Err(e) if e.kind() == FsErrorKind::NotFound => Reply::new(ReplyCode::ActionNotTaken, "No such file or directory"),
            Err(_) => Reply::new(ReplyCode::ActionNotTaken, "Failed to change directory"),
        }
    }

    async fn pasv_cmd(&mut self) -> Reply {
        match PassiveListener::open(self.local_addr).await {
            Ok(listener) => {
                let (h1, h2, h3, h4, p1, p2) = listener.advertised_octets();
                self.pasv = Some(listener);
                Reply::new(
                    ReplyCode::EnteringPassiveMode,
                    format!("Entering Passive Mode ({h1},{h2},{h3},{h4},{p1},{p2})"),
                )
            }
            Err(e) => {
                tracing::warn!("failed to open passive listener: {e}");
                Reply::new(ReplyCode::CommandFailed, "Could not open passive listener")
            }
        }
    }

    async fn size_cmd(&mut self, path: &str) -> Reply {
        let target = self.resolve(path);
        match self.fs.stat(&target).await {
            Ok(meta) if meta.is_file => Reply::new(ReplyCode::FileStatus, meta.len.to_string()),
            Ok(_) => Reply::new(ReplyCode::ActionNotTaken, "Not a regular file"),
            Err(_) => Reply::new(ReplyCode::CommandFailed, "No such file or directory"),
        }
    }

    async fn mkd_cmd(&mut self, path: &str) -> Reply {
        let target = self.resolve(path);
        match self.fs.create_dir(&target).await {
            Ok(()) => Reply::new(ReplyCode::PathCreated, format!("\"{}\" created", sandbox::to_virtual(&target, &self.root))),
            Err(e) if e.kind() == FsErrorKind::AlreadyExists => Reply::new(ReplyCode::ActionNotTaken, "Can't create existing directory"),
            Err(e) if e.kind() == FsErrorKind::NotFound => Reply::new(ReplyCode::ActionNotTaken, "No such file or directory"),
            Err(_) => Reply::new(ReplyCode::ActionNotTaken, "Failed to create directory"),
        }
    }

    async fn rmd_cmd(&mut self, path: &str) -> Reply {
        let target = self.resolve(path);
        match self.fs.remove_dir_all(&target).await {
            Ok(()) => Reply::new(ReplyCode::FileActionOkay, format!("Deleted {path}")),
            Err(e) if e.kind() == FsErrorKind::NotADirectory => Reply::new(ReplyCode::ActionNotTaken, "Not a directory"),
            Err(e) if e.kind() == FsErrorKind::NotFound => Reply::new(ReplyCode::ActionNotTaken, "No such file or directory"),
            Err(_) => Reply::new(ReplyCode::ActionNotTaken, "Failed to delete directory"),
        }
    }

    async fn dele_cmd(&mut self, path: &str) -> Reply {
        let target = self.resolve(path);
        match self.fs.remove_file(&target).await {
            Ok(()) => Reply::new(ReplyCode::FileActionOkay, format!("Deleted {path}")),
            Err(e) if e.kind() == FsErrorKind::NotAFile => Reply::new(ReplyCode::ActionNotTaken, "Can only delete regular files"),
            Err(e) if e.kind() == FsErrorKind::NotFound => Reply::new(ReplyCode::ActionNotTaken, "No such file or directory"),
            Err(_) => Reply::new(ReplyCode::ActionNotTaken, "Failed to delete file"),
        }
    }

    /// Runs the shared data-transferring protocol (§4.4): accept the
    /// pending passive connection, send `150` on `writer`, stream bytes,
    /// close the data channel, then return the final `226`/error reply.
    async fn data_cmd(&mut self, writer: &mut tokio::net::tcp::OwnedWriteHalf, path: Option<String>, kind: DataTransfer) -> Reply {
        // RETR on a directory is refused before any data connection is
        // touched: no 150, no accept.
        if kind == DataTransfer::Retr {
            let target = self.resolve(path.as_deref().unwrap_or(""));
            if let Err(e) = self.require_regular_file(&target).await {
                return e;
            }
        }

        let Some(pending) = self.pasv.take() else {
            return Reply::new(ReplyCode::CommandFailed, "Please issue PASV first");
        };

        let mut data_stream = match pending.accept().await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("failed to accept data connection: {e}");
                return Reply::new(ReplyCode::CommandFailed, "Could not accept data connection");
            }
        };

        if let Err(e) = Session::send(writer, &Reply::new(ReplyCode::FileStatusOkay, "Accepted data connection")).await {
            tracing::warn!("failed to send preliminary reply: {e}");
            return Reply::new(ReplyCode::CommandFailed, "Control channel error");
        }

        let dir_path = path.as_deref();
        let outcome = self.transfer(kind, dir_path, &mut data_stream).await;
        drop(data_stream);

        match outcome {
            Ok(()) => Reply::new(
                ReplyCode::ClosingDataConnection,
                match kind {
                    DataTransfer::Retr | DataTransfer::Stor => "File successfully transferred",
                    DataTransfer::List | DataTransfer::Nlst => "Closing data connection",
                },
            ),
            Err(reply) => reply,
        }
    }

    async fn require_regular_file(&self, target: &std::path::Path) -> Result<(), Reply> {
        match self.fs.stat(target).await {
            Ok(meta) if meta.is_file => Ok(()),
            Ok(_) => Err(Reply::new(ReplyCode::ActionNotTaken, "Can only retrieve regular files")),
            Err(_) => Err(Reply::new(ReplyCode::ActionNotTaken, "No such file or directory")),
        }
    }

    async fn transfer(&mut self, kind: DataTransfer, path: Option<&str>, data_stream: &mut TcpStream) -> Result<(), Reply> {
        let target = self.resolve(path.unwrap_or(""));
        match kind {
            DataTransfer::List | DataTransfer::Nlst => {
                let entries = self.fs.list(&target).await.map_err(|_| Reply::new(ReplyCode::ActionNotTaken, "No such file or directory"))?;
                let payload = match kind {
                    DataTransfer::List => crate::listing::format_list(&entries),
                    DataTransfer::Nlst => crate::listing::format_nlst(&entries),
                    _ => unreachable!(),
                };
                data_stream
                    .write_all(payload.as_bytes())
                    .await
                    .map_err(|_| Reply::new(ReplyCode::TransientFileError, "Connection closed, transfer aborted"))
            }
            DataTransfer::Retr => {
                let mut file = self.fs.open_read(&target).await.map_err(|_| Reply::new(ReplyCode::ActionNotTaken, "No such file or directory"))?;
                tokio::io::copy(&mut file, data_stream)
                    .await
                    .map(|_| ())
                    .map_err(|_| Reply::new(ReplyCode::TransientFileError, "Connection closed, transfer aborted"))
            }
            DataTransfer::Stor => self
                .fs
                .write_all_from(&target, data_stream)
                .await
                .map(|_| ())
                .map_err(|_| Reply::new(ReplyCode::TransientFileError, "Failed to write file")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataTransfer {
    List,
    Nlst,
    Retr,
    Stor,
}
