//! Command-line configuration.
//!
//! The teacher is a library with no binary of its own, so consumers wire up
//! their own CLI; this crate ships one, following the `clap` derive
//! convention used throughout the rest of the example pack.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// A concurrent, sandboxed FTP server for a single virtual root, passive
/// mode only.
#[derive(Debug, Parser)]
#[command(name = "sandbox-ftpd", version, about)]
pub struct Config {
    /// Address to bind the control channel listener to.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Directory to serve as the virtual root. If omitted, a fresh temporary
    /// directory is created and seeded, then removed on shutdown.
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Tracing filter directive, e.g. `info`, `sandbox_ftpd=debug`.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
