//! A concurrent, sandboxed FTP server for a single virtual root.
//!
//! Authentication is a stateless formality (any `USER`/`PASS` is accepted),
//! only passive-mode data transfers are supported, and every path a client
//! supplies is confined to a configured virtual root before it ever reaches
//! the filesystem. See `command`, `session`, and `sandbox` for the protocol
//! dispatch loop, connection state, and path confinement respectively.

pub mod command;
pub mod config;
pub mod error;
pub mod fs;
pub mod listing;
pub mod pasv;
pub mod reply;
pub mod sandbox;
pub mod server;
pub mod session;
