//! FTP control-channel replies: numeric codes and their wire format.

use std::fmt;

/// Canonical FTP reply codes used by this server.
///
/// Not an exhaustive RFC 959 table — only the codes this server's handlers
/// actually emit, per the wire reply table in the specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ReplyCode {
    /// 150 - Accepted data connection, about to start a transfer.
    FileStatusOkay = 150,
    /// 200 - Command okay (TYPE).
    CommandOkay = 200,
    /// 211 - System status, or system help reply (FEAT).
    SystemStatus = 211,
    /// 213 - File status (SIZE).
    FileStatus = 213,
    /// 215 - System type (SYST).
    SystemType = 215,
    /// 220 - Service ready for new user.
    ServiceReady = 220,
    /// 221 - Service closing control connection (QUIT).
    ClosingControlConnection = 221,
    /// 226 - Closing data connection, requested action successful.
    ClosingDataConnection = 226,
    /// 227 - Entering passive mode.
    EnteringPassiveMode = 227,
    /// 230 - User logged in, proceed.
    UserLoggedIn = 230,
    /// 250 - Requested file action okay, completed.
    FileActionOkay = 250,
    /// 257 - Pathname created, or current directory.
    PathCreated = 257,
    /// 331 - User name okay, need password.
    NeedPassword = 331,
    /// 450 - Requested file action not taken (transient).
    TransientFileError = 450,
    /// 500 - Syntax error / command failed.
    CommandFailed = 500,
    /// 502 - Command not implemented.
    CommandNotImplemented = 502,
    /// 550 - Requested action not taken (permanent).
    ActionNotTaken = 550,
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u32)
    }
}

/// A reply to be written to the control channel.
#[derive(Debug, Clone)]
pub struct Reply {
    code: ReplyCode,
    text: String,
}

impl Reply {
    /// Creates a new reply from a code and a message.
    pub fn new(code: ReplyCode, text: impl Into<String>) -> Self {
        Reply { code, text: text.into() }
    }

    /// The reply's numeric code.
    pub fn code(&self) -> ReplyCode {
        self.code
    }

    /// Serializes the reply per the wire grammar: `"<code> <text>\r\n"`.
    pub fn to_wire(&self) -> String {
        format!("{} {}\r\n", self.code, self.text)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.text)
    }
}
