//! Parses one control-channel line into a [`Command`].

use thiserror::Error;

/// A parsed client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    User(String),
    Pass(String),
    Syst,
    Feat,
    Type(String),
    Pwd,
    Cwd(String),
    Pasv,
    Epsv,
    List(Option<String>),
    Nlst(Option<String>),
    Size(String),
    Retr(String),
    Stor(String),
    Mkd(String),
    Rmd(String),
    Dele(String),
    Quit,
    /// A syntactically well-formed but unsupported/unrecognized verb.
    Unknown(String),
}

/// Why a line failed to parse into a well-formed [`Command`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The line was empty after trimming line endings.
    #[error("empty command line")]
    Empty,
    /// The verb requires an argument that was not supplied.
    #[error("'{0}' requires an argument")]
    MissingArgument(String),
}

/// Parses one line of client input (trailing `\r`/`\n` tolerated) into a
/// [`Command`].
///
/// Splits on the *first* space only: everything after the verb, including
/// further spaces, is the argument. This is applied consistently across all
/// verbs (see the design notes on the source's inconsistent splitting).
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let line = line.trim_start();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let (verb, rest) = match line.split_once(' ') {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let verb = verb.to_ascii_uppercase();

    let require_arg = |rest: &str| -> Result<String, ParseError> {
        if rest.is_empty() {
            Err(ParseError::MissingArgument(verb.clone()))
        } else {
            Ok(rest.to_string())
        }
    };

    let optional_arg = |rest: &str| -> Option<String> {
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    };

    Ok(match verb.as_str() {
        "USER" => Command::User(require_arg(rest)?),
        "PASS" => Command::Pass(rest.to_string()),
        "SYST" => Command::Syst,
        "FEAT" => Command::Feat,
        "TYPE" => Command::Type(require_arg(rest)?),
        "PWD" | "XPWD" => Command::Pwd,
        "CWD" | "XCWD" => Command::Cwd(require_arg(rest)?),
        "CDUP" | "XCUP" => Command::Cwd("..".to_string()),
        "PASV" => Command::Pasv,
        "EPSV" => Command::Epsv,
        "LIST" => Command::List(optional_arg(rest)),
        "NLST" => Command::Nlst(optional_arg(rest)),
        "SIZE" => Command::Size(require_arg(rest)?),
        "RETR" => Command::Retr(require_arg(rest)?),
        "STOR" => Command::Stor(require_arg(rest)?),
        "MKD" | "XMKD" => Command::Mkd(require_arg(rest)?),
        "RMD" | "XRMD" => Command::Rmd(require_arg(rest)?),
        "DELE" => Command::Dele(require_arg(rest)?),
        "QUIT" => Command::Quit,
        _ => Command::Unknown(verb),
    })
}
