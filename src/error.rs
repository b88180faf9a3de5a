use std::fmt;

/// Errors raised while transcoding a fast-export stream or driving git.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// The stream violates fast-export framing (e.g. `gpgsig` without `data`).
    Protocol(String),
    /// The stream ended before a record or block was complete.
    Truncated {
        context: &'static str,
        offset: u64,
    },
    Git(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            Error::Truncated { context, offset } => {
                write!(f, "Stream truncated at byte {} while reading {}", offset, context)
            }
            Error::Git(msg) => write!(f, "Git error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
