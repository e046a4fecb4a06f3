//! Crate-level error type
//!
//! Per-packet routing failures are reported as `RouteError` and never stop
//! the server, so only socket errors surface here.

/// Result alias for server operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error
#[derive(Debug)]
pub enum Error {
    /// Socket error
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
