use std::fmt::{self, Display};

/// The kind of error that occurred.
///
/// Callers of a provider are not expected to branch on it. It exists so
/// that diagnostics can tell a dead network apart from a bad payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request never got a response (DNS, connect, TLS, I/O).
    Transport,
    /// The service answered with a non-success status code.
    Status,
    /// The response body could not be understood.
    MalformedBody,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "transport error"),
            ErrorKind::Status => write!(f, "unsuccessful status"),
            ErrorKind::MalformedBody => write!(f, "malformed body"),
            ErrorKind::Other => write!(f, "other error"),
        }
    }
}
