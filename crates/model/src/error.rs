use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The credential was rejected by the provider.
    Unauthorized,
    /// The content is moderated.
    Moderated,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The provider could not be reached, or answered with an error status.
    Transport,
    /// The provider answered, but the payload could not be understood.
    InvalidResponse,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Moderated => "moderated",
            ErrorKind::RateLimitExceeded => "rate limit exceeded",
            ErrorKind::Transport => "transport error",
            ErrorKind::InvalidResponse => "invalid response",
            ErrorKind::Other => "other error",
        };
        f.write_str(s)
    }
}

impl ErrorKind {
    /// Maps an HTTP status code of a failed call to an error kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorKind::Unauthorized,
            429 => ErrorKind::RateLimitExceeded,
            _ => ErrorKind::Transport,
        }
    }
}
