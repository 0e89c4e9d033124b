//! Error types for keeper-remote.

use thiserror::Error;

/// A failed remote request: transport failure, timeout, non-success status
/// or an undecodable response body.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Connection refused, DNS failure, TLS failure or timeout.
    #[error("network request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The body could not be read or decoded as expected.
    #[error("malformed response from {url}: {message}")]
    Malformed { url: String, message: String },
}

impl RemoteError {
    pub fn url(&self) -> &str {
        match self {
            RemoteError::Transport { url, .. }
            | RemoteError::Status { url, .. }
            | RemoteError::Malformed { url, .. } => url,
        }
    }
}

pub(crate) fn from_ureq(url: &str, err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(status, _) => RemoteError::Status {
            url: url.to_owned(),
            status,
        },
        ureq::Error::Transport(transport) => RemoteError::Transport {
            url: url.to_owned(),
            message: transport.to_string(),
        },
    }
}

pub(crate) fn malformed(url: &str, message: impl ToString) -> RemoteError {
    RemoteError::Malformed {
        url: url.to_owned(),
        message: message.to_string(),
    }
}
