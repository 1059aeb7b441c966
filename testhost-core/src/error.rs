// Error types for the request double

use thiserror::Error;

/// Message carried by content-mismatch failures.
pub const NOT_MULTIPART_MESSAGE: &str = "The request content is not multipart encoded";

#[derive(Error, Debug)]
pub enum Error {
    /// A header was appended after the header set had been read.
    #[error("Headers were already acquired for this request (appending {name})")]
    HeadersFrozen { name: String },

    /// The `Host` header carries a port segment that is not a number.
    #[error("Invalid port in Host header: {0}")]
    InvalidHostPort(String),

    /// Multipart data was requested from a request that is not multipart.
    #[error("IO error: {}", NOT_MULTIPART_MESSAGE)]
    NotMultipart,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Misuse of the double by the test itself. These should fail the test.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Error::HeadersFrozen { .. } | Error::InvalidHostPort(_))
    }

    /// The caller asked for the wrong content mode.
    pub fn is_content_mismatch(&self) -> bool {
        matches!(self, Error::NotMultipart)
    }

    /// Check if this is an I/O-class error
    pub fn is_io(&self) -> bool {
        matches!(self, Error::NotMultipart | Error::Io(_))
    }
}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Io(e) => e,
            Error::NotMultipart => {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, NOT_MULTIPART_MESSAGE)
            }
            other => std::io::Error::other(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
