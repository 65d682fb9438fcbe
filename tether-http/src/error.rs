//! Request failures.

use std::io;
use thiserror::Error;

/// Why a request produced no response.
///
/// A response with a 4xx or 5xx status is not an error.
#[derive(Debug, Error)]
pub enum Error {
    /// The URL could not be parsed.
    #[error("invalid url `{0}`")]
    InvalidUrl(String),
    /// The URL names a scheme other than `http`.
    #[error("unsupported scheme `{0}`")]
    UnsupportedScheme(String),
    /// Connecting, writing or reading failed.
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),
    /// The server sent something that is not an HTTP/1.x response.
    #[error("malformed response: {0}")]
    Malformed(&'static str),
}

impl Error {
    /// Returns true when the server was reached but answered badly.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failure() {
        assert_eq!(Error::InvalidUrl("::".into()).to_string(), "invalid url `::`");
        assert_eq!(
            Error::UnsupportedScheme("https".into()).to_string(),
            "unsupported scheme `https`"
        );
        let io = Error::from(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert!(io.to_string().starts_with("i/o failure"));
        assert!(Error::Malformed("status line").is_malformed());
    }
}
