/// Error type returned by this crate.
///
/// Client construction never fails; every variant here is produced while
/// executing a request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// Request body could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),
    /// Base URL could not be parsed or extended with path segments.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Returns the HTTP status code for [`Error::Http`] errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
