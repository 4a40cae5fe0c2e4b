//! Error taxonomy for client operations.
//!
//! Every backend-facing operation returns [`ClientError`]. The CLI wraps
//! these in `anyhow` with context; the QA session converts them into
//! fallback bot turns instead of returning them.

/// Errors produced by the client core.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The document cannot be addressed on the backend.
    #[error("missing document identifier: {0}")]
    MissingIdentifier(String),

    /// The upload request or the direct transfer was rejected.
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// Transport failure talking to the backend.
    #[error("request failed: {0}")]
    FetchFailed(String),

    /// The backend answered with an unexpected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The credential is absent or fails issuer/audience/expiry checks.
    #[error("not signed in: {0}")]
    AuthInvalid(String),

    /// Summary polling gave up after the configured number of attempts.
    #[error("summary not ready after {attempts} attempts")]
    Timeout { attempts: u32 },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::FetchFailed(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
