use thiserror::Error;

/// Failures of the remote document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("remote store is not configured")]
    Unavailable,
    #[error("remote store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed remote document: {0}")]
    Decode(String),
}

/// Failures reported by the messaging platform adapter.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("authentication required: {0}")]
    AuthenticationRequired(String),
    #[error("platform connection failed: {0}")]
    Connection(String),
    #[error("platform request failed: {0}")]
    Request(String),
    #[error("event stream already taken")]
    AlreadySubscribed,
}

/// Error taxonomy of the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Fatal: the process needs a human to finish logging in.
    #[error("authentication required: {0}")]
    AuthenticationRequired(String),
    #[error("config load failed: {0}")]
    ConfigLoad(String),
    #[error("chat discovery failed: {0}")]
    Discovery(String),
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("platform error: {0}")]
    Platform(String),
    #[error("chat ids {first} and {second} share the representation {shared}")]
    ConfigurationAmbiguity {
        first: String,
        second: String,
        shared: String,
    },
}

impl From<PlatformError> for IngestError {
    fn from(e: PlatformError) -> Self {
        match e {
            PlatformError::AuthenticationRequired(why) => Self::AuthenticationRequired(why),
            other => Self::Platform(other.to_string()),
        }
    }
}
