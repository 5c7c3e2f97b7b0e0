use thiserror::Error;

/// Media retrieval/normalization failures. Non-fatal to the run, fatal to
/// the candidate being prepared.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Media decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

/// Publish failures, classified by what they mean for the rest of the run.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The session is no longer usable. Fatal to the run.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rejected by platform: {0}")]
    RejectedByPlatform(String),

    #[error("Publish failed: {0}")]
    Unknown(String),
}

impl PublishError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, PublishError::Authentication(_))
    }
}

/// Run-fatal failures, surfaced beside the final statistics.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] relay_common::ConfigError),

    #[error("Publisher authentication failed: {0}")]
    Authentication(String),
}
