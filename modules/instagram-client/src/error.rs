use thiserror::Error;

pub type Result<T> = std::result::Result<T, InstagramError>;

#[derive(Debug, Error)]
pub enum InstagramError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Media read error: {0}")]
    Io(String),
}

impl InstagramError {
    /// True when the session is no longer usable and further publishes
    /// must stop.
    pub fn is_auth(&self) -> bool {
        match self {
            InstagramError::Auth(_) => true,
            InstagramError::Api { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for InstagramError {
    fn from(err: reqwest::Error) -> Self {
        InstagramError::Network(err.to_string())
    }
}

impl From<std::io::Error> for InstagramError {
    fn from(err: std::io::Error) -> Self {
        InstagramError::Io(err.to_string())
    }
}
