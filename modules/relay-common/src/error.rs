use thiserror::Error;

/// Configuration problems are fatal before any candidate is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),

    #[error("{var} must be {expected}, got {value:?}")]
    InvalidVar {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("no channels configured")]
    NoChannels,
}
