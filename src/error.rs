use thiserror::Error;

/// Errors raised while setting up a generator (config, auth, http client).
///
/// Generation itself never returns this type; provider-side problems are folded
/// into [`crate::GenerationResult::Failure`].
#[derive(Debug, Error)]
pub enum CoverError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("failed to run auth command: {0}")]
    AuthCommand(String),
    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse toml: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CoverError>;
