use thiserror::Error;

pub type Result<T> = std::result::Result<T, InsightsError>;

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Authentication rejected ({status}): check that the PAT is valid and has code read scope")]
    Unauthorized { status: u16 },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Timed out after {0}")]
    Timeout(String),
}

impl InsightsError {
    pub fn timeout(duration: std::time::Duration) -> Self {
        InsightsError::Timeout(humantime::format_duration(duration).to_string())
    }
}
