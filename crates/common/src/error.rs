use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Exchange API error: {0}")]
    Exchange(String),

    #[error("Completion API error: {0}")]
    Completion(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("No candles returned")]
    NoCandles,

    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Display form with every non-ASCII byte removed, safe for log lines.
    pub fn sanitized(&self) -> String {
        crate::sanitize_ascii(&self.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
