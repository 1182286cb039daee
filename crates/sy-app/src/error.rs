use thiserror::Error;

/// Failure taxonomy for the client core.
///
/// `Sync` is special: the bridge logs it and moves on instead of propagating,
/// because local history stays authoritative when the remote copy lags.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("failed to reach server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generation failed: {0}")]
    ServerReported(String),

    #[error("malformed result archive: {0}")]
    MalformedResult(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("history sync failed: {0}")]
    Sync(String),

    #[error("history entry not found: {0}")]
    NotFound(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<surrealdb::Error> for AppError {
    fn from(err: surrealdb::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
