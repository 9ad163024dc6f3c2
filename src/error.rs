use thiserror::Error;

/// Internal application errors surfaced during request handling.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("authorization error: {0}")]
    Auth(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("dynamodb error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short classification string used for logging.
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Auth(_) => "auth",
            AppError::NotFound(_) => "not_found",
            AppError::Store(_) => "dynamodb",
            AppError::Internal(_) => "internal",
        }
    }
}
