use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
///
/// The visible-nodes core never fails; these cover the loading, search-input
/// and terminal boundaries around it.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A regex search pattern that failed to compile.
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A JSON tree listing that could not be decoded.
    #[error("Invalid tree listing: {0}")]
    TreeFormat(#[from] serde_json::Error),
}
