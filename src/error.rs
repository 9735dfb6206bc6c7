use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
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

    /// Rejected user input (empty name, unchanged name, path separators).
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Remote package repository errors.
    #[error("Remote error: {0}")]
    Remote(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Remote(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("file not found"));
    }

    #[test]
    fn invalid_name_error_display() {
        let err = AppError::InvalidName("name is empty".into());
        assert_eq!(err.to_string(), "Invalid name: name is empty");
    }

    #[test]
    fn remote_error_display() {
        let err = AppError::Remote("connection refused".into());
        assert_eq!(err.to_string(), "Remote error: connection refused");
    }
}
