use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Implement From traits for common error types to simplify conversion

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::FileSystem(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Parse(format!("Serialization error: {}", e))
    }
}

impl From<String> for AppError {
    fn from(e: String) -> Self {
        AppError::Internal(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_tagged_message() {
        let err = AppError::Download("already in progress".to_string());
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["type"], "Download");
        assert_eq!(json["message"], "already in progress");
    }

    #[test]
    fn test_io_error_maps_to_file_system() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AppError = io.into();

        assert!(matches!(err, AppError::FileSystem(_)));
        assert_eq!(err.to_string(), "File system error: missing");
    }
}
