use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum HmsError {
    // Storage errors
    StorageError(String),
    SerializationError(String),

    // Auth errors
    AuthError(String),

    // Validation errors
    ValidationError(String),

    // Configuration errors
    ConfigError(String),
}

impl fmt::Display for HmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StorageError(msg) => write!(f, "Storage error: {}", msg),
            Self::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Self::AuthError(msg) => write!(f, "Authentication error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for HmsError {}

impl From<serde_json::Error> for HmsError {
    fn from(err: serde_json::Error) -> Self {
        HmsError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for HmsError {
    fn from(err: std::io::Error) -> Self {
        HmsError::StorageError(err.to_string())
    }
}

// Generic result type for the access core
pub type Result<T> = std::result::Result<T, HmsError>;
