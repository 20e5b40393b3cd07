use std::error::Error;
use std::fmt;

use crate::constants::ERROR_INVALID_LOGIN;

#[derive(Debug)]
pub enum RustySessionsError {
    // Credential errors
    InvalidCredentials,

    // Token errors
    TokenMalformed(String),
    TokenInvalid(String),
    AlgorithmRejected(String),

    // Session errors
    NotFound(String),
    Forbidden,

    // Storage errors
    StorageError(String),

    // Hashing errors
    HashingError(String),

    // Request errors
    ValidationError(String),
    Timeout(String),

    // System errors
    SystemError(String),

    // Configuration errors
    ConfigError(String),
}

impl RustySessionsError {
    /// True for every failure the HTTP layer surfaces as "unauthorized".
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::TokenMalformed(_) | Self::TokenInvalid(_) | Self::AlgorithmRejected(_)
        )
    }
}

impl fmt::Display for RustySessionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "{}", ERROR_INVALID_LOGIN),
            Self::TokenMalformed(msg) => write!(f, "Malformed token: {}", msg),
            Self::TokenInvalid(msg) => write!(f, "Invalid token: {}", msg),
            Self::AlgorithmRejected(alg) => write!(f, "Token algorithm not accepted: {}", alg),
            Self::NotFound(what) => write!(f, "Not found: {}", what),
            Self::Forbidden => write!(f, "Forbidden: session belongs to another user"),
            Self::StorageError(msg) => write!(f, "Storage error: {}", msg),
            Self::HashingError(msg) => write!(f, "Hashing error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::Timeout(op) => write!(f, "Timed out: {}", op),
            Self::SystemError(msg) => write!(f, "System error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for RustySessionsError {}

impl From<std::io::Error> for RustySessionsError {
    fn from(err: std::io::Error) -> Self {
        RustySessionsError::SystemError(format!("I/O failure: {}", err))
    }
}

impl From<serde_json::Error> for RustySessionsError {
    fn from(err: serde_json::Error) -> Self {
        RustySessionsError::ValidationError(format!("JSON error: {}", err))
    }
}

impl From<tokio::task::JoinError> for RustySessionsError {
    fn from(err: tokio::task::JoinError) -> Self {
        RustySessionsError::SystemError(format!("Background task failed: {}", err))
    }
}

// Generic result type for RustySessions
pub type Result<T> = std::result::Result<T, RustySessionsError>;
