//! Error types for Strongbox core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages and exit codes.

use thiserror::Error;

/// Result type alias for Strongbox operations.
pub type Result<T> = std::result::Result<T, StrongboxError>;

/// Core error type for Strongbox operations.
#[derive(Debug, Error)]
pub enum StrongboxError {
    /// The header names an algorithm this build does not implement.
    #[error("Unsupported encryption algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Header text does not parse.
    #[error("Malformed store header: {0}")]
    MalformedHeader(String),

    /// Authentication tag verification failed on some field.
    ///
    /// Deliberately carries no detail: a wrong password and a damaged
    /// ciphertext look identical to an authenticated cipher.
    #[error("Wrong password or corrupt data")]
    WrongPasswordOrCorruptData,

    /// A field decrypted correctly but its bytes are not a valid value.
    #[error("Corrupt plaintext in {field}: {reason}")]
    CorruptPlaintext { field: String, reason: String },

    /// Image format outside the supported set.
    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    /// Bytes are not an RFC 3339 timestamp.
    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    /// Bytes are not a decimal number.
    #[error("Malformed number: {0}")]
    MalformedNumber(String),

    /// Bytes are not valid UTF-8 text.
    #[error("Malformed text: {0}")]
    MalformedText(String),

    /// Key derivation or cipher setup failure
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl StrongboxError {
    /// Wrap a codec-level failure found after successful decryption.
    pub(crate) fn corrupt(field: &str, source: StrongboxError) -> Self {
        match source {
            StrongboxError::MalformedTimestamp(reason)
            | StrongboxError::MalformedNumber(reason)
            | StrongboxError::MalformedText(reason)
            | StrongboxError::UnsupportedImageFormat(reason)
            | StrongboxError::InvalidInput(reason) => StrongboxError::CorruptPlaintext {
                field: field.to_string(),
                reason,
            },
            other => other,
        }
    }

    /// True when retrying with another password could succeed.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, StrongboxError::WrongPasswordOrCorruptData)
    }

    /// True when the store cannot be opened regardless of password.
    pub fn is_damaged_or_unsupported(&self) -> bool {
        matches!(
            self,
            StrongboxError::UnsupportedAlgorithm(_)
                | StrongboxError::MalformedHeader(_)
                | StrongboxError::CorruptPlaintext { .. }
        )
    }
}

impl From<std::io::Error> for StrongboxError {
    fn from(err: std::io::Error) -> Self {
        StrongboxError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for StrongboxError {
    fn from(err: serde_json::Error) -> Self {
        StrongboxError::Storage(format!("JSON error: {}", err))
    }
}

impl From<rusqlite::Error> for StrongboxError {
    fn from(err: rusqlite::Error) -> Self {
        StrongboxError::Storage(format!("SQLite error: {}", err))
    }
}
