//! Error types for `tracegen-javagen`.

use thiserror::Error;

/// Result type alias for Java generation operations.
pub type Result<T> = std::result::Result<T, JavaGenError>;

/// Errors that can occur while building or rendering Java source.
#[derive(Debug, Error)]
pub enum JavaGenError {
    /// Invalid identifier name (reserved word, invalid characters, etc.)
    #[error("Invalid identifier '{name}': {reason}")]
    InvalidIdentifier {
        /// The invalid identifier
        name: String,
        /// Why it's invalid
        reason: String,
    },

    /// Invalid type reference (`java.util.List<String>`, `int[]`, ...)
    #[error("Invalid type '{name}': {reason}")]
    InvalidType {
        /// The rejected type text
        name: String,
        /// Why it's invalid
        reason: String,
    },

    /// Structural problem in the compilation unit
    #[error("Code generation failed: {0}")]
    GenerationError(String),

    /// Manifest verification failed (file was manually modified)
    #[error("Manifest verification failed for '{path}': {reason}")]
    ManifestError {
        /// Path to the file
        path: String,
        /// Why verification failed
        reason: String,
    },

    /// Hash mismatch (generated file was modified)
    #[error("Hash mismatch for '{path}': expected {expected}, got {actual}")]
    HashMismatch {
        /// Path to the file
        path: String,
        /// Expected hash
        expected: String,
        /// Actual hash
        actual: String,
    },

    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl JavaGenError {
    pub(crate) fn identifier(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_type(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidType {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
