//! Result and error types for tracegen.

use thiserror::Error;

/// Result type for tracegen operations
pub type TracegenResult<T> = Result<T, TracegenError>;

/// Errors that can occur while planning, analyzing or generating
#[derive(Debug, Error)]
pub enum TracegenError {
    /// Invalid run configuration or generation context
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Primary artifact missing or unreadable, capture record undecodable,
    /// or the instrumented run failed
    #[error("Capture failed: {message}")]
    Capture {
        /// Error message
        message: String,
    },

    /// Instrumented run exceeded its timeout; partial captures were discarded
    #[error("Capture timed out after {ms}ms")]
    CaptureTimeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Capture data does not match the identifier mapping
    #[error("Trace integrity violation: {message}")]
    TraceIntegrity {
        /// Error message
        message: String,
    },

    /// Persisted artifact has the wrong kind, version or checksum
    #[error("Artifact format error in {path}: {message}")]
    ArtifactFormat {
        /// Artifact path
        path: String,
        /// Error message
        message: String,
    },

    /// Java source construction failed
    #[error("Java generation failed: {0}")]
    JavaGen(#[from] tracegen_javagen::JavaGenError),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Binary encoding error
    #[error("Binary encoding error: {0}")]
    Bincode(#[from] bincode::Error),
}

impl TracegenError {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a capture error
    #[must_use]
    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture {
            message: message.into(),
        }
    }

    /// Create a trace integrity error
    #[must_use]
    pub fn trace_integrity(message: impl Into<String>) -> Self {
        Self::TraceIntegrity {
            message: message.into(),
        }
    }

    /// Create an artifact format error
    #[must_use]
    pub fn artifact_format(path: &std::path::Path, message: impl Into<String>) -> Self {
        Self::ArtifactFormat {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    /// Capture failures can be retried by re-running instrumentation.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Capture { .. } | Self::CaptureTimeout { .. })
    }

    /// Short category name used in logs and CLI output.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::Capture { .. } | Self::CaptureTimeout { .. } => "capture",
            Self::TraceIntegrity { .. } => "trace-integrity",
            Self::ArtifactFormat { .. } => "artifact-format",
            Self::JavaGen(_) => "emission",
            Self::Io(_) | Self::Json(_) | Self::Yaml(_) | Self::Bincode(_) => "io",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error() {
        let err = TracegenError::configuration("negative slot -1");
        assert_eq!(err.to_string(), "Configuration error: negative slot -1");
        assert!(!err.is_recoverable());
        assert_eq!(err.category(), "configuration");
    }

    #[test]
    fn test_capture_errors_are_recoverable() {
        assert!(TracegenError::capture("missing artifact").is_recoverable());
        let timeout = TracegenError::CaptureTimeout { ms: 1500 };
        assert!(timeout.is_recoverable());
        assert_eq!(timeout.to_string(), "Capture timed out after 1500ms");
    }

    #[test]
    fn test_trace_integrity_is_fatal() {
        let err = TracegenError::trace_integrity("id 7 unresolved");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("id 7 unresolved"));
    }

    #[test]
    fn test_artifact_format_mentions_path() {
        let err = TracegenError::artifact_format(std::path::Path::new("out/trace.json"), "bad");
        assert!(err.to_string().contains("out/trace.json"));
        assert_eq!(err.category(), "artifact-format");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TracegenError = io.into();
        assert_eq!(err.category(), "io");
    }
}
