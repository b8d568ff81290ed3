//! Core error types for toolforge.

use std::path::PathBuf;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
///
/// Model errors (`MalformedParameter`, `TooManyParameters`,
/// `UnsupportedParameterType`) are raised before any subprocess is spawned.
/// Execution and validation failures are recorded in the run report and only
/// surface as errors when the caller asks for it.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A declaration carries a bad ordinal, value or directive
    #[error("Malformed parameter {name}: {reason}")]
    MalformedParameter {
        /// Offending parameter
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// Cardinality violation under the no-parameter convention
    #[error("Too many {kind} parameters: {count} supplied, at most {limit} allowed")]
    TooManyParameters {
        /// Parameter kind ("input", "output", ...)
        kind: String,
        /// Number supplied
        count: usize,
        /// Number permitted
        limit: usize,
    },

    /// Value type outside the recognized set
    #[error("Unsupported parameter type {type_name:?} for {name}")]
    UnsupportedParameterType {
        /// Offending parameter
        name: String,
        /// Type tag as supplied
        type_name: String,
    },

    /// Direct run exited non-zero
    #[error("Execution failed with exit code {code:?}: {command}")]
    ExecutionFailed {
        /// Command line that was run
        command: String,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
    },

    /// External harness exited non-zero
    #[error("Validation failed with exit code {code:?}; see {report}")]
    ValidationFailed {
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
        /// Path of the harness report
        report: String,
    },

    /// Expected file missing while assembling the archive
    #[error("Packaging error at {path}: {reason}")]
    Packaging {
        /// Path involved
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Registry or install call failed
    #[error("Publish error during {operation}: {reason}")]
    Publish {
        /// Operation that failed
        operation: String,
        /// What went wrong
        reason: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfig {
        /// Offending field
        field: String,
        /// What was wrong with it
        reason: String,
    },

    /// Filesystem error
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    /// Create a malformed parameter error
    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a packaging error for path
    pub fn packaging(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Packaging {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a caller contract violation detected before
    /// anything was executed
    #[must_use]
    pub fn is_model_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedParameter { .. }
                | Self::TooManyParameters { .. }
                | Self::UnsupportedParameterType { .. }
        )
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig {
            field: "json".to_string(),
            reason: err.to_string(),
        }
    }
}
