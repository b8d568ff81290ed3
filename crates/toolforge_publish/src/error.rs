//! Publishing errors.

use std::path::PathBuf;
use toolforge_core::CoreError;

/// Result alias for registry and install operations
pub type PublishResult<T> = Result<T, PublishError>;

/// Registry or install failure
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Transport or decoding failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The registry answered with a non-success status
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        /// HTTP method
        method: &'static str,
        /// Request URL
        url: String,
        /// Status code
        status: u16,
        /// Response body, trimmed
        body: String,
    },

    /// A response lacked a field we need
    #[error("registry response has no {0}")]
    MissingField(&'static str),

    /// Archive or log file problem
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The install client exited non-zero
    #[error("install client exited with {code:?}")]
    Install {
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
    },
}

impl PublishError {
    /// Short name of the failing operation
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Http(_) | Self::Status { .. } | Self::MissingField(_) => "toolshed",
            Self::Io { .. } => "archive",
            Self::Install { .. } => "install",
        }
    }
}

impl From<PublishError> for CoreError {
    fn from(err: PublishError) -> Self {
        CoreError::Publish {
            operation: err.operation().to_string(),
            reason: err.to_string(),
        }
    }
}
