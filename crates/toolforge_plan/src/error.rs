//! Descriptor builder errors.

use thiserror::Error;
use toolforge_core::CoreError;

/// Error raised while building, writing or reading a descriptor
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// Requirement entry that is not `package[:version]`
    #[error("malformed requirement {entry:?}: {reason}")]
    MalformedRequirement {
        /// Offending entry
        entry: String,
        /// Why it was rejected
        reason: String,
    },

    /// Output test directive that cannot be parsed
    #[error("malformed test directive {directive:?} on output {output}")]
    MalformedDirective {
        /// Output name
        output: String,
        /// Raw directive
        directive: String,
    },

    /// XML writer failure
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O failure while writing XML
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Descriptor text that cannot be read back
    #[error("cannot parse descriptor: {0}")]
    Parse(String),

    /// Error from an earlier stage
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<DescriptorError> for CoreError {
    fn from(err: DescriptorError) -> Self {
        match err {
            DescriptorError::MalformedRequirement { entry, reason } => CoreError::MalformedParameter {
                name: format!("packages ({})", entry),
                reason,
            },
            DescriptorError::MalformedDirective { output, directive } => {
                CoreError::MalformedParameter {
                    name: output,
                    reason: format!("test directive {:?} is malformed", directive),
                }
            }
            DescriptorError::Core(e) => e,
            other => CoreError::InvalidConfig {
                field: "descriptor".to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Result alias for descriptor operations
pub type DescriptorResult<T> = Result<T, DescriptorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_error_names_output() {
        let err: CoreError = DescriptorError::MalformedDirective {
            output: "result".to_string(),
            directive: "diff:x".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::MalformedParameter { ref name, .. } if name == "result"));
        assert!(err.is_model_error());
    }

    #[test]
    fn test_core_error_passes_through() {
        let err: CoreError = DescriptorError::Core(CoreError::malformed("p", "bad")).into();
        assert!(matches!(err, CoreError::MalformedParameter { .. }));
    }
}
