//! Output test directives.
//!
//! `diff[:N]`, `sim_size[:D]`, or a comparator named verbatim. An empty
//! directive means the harness default comparison.

use crate::error::{DescriptorError, DescriptorResult};
use serde::{Deserialize, Serialize};

/// How a test compares a produced output with its sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompareMode {
    /// Harness default
    Default,
    /// Line diff with a tolerance
    Diff {
        /// Lines allowed to differ
        lines_diff: u32,
    },
    /// Size similarity
    SimSize {
        /// Absolute byte tolerance
        delta: Option<u64>,
        /// Fractional tolerance, at most 1
        delta_frac: Option<f64>,
    },
    /// Any other comparator, passed through by name
    Named(String),
}

impl CompareMode {
    /// Parse a directive for `output`
    ///
    /// # Errors
    ///
    /// Returns `MalformedDirective` when a `diff` or `sim_size` suffix is not
    /// a number
    pub fn parse(output: &str, directive: &str) -> DescriptorResult<Self> {
        let directive = directive.trim();
        if directive.is_empty() {
            return Ok(Self::Default);
        }
        let (head, arg) = match directive.split_once(':') {
            Some((h, a)) => (h.trim(), Some(a.trim())),
            None => (directive, None),
        };
        let malformed = || DescriptorError::MalformedDirective {
            output: output.to_string(),
            directive: directive.to_string(),
        };

        match head {
            "diff" => {
                let lines_diff = match arg.filter(|a| !a.is_empty()) {
                    Some(a) => a.parse().map_err(|_| malformed())?,
                    None => 0,
                };
                Ok(Self::Diff { lines_diff })
            }
            "sim_size" => match arg.filter(|a| !a.is_empty()) {
                None => Ok(Self::SimSize {
                    delta: None,
                    delta_frac: None,
                }),
                Some(a) if a.contains('.') => {
                    let frac: f64 = a.parse().map_err(|_| malformed())?;
                    if !frac.is_finite() || frac < 0.0 {
                        return Err(malformed());
                    }
                    Ok(Self::SimSize {
                        delta: None,
                        delta_frac: Some(frac.min(1.0)),
                    })
                }
                Some(a) => Ok(Self::SimSize {
                    delta: Some(a.parse().map_err(|_| malformed())?),
                    delta_frac: None,
                }),
            },
            _ => Ok(Self::Named(directive.to_string())),
        }
    }

    /// Attributes of the `<output>` test node, in emission order
    #[must_use]
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Default => Vec::new(),
            Self::Diff { lines_diff } => vec![
                ("compare", "diff".to_string()),
                ("lines_diff", lines_diff.to_string()),
            ],
            Self::SimSize { delta, delta_frac } => {
                let mut attrs = vec![("compare", "sim_size".to_string())];
                if let Some(d) = delta {
                    attrs.push(("delta", d.to_string()));
                }
                if let Some(f) = delta_frac {
                    attrs.push(("delta_frac", f.to_string()));
                }
                attrs
            }
            Self::Named(name) => vec![("compare", name.clone())],
        }
    }
}
