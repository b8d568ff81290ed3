//! Typed parameter values.

use serde::{Deserialize, Serialize};
use toolforge_core::{CoreError, CoreResult};

/// One option of a select parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Value passed on the command line
    pub value: String,
    /// Text shown to the user
    pub text: String,
}

/// Typed value of an additional or select parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Free text
    Text(String),
    /// Integer
    Integer(i64),
    /// Floating point
    Float(f64),
    /// Boolean flag value
    Boolean(bool),
    /// Enumerated text options; the first is the sample value
    SelectText {
        /// Options in declaration order
        options: Vec<SelectOption>,
    },
}

impl ParamValue {
    /// Parse a scalar value for the given type tag
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedParameterType` for unknown tags and
    /// `MalformedParameter` when the value does not parse as the tagged type
    pub fn parse(name: &str, type_tag: &str, raw: &str) -> CoreResult<Self> {
        let tag = type_tag.trim();
        if tag == "text" {
            return Ok(Self::Text(raw.to_string()));
        }
        let raw = raw.trim();
        match tag {
            "integer" => raw.parse().map(Self::Integer).map_err(|_| {
                CoreError::malformed(name, format!("{:?} is not an integer", raw))
            }),
            "float" => match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Self::Float(v)),
                _ => Err(CoreError::malformed(
                    name,
                    format!("{:?} is not a finite float", raw),
                )),
            },
            "boolean" => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "checked" => Ok(Self::Boolean(true)),
                "false" | "0" | "no" | "" => Ok(Self::Boolean(false)),
                _ => Err(CoreError::malformed(
                    name,
                    format!("{:?} is not a boolean", raw),
                )),
            },
            other => Err(CoreError::UnsupportedParameterType {
                name: name.to_string(),
                type_name: other.to_string(),
            }),
        }
    }

    /// Build a select value from parallel value/text lists
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedParameterType` when the tag is not `selecttext`
    /// and `MalformedParameter` when there are no options
    pub fn select(name: &str, type_tag: &str, values: &[String], texts: &[String]) -> CoreResult<Self> {
        if type_tag.trim() != "selecttext" {
            return Err(CoreError::UnsupportedParameterType {
                name: name.to_string(),
                type_name: type_tag.to_string(),
            });
        }
        if values.is_empty() {
            return Err(CoreError::malformed(name, "select parameter has no options"));
        }
        let options = values
            .iter()
            .enumerate()
            .map(|(i, value)| SelectOption {
                value: value.clone(),
                text: texts.get(i).cloned().unwrap_or_else(|| value.clone()),
            })
            .collect();
        Ok(Self::SelectText { options })
    }

    /// Descriptor `type` attribute
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::SelectText { .. } => "select",
        }
    }

    /// Representative value used for the executable command line and tests
    #[must_use]
    pub fn sample(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(v) => v.to_string(),
            Self::Float(v) => format!("{:?}", v),
            Self::Boolean(v) => v.to_string(),
            Self::SelectText { options } => options
                .first()
                .map(|o| o.value.clone())
                .unwrap_or_default(),
        }
    }

    /// Whether the descriptor substitution should be quoted
    #[must_use]
    pub const fn is_quoted(&self) -> bool {
        matches!(self, Self::Text(_) | Self::SelectText { .. })
    }
}
