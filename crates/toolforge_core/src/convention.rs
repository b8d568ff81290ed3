//! Calling conventions.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How parameter values are spelled on the generated command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallingConvention {
    /// No parameters: one input on stdin, one output on stdout (`"0"`)
    #[serde(rename = "0")]
    NoParam,
    /// Ordinal positional arguments
    #[default]
    #[serde(rename = "positional")]
    Positional,
    /// argparse-style named flags
    #[serde(rename = "argparse")]
    Argparse,
}

impl CallingConvention {
    /// Wire spelling, as accepted by [`FromStr`]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoParam => "0",
            Self::Positional => "positional",
            Self::Argparse => "argparse",
        }
    }

    /// Whether parameters are addressed by ordinal
    #[must_use]
    pub const fn is_ordinal(&self) -> bool {
        matches!(self, Self::NoParam | Self::Positional)
    }
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallingConvention {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Self::NoParam),
            "positional" => Ok(Self::Positional),
            "argparse" => Ok(Self::Argparse),
            other => Err(CoreError::InvalidConfig {
                field: "parampass".to_string(),
                reason: format!(
                    "must be \"0\", \"positional\" or \"argparse\", got {:?}",
                    other
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for conv in [
            CallingConvention::NoParam,
            CallingConvention::Positional,
            CallingConvention::Argparse,
        ] {
            assert_eq!(conv.as_str().parse::<CallingConvention>().unwrap(), conv);
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("getopt".parse::<CallingConvention>().is_err());
    }

    #[test]
    fn test_is_ordinal() {
        assert!(CallingConvention::Positional.is_ordinal());
        assert!(CallingConvention::NoParam.is_ordinal());
        assert!(!CallingConvention::Argparse.is_ordinal());
    }
}
