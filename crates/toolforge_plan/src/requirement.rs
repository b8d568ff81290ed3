//! Package requirements.

use crate::error::{DescriptorError, DescriptorResult};
use serde::{Deserialize, Serialize};

/// A conda package the tool needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Package name
    pub package: String,
    /// Version pin, empty for latest
    pub version: String,
}

impl Requirement {
    /// Whether the requirement is just a shell that every host already has
    #[must_use]
    pub fn is_bare_shell(&self) -> bool {
        self.package == "bash"
    }
}

/// Parse `name[:version]` entries separated by commas. `=` and `==` are
/// accepted as the separator too.
///
/// # Errors
///
/// Returns `MalformedRequirement` for an entry with an empty name, more than
/// one separator, or characters outside a package name
pub fn parse_requirements(packages: &str) -> DescriptorResult<Vec<Requirement>> {
    let mut out = Vec::new();
    for raw in packages.split(',') {
        let entry = raw.trim();
        if entry.is_empty() {
            continue;
        }
        let malformed = |reason: &str| DescriptorError::MalformedRequirement {
            entry: entry.to_string(),
            reason: reason.to_string(),
        };
        let normalized = entry.replace("==", ":").replace('=', ":");
        let mut parts = normalized.split(':');
        let package = parts.next().unwrap_or_default().trim();
        let version = parts.next().unwrap_or_default().trim();
        if parts.next().is_some() {
            return Err(malformed("more than one version separator"));
        }
        if package.is_empty() {
            return Err(malformed("missing package name"));
        }
        if !package.chars().all(is_package_char) || !version.chars().all(is_package_char) {
            return Err(malformed("unexpected character"));
        }
        out.push(Requirement {
            package: package.to_string(),
            version: version.to_string(),
        });
    }
    Ok(out)
}

fn is_package_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators() {
        let reqs = parse_requirements("python:3.8, numpy==1.19,pandas=1.1 ,bash").unwrap();
        assert_eq!(reqs.len(), 4);
        assert_eq!(reqs[0].version, "3.8");
        assert_eq!(reqs[1].package, "numpy");
        assert_eq!(reqs[1].version, "1.19");
        assert_eq!(reqs[2].version, "1.1");
        assert!(reqs[3].version.is_empty());
        assert!(reqs[3].is_bare_shell());
    }

    #[test]
    fn test_empty_list() {
        assert!(parse_requirements("").unwrap().is_empty());
        assert!(parse_requirements(" , ").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_entries_abort() {
        assert!(parse_requirements("a:1:2").is_err());
        assert!(parse_requirements(":1.0").is_err());
        assert!(matches!(
            parse_requirements("good, bad pkg").unwrap_err(),
            DescriptorError::MalformedRequirement { ref entry, .. } if entry == "bad pkg"
        ));
    }
}
