//! Paired command lines.
//!
//! Every token is held as a pair of spellings, one concrete and one using the
//! hosting engine's substitution syntax. Both projections are read off the
//! same pairs, so they always have the same length and order.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use toolforge_core::{CoreError, CoreResult};

/// Descriptor variable holding the embedded script
pub const SCRIPT_VARIABLE: &str = "$runme";
/// Closing line of a descriptor loop
pub const LOOP_END: &str = "#end for";

/// One token in both spellings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Concrete spelling, ready to exec
    pub executable: String,
    /// Templated spelling for the descriptor
    pub descriptor: String,
}

impl TokenPair {
    /// Pair with distinct spellings
    #[must_use]
    pub fn new(executable: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            descriptor: descriptor.into(),
        }
    }

    /// Pair spelled the same way on both sides
    #[must_use]
    pub fn literal(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            executable: token.clone(),
            descriptor: token,
        }
    }
}

/// The program being wrapped: an interpreter or executable, optionally with
/// a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSpec {
    /// Executable tokens (`python3`, `bash -e`, ...)
    pub executable: Vec<String>,
    /// Script run by the interpreter, if any
    pub script: Option<PathBuf>,
}

impl ProgramSpec {
    /// Resolve the program from an explicit system executable, falling back
    /// to the first package of a `name[:version],...` requirement list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when neither yields an executable
    pub fn resolve(sysexe: Option<&str>, packages: &str, script: Option<PathBuf>) -> CoreResult<Self> {
        let executable: Vec<String> = match sysexe.map(str::trim).filter(|s| !s.is_empty()) {
            Some(exe) => exe.split_whitespace().map(str::to_string).collect(),
            None => packages
                .split(',')
                .next()
                .and_then(|p| p.split([':', '=']).next())
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| vec![p.to_string()])
                .unwrap_or_default(),
        };
        if executable.is_empty() {
            return Err(CoreError::InvalidConfig {
                field: "sysexe".to_string(),
                reason: "no system executable and no package to run".to_string(),
            });
        }
        Ok(Self { executable, script })
    }

    /// Basename of the interpreter, used for the script artifact extension
    #[must_use]
    pub fn interpreter(&self) -> &str {
        self.executable
            .first()
            .map(|e| e.rsplit('/').next().unwrap_or(e))
            .unwrap_or_default()
    }

    /// Program tokens as pairs; the script becomes `$runme` in the descriptor
    #[must_use]
    pub fn token_pairs(&self) -> Vec<TokenPair> {
        let mut pairs: Vec<TokenPair> = self.executable.iter().map(TokenPair::literal).collect();
        if let Some(script) = &self.script {
            pairs.push(TokenPair::new(script.display().to_string(), SCRIPT_VARIABLE));
        }
        pairs
    }
}

/// Both command lines of one tool, computed once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLineSpec {
    /// Interpreter/executable and script
    pub program: Vec<TokenPair>,
    /// Argument tokens
    pub args: Vec<TokenPair>,
    /// Standard input source
    pub stdin: Option<TokenPair>,
    /// Standard output target
    pub stdout: Option<TokenPair>,
    /// User tokens appended verbatim
    pub suffix: Vec<String>,
}

impl CommandLineSpec {
    /// Start a command line for a program
    #[must_use]
    pub fn new(program: &ProgramSpec) -> Self {
        Self {
            program: program.token_pairs(),
            args: Vec::new(),
            stdin: None,
            stdout: None,
            suffix: Vec::new(),
        }
    }

    /// Shell-split a user suffix and append it to both projections
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the suffix has unbalanced quotes
    pub fn with_suffix(mut self, suffix: &str) -> CoreResult<Self> {
        if suffix.trim().is_empty() {
            return Ok(self);
        }
        self.suffix = shlex::split(suffix).ok_or_else(|| CoreError::InvalidConfig {
            field: "cl_suffix".to_string(),
            reason: format!("cannot split {:?}", suffix),
        })?;
        Ok(self)
    }

    fn pairs(&self) -> Vec<TokenPair> {
        let mut out = self.program.clone();
        out.extend(self.args.iter().cloned());
        if let Some(p) = &self.stdin {
            out.push(TokenPair::literal("<"));
            out.push(p.clone());
        }
        if let Some(p) = &self.stdout {
            out.push(TokenPair::literal(">"));
            out.push(p.clone());
        }
        out.extend(self.suffix.iter().map(TokenPair::literal));
        out
    }

    /// Concrete tokens, redirections included
    #[must_use]
    pub fn executable_tokens(&self) -> Vec<String> {
        self.pairs().into_iter().map(|p| p.executable).collect()
    }

    /// Templated tokens, redirections included
    #[must_use]
    pub fn descriptor_tokens(&self) -> Vec<String> {
        self.pairs().into_iter().map(|p| p.descriptor).collect()
    }

    /// Descriptor command text. A token closing a loop ends its line.
    #[must_use]
    pub fn descriptor_command(&self) -> String {
        let mut out = String::new();
        for token in self.descriptor_tokens() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push(' ');
            }
            out.push_str(&token);
            if token.ends_with(LOOP_END) {
                out.push('\n');
            }
        }
        out.trim_end().to_string()
    }

    /// Argument vector for a direct run: everything except redirections
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        self.program
            .iter()
            .chain(self.args.iter())
            .map(|p| p.executable.clone())
            .chain(self.suffix.iter().cloned())
            .collect()
    }

    /// Command line as a single display string
    #[must_use]
    pub fn display_executable(&self) -> String {
        self.executable_tokens().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_sysexe_splits_on_whitespace() {
        let p = ProgramSpec::resolve(Some("bash -e"), "", None).unwrap();
        assert_eq!(p.executable, vec!["bash", "-e"]);
        assert_eq!(p.interpreter(), "bash");
    }

    #[test]
    fn test_resolve_from_packages() {
        let p = ProgramSpec::resolve(None, "python:3.8, numpy", None).unwrap();
        assert_eq!(p.executable, vec!["python"]);
        let p = ProgramSpec::resolve(Some(" "), "samtools==1.9", None).unwrap();
        assert_eq!(p.executable, vec!["samtools"]);
        assert!(ProgramSpec::resolve(None, "", None).is_err());
    }

    #[test]
    fn test_script_pair() {
        let p = ProgramSpec::resolve(Some("/usr/bin/python3"), "", Some(PathBuf::from("/w/s.py"))).unwrap();
        assert_eq!(p.interpreter(), "python3");
        let pairs = p.token_pairs();
        assert_eq!(pairs[1], TokenPair::new("/w/s.py", "$runme"));
    }

    #[test]
    fn test_redirections_follow_args() {
        let mut spec = CommandLineSpec::new(&ProgramSpec::resolve(Some("rev"), "", None).unwrap());
        spec.args.push(TokenPair::new("-n", "-n"));
        spec.stdin = Some(TokenPair::new("in.txt", "$infile"));
        spec.stdout = Some(TokenPair::new("out", "$out"));
        assert_eq!(spec.executable_tokens(), vec!["rev", "-n", "<", "in.txt", ">", "out"]);
        assert_eq!(spec.descriptor_tokens(), vec!["rev", "-n", "<", "$infile", ">", "$out"]);
        assert_eq!(spec.argv(), vec!["rev", "-n"]);
    }

    #[test]
    fn test_suffix_applies_to_both_sides() {
        let spec = CommandLineSpec::new(&ProgramSpec::resolve(Some("sort"), "", None).unwrap())
            .with_suffix("-k 2 'a b'")
            .unwrap();
        assert_eq!(spec.executable_tokens(), vec!["sort", "-k", "2", "a b"]);
        assert_eq!(spec.descriptor_tokens().len(), 4);
        assert!(CommandLineSpec::new(&ProgramSpec::resolve(Some("x"), "", None).unwrap())
            .with_suffix("'open")
            .is_err());
    }

    #[test]
    fn test_descriptor_command_breaks_after_loop() {
        let mut spec = CommandLineSpec::new(&ProgramSpec::resolve(Some("tool"), "", None).unwrap());
        spec.args.push(TokenPair::new("--k", "#for $rep in $R_k:\n--k"));
        spec.args.push(TokenPair::new("1", "\"$rep.k\"\n#end for"));
        spec.args.push(TokenPair::new("--n", "--n"));
        spec.args.push(TokenPair::new("2", "$n"));
        assert_eq!(
            spec.descriptor_command(),
            "tool #for $rep in $R_k:\n--k \"$rep.k\"\n#end for\n--n $n"
        );
    }
}
