//! Machine-readable run report.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use toolforge_core::{timenow, CoreError, CoreResult, RunContext};

/// How sample outputs were produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// The command line was run directly
    Direct,
    /// The test harness ran the descriptor
    Harness,
}

/// Summary of one generation run, written as `run_report.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Tool name
    pub tool_name: String,
    /// When the run started
    pub started: String,
    /// Execution path taken
    pub mode: Option<ExecutionMode>,
    /// Executable command line
    pub command: String,
    /// Exit code of the direct run
    pub exit_code: Option<i32>,
    /// Exit code of the harness
    pub harness_exit_code: Option<i32>,
    /// Non-fatal problems, such as missing outputs
    pub warnings: Vec<String>,
    /// Execution or validation failure, if any
    pub failure: Option<String>,
    /// Finished archive
    pub archive: Option<PathBuf>,
    /// Files copied to the report directory
    pub report_files: Vec<PathBuf>,
}

impl RunReport {
    /// Empty report for a tool
    #[must_use]
    pub fn new(tool_name: &str) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            started: timenow(),
            mode: None,
            command: String::new(),
            exit_code: None,
            harness_exit_code: None,
            warnings: Vec::new(),
            failure: None,
            archive: None,
            report_files: Vec::new(),
        }
    }

    /// Record a warning
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Record a failure; the first one wins
    pub fn fail(&mut self, err: &CoreError) {
        tracing::error!(error = %err, "run failed");
        if self.failure.is_none() {
            self.failure = Some(err.to_string());
        }
    }

    /// Whether execution and validation both passed
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Process exit code to hand back to the caller
    #[must_use]
    pub fn exit_code_for_caller(&self) -> i32 {
        match (self.exit_code, self.harness_exit_code) {
            (Some(c), _) if c != 0 => c,
            (_, Some(c)) if c != 0 => c,
            _ if self.failure.is_some() => 1,
            _ => 0,
        }
    }

    /// Write `run_report.json` into the report directory
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the write fails
    pub fn write(&self, ctx: &RunContext) -> CoreResult<PathBuf> {
        let path = ctx.run_report();
        let text = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
        }
        std::fs::write(&path, text).map_err(|e| CoreError::io(&path, e))?;
        Ok(path)
    }

    /// Read a report back
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }
}
