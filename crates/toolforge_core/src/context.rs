//! Explicit run context.
//!
//! Every path a generation run touches is resolved once here and threaded
//! through the stages. Nothing reads the process working directory.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Staging directory name under the work directory
pub const STAGING_DIR: &str = "tfout";
/// Test data directory name under the staging directory
pub const TEST_DATA_DIR: &str = "test-data";
/// Report directory name under the work directory
pub const REPORT_DIR: &str = "TF_run_report";
/// Suffix of the harness HTML report, excluded from archives
pub const HARNESS_REPORT_SUFFIX: &str = "_planemo_test_report.html";
/// Suffix of staged sample files
pub const SAMPLE_SUFFIX: &str = "_sample";

/// Resolved paths for a single generation run
///
/// Concurrent runs must use distinct work directories; nothing here locks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    /// Sanitized tool name
    pub tool_name: String,
    /// Root of all intermediate files
    pub work_dir: PathBuf,
    /// Where the finished archive is copied, if anywhere
    pub output_archive: Option<PathBuf>,
}

impl RunContext {
    /// Create a new context rooted at `work_dir`
    ///
    /// # Errors
    ///
    /// Returns error if the tool name is empty after sanitizing
    pub fn new(tool_name: &str, work_dir: impl Into<PathBuf>) -> CoreResult<Self> {
        let tool_name = sanitize_tool_name(tool_name);
        if tool_name.is_empty() {
            return Err(CoreError::InvalidConfig {
                field: "tool_name".to_string(),
                reason: "tool name has no alphanumeric characters".to_string(),
            });
        }
        Ok(Self {
            tool_name,
            work_dir: work_dir.into(),
            output_archive: None,
        })
    }

    /// Set the caller-visible archive destination
    #[must_use]
    pub fn with_output_archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_archive = Some(path.into());
        self
    }

    /// Staging directory, laid out the way the hosting engine expects
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.work_dir.join(STAGING_DIR)
    }

    /// `test-data` directory inside the staging directory
    #[must_use]
    pub fn test_data_dir(&self) -> PathBuf {
        self.staging_dir().join(TEST_DATA_DIR)
    }

    /// Human-reviewable report directory
    #[must_use]
    pub fn report_dir(&self) -> PathBuf {
        self.work_dir.join(REPORT_DIR)
    }

    /// Descriptor file inside the staging directory
    #[must_use]
    pub fn descriptor_path(&self) -> PathBuf {
        self.staging_dir().join(format!("{}.xml", self.tool_name))
    }

    /// Script artifact inside the staging directory
    #[must_use]
    pub fn script_artifact_path(&self, interpreter: &str) -> PathBuf {
        let ext = Path::new(interpreter)
            .file_name()
            .map_or_else(|| interpreter.to_string(), |n| n.to_string_lossy().into_owned());
        self.staging_dir().join(format!("{}.{}", self.tool_name, ext))
    }

    /// Working archive path
    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        self.work_dir.join(format!("{}_toolshed.gz", self.tool_name))
    }

    /// Where a direct run writes the output file `name`
    #[must_use]
    pub fn output_file(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }

    /// Staged sample file for an internal parameter name
    #[must_use]
    pub fn sample_path(&self, internal_name: &str) -> PathBuf {
        self.test_data_dir()
            .join(format!("{}{}", internal_name, SAMPLE_SUFFIX))
    }

    /// Runner log in the report directory
    #[must_use]
    pub fn runner_log(&self) -> PathBuf {
        self.report_dir()
            .join(format!("{}_runner_log.txt", self.tool_name))
    }

    /// Error log in the report directory
    #[must_use]
    pub fn error_log(&self) -> PathBuf {
        self.report_dir()
            .join(format!("{}_error_log.txt", self.tool_name))
    }

    /// Harness HTML report in the report directory
    #[must_use]
    pub fn harness_report(&self) -> PathBuf {
        self.report_dir()
            .join(format!("{}{}", self.tool_name, HARNESS_REPORT_SUFFIX))
    }

    /// Machine-readable run report
    #[must_use]
    pub fn run_report(&self) -> PathBuf {
        self.report_dir().join("run_report.json")
    }

    /// Create the staging, test-data and report directories
    ///
    /// # Errors
    ///
    /// Returns error if a directory cannot be created
    pub fn prepare(&self) -> CoreResult<()> {
        for dir in [self.test_data_dir(), self.report_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| CoreError::io(&dir, e))?;
        }
        tracing::debug!(work_dir = %self.work_dir.display(), "run context prepared");
        Ok(())
    }
}

/// Strip every character outside `[A-Za-z0-9_]`
#[must_use]
pub fn sanitize_tool_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
