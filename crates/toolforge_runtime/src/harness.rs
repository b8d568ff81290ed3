//! External test harness driver (planemo).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use crate::executor::open_log;
use toolforge_core::{CoreError, CoreResult, RunContext};

/// Default harness executable
pub const DEFAULT_HARNESS: &str = "planemo";
/// Default hosting engine checkout used by the harness
pub const DEFAULT_GALAXY_ROOT: &str = "/galaxy-central";

/// Harness invocation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Harness {
    /// Harness executable
    pub program: String,
    /// Root of the hosting engine checkout
    pub galaxy_root: PathBuf,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            program: DEFAULT_HARNESS.to_string(),
            galaxy_root: PathBuf::from(DEFAULT_GALAXY_ROOT),
        }
    }
}

/// Outcome of one harness invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessRun {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    /// HTML report the harness was asked to write
    pub report: PathBuf,
}

impl HarnessRun {
    /// Whether the harness exited zero
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Failure to record for a non-zero exit
    #[must_use]
    pub fn failure(&self) -> Option<CoreError> {
        (!self.success()).then(|| CoreError::ValidationFailed {
            code: self.code,
            report: self.report.display().to_string(),
        })
    }
}

impl Harness {
    /// Argument vector for testing the staged descriptor and refreshing its
    /// test data
    #[must_use]
    pub fn command(&self, ctx: &RunContext) -> Vec<String> {
        vec![
            self.program.clone(),
            "test".to_string(),
            "--test_data".to_string(),
            ctx.test_data_dir().display().to_string(),
            "--test_output".to_string(),
            ctx.harness_report().display().to_string(),
            "--galaxy_root".to_string(),
            self.galaxy_root.display().to_string(),
            "--update_test_data".to_string(),
            ctx.descriptor_path().display().to_string(),
        ]
    }

    /// Run the harness in the staging directory with output appended to the
    /// run logs
    ///
    /// # Errors
    ///
    /// Returns `Io` when the logs cannot be opened or the harness cannot be
    /// spawned. A non-zero exit is not an error here.
    pub fn run(&self, ctx: &RunContext) -> CoreResult<HarnessRun> {
        let argv = self.command(ctx);
        let log = open_log(&ctx.runner_log())?;
        let err = open_log(&ctx.error_log())?;
        tracing::info!(command = %argv.join(" "), "running test harness");

        let status = Command::new(&self.program)
            .args(&argv[1..])
            .current_dir(ctx.staging_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(err))
            .status()
            .map_err(|e| CoreError::io(&self.program, e))?;

        let run = HarnessRun {
            code: status.code(),
            report: ctx.harness_report(),
        };
        if run.success() {
            tracing::info!(report = %run.report.display(), "harness passed");
        } else {
            tracing::warn!(code = ?run.code, report = %run.report.display(), "harness failed");
        }
        Ok(run)
    }
}
