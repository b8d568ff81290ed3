//! Direct execution of the synthesized command line.
//!
//! The child runs in the work directory. Standard input comes from the
//! STDIN-bound file, standard output goes to the STDOUT-bound output or the
//! runner log, and standard error always goes to the error log.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use toolforge_core::{CoreError, CoreResult, RunContext};
use toolforge_storage::Staging;
use toolforge_tool::{CanonicalParameter, CommandLineSpec, ParameterKind};

/// Result of a finished direct run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectRun {
    /// Exit code, `None` when the child was killed by a signal
    pub code: Option<i32>,
    /// Display form of the command that ran
    pub command: String,
}

impl DirectRun {
    /// Whether the child exited zero
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Failure to record for a non-zero exit
    #[must_use]
    pub fn failure(&self) -> Option<CoreError> {
        (!self.success()).then(|| CoreError::ExecutionFailed {
            command: self.command.clone(),
            code: self.code,
        })
    }
}

/// Runs a command line directly and collects the sample outputs
#[derive(Debug, Clone, Copy)]
pub struct DirectExecutor<'a> {
    ctx: &'a RunContext,
}

impl<'a> DirectExecutor<'a> {
    /// Create an executor for a run
    #[must_use]
    pub fn new(ctx: &'a RunContext) -> Self {
        Self { ctx }
    }

    /// Spawn the command and wait for it
    ///
    /// # Errors
    ///
    /// Returns `Io` when a redirect file cannot be opened or the program
    /// cannot be spawned. A non-zero exit is not an error here.
    pub fn run(&self, spec: &CommandLineSpec) -> CoreResult<DirectRun> {
        let argv = spec.argv();
        let Some((program, args)) = argv.split_first() else {
            return Err(CoreError::InvalidConfig {
                field: "command".to_string(),
                reason: "empty command line".to_string(),
            });
        };
        let command = spec.display_executable();

        let mut log = open_log(&self.ctx.runner_log())?;
        writeln!(log, "## Executing Toolfactory generated command line = {}", command)
            .map_err(|e| CoreError::io(self.ctx.runner_log(), e))?;

        let stdin = match &spec.stdin {
            Some(pair) => {
                let path = self.resolve(&pair.executable);
                Stdio::from(File::open(&path).map_err(|e| CoreError::io(&path, e))?)
            }
            None => Stdio::null(),
        };
        let stdout = match &spec.stdout {
            Some(pair) => {
                let path = self.ctx.output_file(&pair.executable);
                Stdio::from(File::create(&path).map_err(|e| CoreError::io(&path, e))?)
            }
            None => Stdio::from(log),
        };
        let stderr = Stdio::from(open_log(&self.ctx.error_log())?);

        tracing::info!(command = %command, "running tool directly");
        let status = Command::new(program)
            .args(args)
            .current_dir(&self.ctx.work_dir)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .map_err(|e| CoreError::io(program, e))?;

        let run = DirectRun {
            code: status.code(),
            command,
        };
        if run.success() {
            tracing::debug!("direct run finished");
        } else {
            tracing::warn!(code = ?run.code, "direct run exited non-zero");
        }
        Ok(run)
    }

    /// Copy each produced output to its sample location. Returns one warning
    /// per output that was not produced.
    ///
    /// # Errors
    ///
    /// Returns `Io` when a copy fails
    pub fn collect_outputs(&self, params: &[CanonicalParameter]) -> CoreResult<Vec<String>> {
        let staging = Staging::new(self.ctx);
        let mut warnings = Vec::new();
        for p in params {
            let ParameterKind::OutputFile { file_name, .. } = &p.kind else {
                continue;
            };
            let produced = self.ctx.output_file(file_name);
            if produced.is_file() {
                staging.record_sample(p, &produced)?;
            } else {
                let msg = format!("output {} was not produced at {}", p.name, produced.display());
                tracing::warn!("{}", msg);
                warnings.push(msg);
            }
        }
        Ok(warnings)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.ctx.work_dir.join(path)
    }
}

pub(crate) fn open_log(path: &Path) -> CoreResult<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CoreError::io(path, e))
}
