//! Staging directory layout.
//!
//! `<work>/tfout/` holds the descriptor, the script artifact, `.shed.yml`
//! and `test-data/<internal>_sample` for every input and output. Every
//! sample also gets a readable copy in the report directory.

use std::fs;
use std::path::{Path, PathBuf};
use crate::report_dir::report_extension;
use toolforge_core::{CoreError, CoreResult, RunContext};
use toolforge_tool::{CanonicalParameter, ParameterKind};

/// Writes staged artifacts for one run
#[derive(Debug, Clone, Copy)]
pub struct Staging<'a> {
    ctx: &'a RunContext,
}

impl<'a> Staging<'a> {
    /// Stage into the directories of `ctx`
    #[must_use]
    pub fn new(ctx: &'a RunContext) -> Self {
        Self { ctx }
    }

    /// Write the descriptor as `tfout/<tool>.xml`
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be written
    pub fn write_descriptor(&self, xml: &str) -> CoreResult<PathBuf> {
        let path = self.ctx.descriptor_path();
        write(&path, xml)?;
        tracing::info!(path = %path.display(), "descriptor staged");
        Ok(path)
    }

    /// Write the script artifact `tfout/<tool>.<interpreter>`
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be written
    pub fn write_script(&self, interpreter: &str, script: &str) -> CoreResult<PathBuf> {
        let path = self.ctx.script_artifact_path(interpreter);
        let mut text = script.trim_end().to_string();
        text.push('\n');
        write(&path, &text)?;
        Ok(path)
    }

    /// Copy every input file to its sample location and the report
    ///
    /// # Errors
    ///
    /// Returns `Io` when an input file cannot be read or copied
    pub fn stage_inputs(&self, params: &[CanonicalParameter]) -> CoreResult<Vec<PathBuf>> {
        let mut staged = Vec::new();
        for p in params {
            if let ParameterKind::InputFile { path, .. } = &p.kind {
                staged.push(self.record_sample(p, Path::new(path))?);
            }
        }
        tracing::debug!(count = staged.len(), "input samples staged");
        Ok(staged)
    }

    /// Copy a produced file to the parameter's sample location and the
    /// report
    ///
    /// # Errors
    ///
    /// Returns `Io` when the copy fails
    pub fn record_sample(&self, param: &CanonicalParameter, produced: &Path) -> CoreResult<PathBuf> {
        let sample = self.ctx.sample_path(&param.internal_name);
        copy(produced, &sample)?;
        copy(produced, &self.report_copy(param))?;
        Ok(sample)
    }

    /// After a harness run, move `test-data/<name>` outputs to their sample
    /// names. Returns one warning per output that is still missing.
    ///
    /// # Errors
    ///
    /// Returns `Io` when a copy fails
    pub fn promote_harness_outputs(&self, params: &[CanonicalParameter]) -> CoreResult<Vec<String>> {
        let mut warnings = Vec::new();
        for p in params {
            let ParameterKind::OutputFile { file_name, .. } = &p.kind else {
                continue;
            };
            let sample = self.ctx.sample_path(&p.internal_name);
            let candidates = [
                sample.clone(),
                self.ctx.test_data_dir().join(file_name),
                self.ctx.test_data_dir().join(&p.internal_name),
            ];
            match candidates.iter().find(|c| c.is_file()) {
                Some(found) if *found == sample => copy(&sample, &self.report_copy(p))?,
                Some(found) => {
                    self.record_sample(p, found)?;
                }
                None => {
                    let msg = format!(
                        "output {} not found in {} after harness run",
                        p.name,
                        self.ctx.test_data_dir().display()
                    );
                    tracing::warn!("{}", msg);
                    warnings.push(msg);
                }
            }
        }
        Ok(warnings)
    }

    /// Report-directory copy of a parameter's sample. The format becomes
    /// the extension only when browsers open it as is.
    #[must_use]
    pub fn report_copy(&self, param: &CanonicalParameter) -> PathBuf {
        let ext = report_extension(param.format().unwrap_or_default());
        self.ctx
            .report_dir()
            .join(format!("{}.{}", param.sample_file_name(), ext))
    }
}

fn write(path: &Path, text: &str) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
    }
    fs::write(path, text).map_err(|e| CoreError::io(path, e))
}

fn copy(from: &Path, to: &Path) -> CoreResult<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
    }
    fs::copy(from, to).map_err(|e| CoreError::io(from, e))?;
    Ok(())
}
