//! Flat report directory.
//!
//! Every produced file lands in one listing a reviewer can click through.
//! Browsers open `.html`, `.gz` and `.tgz` as they are; anything else is
//! renamed to `.txt` so it displays as text.

use std::fs;
use std::path::{Path, PathBuf};
use toolforge_core::context::SAMPLE_SUFFIX;
use toolforge_core::{CoreError, CoreResult, RunContext};

const KEPT_EXTENSIONS: [&str; 3] = ["html", "gz", "tgz"];

/// Extension for a report copy of a file with the given format tag
#[must_use]
pub fn report_extension(format: &str) -> &'static str {
    let format = format.trim().to_ascii_lowercase();
    KEPT_EXTENSIONS
        .iter()
        .copied()
        .find(|kept| *kept == format)
        .unwrap_or("txt")
}

/// Report name for a produced file, or `None` for staged samples
#[must_use]
pub fn report_name(file_name: &str) -> Option<String> {
    if file_name.ends_with(SAMPLE_SUFFIX) {
        return None;
    }
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext {
        Some(e) if KEPT_EXTENSIONS.contains(&e.as_str()) => Some(file_name.to_string()),
        _ => Some(format!("{}.txt", file_name.replace('.', "_"))),
    }
}

/// Copy the staged files, the test data and the archive into the report
/// directory
///
/// # Errors
///
/// Returns `Io` when a directory cannot be read or a copy fails
pub fn fan_out(ctx: &RunContext) -> CoreResult<Vec<PathBuf>> {
    let report = ctx.report_dir();
    fs::create_dir_all(&report).map_err(|e| CoreError::io(&report, e))?;

    let mut sources = files_in(&ctx.staging_dir())?;
    sources.extend(files_in(&ctx.test_data_dir())?);
    let archive = ctx.archive_path();
    if archive.is_file() {
        sources.push(archive);
    }

    let mut copied = Vec::new();
    for src in sources {
        let Some(name) = src.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let Some(new_name) = report_name(&name) else {
            continue;
        };
        let dest = report.join(new_name);
        fs::copy(&src, &dest).map_err(|e| CoreError::io(&src, e))?;
        copied.push(dest);
    }
    tracing::debug!(count = copied.len(), report = %report.display(), "report directory filled");
    Ok(copied)
}

fn files_in(dir: &Path) -> CoreResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| CoreError::io(dir, e))?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}
