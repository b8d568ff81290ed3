//! Gzip tarball of the staging directory.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use toolforge_core::context::HARNESS_REPORT_SUFFIX;
use toolforge_core::{CoreError, CoreResult, RunContext};

/// Pack `tfout/` under `<tool_name>/` and copy it to the caller's output path
///
/// Harness HTML reports are left out.
///
/// # Errors
///
/// Returns `Packaging` when the staging directory or the descriptor is
/// missing, `Io` when writing fails
pub fn build_archive(ctx: &RunContext) -> CoreResult<PathBuf> {
    let staging = ctx.staging_dir();
    if !staging.is_dir() {
        return Err(CoreError::packaging(&staging, "staging directory is missing"));
    }
    let descriptor = ctx.descriptor_path();
    if !descriptor.is_file() {
        return Err(CoreError::packaging(&descriptor, "descriptor was never written"));
    }

    let archive = ctx.archive_path();
    let file = File::create(&archive).map_err(|e| CoreError::io(&archive, e))?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    let root = PathBuf::from(&ctx.tool_name);
    builder
        .append_dir(&root, &staging)
        .map_err(|e| CoreError::io(&staging, e))?;
    let count = append_tree(&mut builder, &staging, &root)?;
    let encoder = builder.into_inner().map_err(|e| CoreError::io(&archive, e))?;
    encoder.finish().map_err(|e| CoreError::io(&archive, e))?;
    tracing::info!(archive = %archive.display(), files = count, "archive written");

    if let Some(dest) = &ctx.output_archive {
        fs::copy(&archive, dest).map_err(|e| CoreError::io(dest, e))?;
        tracing::debug!(dest = %dest.display(), "archive copied to output");
    }
    Ok(archive)
}

fn append_tree<W: std::io::Write>(
    builder: &mut tar::Builder<W>,
    dir: &Path,
    arc_dir: &Path,
) -> CoreResult<usize> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| CoreError::io(dir, e))?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .collect();
    entries.sort();

    let mut count = 0;
    for path in entries {
        let Some(name) = path.file_name() else { continue };
        let arc_path = arc_dir.join(name);
        if path.is_dir() {
            builder
                .append_dir(&arc_path, &path)
                .map_err(|e| CoreError::io(&path, e))?;
            count += append_tree(builder, &path, &arc_path)?;
        } else if !name.to_string_lossy().ends_with(HARNESS_REPORT_SUFFIX) {
            builder
                .append_path_with_name(&path, &arc_path)
                .map_err(|e| CoreError::io(&path, e))?;
            count += 1;
        }
    }
    Ok(count)
}

/// Entry paths of a gzip tarball, in archive order
///
/// # Errors
///
/// Returns `Io` when the archive cannot be read
pub fn list_archive(path: &Path) -> CoreResult<Vec<String>> {
    let file = File::open(path).map_err(|e| CoreError::io(path, e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut names = Vec::new();
    for entry in archive.entries().map_err(|e| CoreError::io(path, e))? {
        let entry = entry.map_err(|e| CoreError::io(path, e))?;
        let name = entry.path().map_err(|e| CoreError::io(path, e))?;
        names.push(name.to_string_lossy().trim_end_matches('/').to_string());
    }
    Ok(names)
}
