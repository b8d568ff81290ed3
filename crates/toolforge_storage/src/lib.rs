//! toolforge packaging
//!
//! Lays out the staging directory the hosting engine expects, packs it into
//! a gzip tarball and fans every produced file out into a flat report
//! directory.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod layout;
pub mod shed;
pub mod archive;
pub mod report_dir;

pub use layout::Staging;
pub use shed::ShedMetadata;
pub use archive::{build_archive, list_archive};
pub use report_dir::{fan_out, report_extension, report_name};
