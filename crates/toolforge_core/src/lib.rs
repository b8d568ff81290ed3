//! toolforge core types
//!
//! Pure types shared by every stage of the generator: the error taxonomy,
//! the calling convention, and the explicit run context carrying all
//! resolved paths for one generation run.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod convention;
pub mod error;
pub mod time;

// Re-exports
pub use context::RunContext;
pub use convention::CallingConvention;
pub use error::{CoreError, CoreResult};
pub use time::timenow;
