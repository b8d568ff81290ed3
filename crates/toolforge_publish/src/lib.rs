//! toolforge publisher
//!
//! Uploads a packaged tool to a Tool Shed and optionally installs it into a
//! Galaxy server. Failures never touch the local package.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod install;
pub mod toolshed;

pub use error::{PublishError, PublishResult};
pub use install::Installer;
pub use toolshed::{category_id, Category, NewRepository, PublishOutcome, Repository, ToolShedClient};
