//! `.shed.yml` repository metadata.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use toolforge_core::{CoreError, CoreResult, RunContext};

/// Category every generated repository is filed under
pub const SHED_CATEGORY: &str = "TF Generated Tools";

/// Tool Shed repository metadata read by the harness and the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShedMetadata {
    /// Repository name
    pub name: String,
    /// Owner, the local part of the author e-mail
    pub owner: String,
    /// Repository type
    #[serde(rename = "type")]
    pub repo_type: String,
    /// Long description
    pub description: String,
    /// Short description
    pub synopsis: String,
    /// Category
    pub category: String,
}

impl ShedMetadata {
    /// Metadata for a tool by the given author
    #[must_use]
    pub fn new(tool_name: &str, user_email: &str, description: &str) -> Self {
        Self {
            name: tool_name.to_string(),
            owner: owner_from_email(user_email),
            repo_type: "unrestricted".to_string(),
            description: description.to_string(),
            synopsis: description.to_string(),
            category: SHED_CATEGORY.to_string(),
        }
    }

    /// Write `.shed.yml` into the staging directory
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the write fails
    pub fn write(&self, ctx: &RunContext) -> CoreResult<PathBuf> {
        let path = ctx.staging_dir().join(".shed.yml");
        let text = serde_yaml::to_string(self).map_err(|e| CoreError::packaging(&path, e.to_string()))?;
        std::fs::create_dir_all(ctx.staging_dir()).map_err(|e| CoreError::io(ctx.staging_dir(), e))?;
        std::fs::write(&path, text).map_err(|e| CoreError::io(&path, e))?;
        Ok(path)
    }
}

/// Local part of an e-mail address
#[must_use]
pub fn owner_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or_default().trim().to_string()
}
