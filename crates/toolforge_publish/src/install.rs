//! Install a published tool into a running Galaxy with `shed-tools`.

use crate::error::{PublishError, PublishResult};
use secrecy::{ExposeSecret, SecretString};
use std::fs::OpenOptions;
use std::path::Path;
use std::process::{Command, Stdio};

/// Default install client
pub const DEFAULT_INSTALLER: &str = "shed-tools";
/// Tool panel section new tools land in
pub const SECTION_LABEL: &str = "ToolFactory";

const REDACTED: &str = "********";

/// `shed-tools install` invocation
#[derive(Debug)]
pub struct Installer {
    /// Install client executable
    pub program: String,
    /// Galaxy URL
    pub galaxy_url: String,
    /// Galaxy admin API key
    pub api_key: SecretString,
    /// Registry the tool is installed from
    pub toolshed_url: String,
}

impl Installer {
    /// Installer using the default client
    #[must_use]
    pub fn new(galaxy_url: &str, api_key: SecretString, toolshed_url: &str) -> Self {
        Self {
            program: DEFAULT_INSTALLER.to_string(),
            galaxy_url: galaxy_url.to_string(),
            api_key,
            toolshed_url: toolshed_url.to_string(),
        }
    }

    fn args(&self, tool_name: &str, owner: &str, key: &str) -> Vec<String> {
        [
            "install",
            "-g",
            self.galaxy_url.as_str(),
            "--latest",
            "-a",
            key,
            "--name",
            tool_name,
            "--owner",
            owner,
            "--toolshed",
            self.toolshed_url.as_str(),
            "--section_label",
            SECTION_LABEL,
        ]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
    }

    /// Command line with the API key masked, for logs
    #[must_use]
    pub fn display_command(&self, tool_name: &str, owner: &str) -> String {
        let mut argv = vec![self.program.clone()];
        argv.extend(self.args(tool_name, owner, REDACTED));
        argv.join(" ")
    }

    /// Run the install, appending its output to `log`
    ///
    /// # Errors
    ///
    /// Returns `Io` when the log cannot be opened or the client cannot be
    /// spawned, `Install` when it exits non-zero
    pub fn install(&self, tool_name: &str, owner: &str, log: &Path) -> PublishResult<()> {
        let io_err = |source| PublishError::Io {
            path: log.to_path_buf(),
            source,
        };
        let out = OpenOptions::new().create(true).append(true).open(log).map_err(io_err)?;
        let err = out.try_clone().map_err(io_err)?;

        tracing::info!(command = %self.display_command(tool_name, owner), "installing tool");
        let status = Command::new(&self.program)
            .args(self.args(tool_name, owner, self.api_key.expose_secret()))
            .stdin(Stdio::null())
            .stdout(Stdio::from(out))
            .stderr(Stdio::from(err))
            .status()
            .map_err(|source| PublishError::Io {
                path: self.program.clone().into(),
                source,
            })?;
        if status.success() {
            tracing::info!(tool = %tool_name, "tool installed");
            Ok(())
        } else {
            Err(PublishError::Install {
                code: status.code(),
            })
        }
    }
}
