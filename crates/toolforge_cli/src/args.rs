//! Command-line arguments.

use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use toolforge_core::{CallingConvention, RunContext};
use toolforge_plan::ToolMetadata;
use toolforge_runtime::harness::{DEFAULT_GALAXY_ROOT, DEFAULT_HARNESS};
use toolforge_runtime::{EngineConfig, GenerationMode, GenerationRequest, Harness, ValidationPolicy};
use toolforge_tool::DeclarationSet;

#[derive(Debug, Parser)]
#[command(name = "toolforge")]
#[command(about = "Generate Galaxy tool wrappers for scripts and executables", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Raise log verbosity to debug
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build, run and package a tool
    Generate(Box<GenerateArgs>),
    /// List the data inputs and outputs a descriptor declares
    Inspect {
        /// Descriptor XML file
        descriptor: PathBuf,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Tool name; characters outside [A-Za-z0-9_] are dropped
    #[arg(long)]
    pub tool_name: String,
    /// One-line description
    #[arg(long, default_value = "")]
    pub tool_desc: String,
    /// Tool version
    #[arg(long, default_value = "0.01")]
    pub tool_version: String,
    /// Calling convention: 0, positional or argparse
    #[arg(long, default_value = "positional")]
    pub parampass: CallingConvention,
    /// Executable to run, overriding the first package
    #[arg(long)]
    pub sysexe: Option<String>,
    /// Script file run by the executable
    #[arg(long)]
    pub script_path: Option<PathBuf>,
    /// Requirements as name[:version],...
    #[arg(long, default_value = "")]
    pub packages: String,
    /// Input file declaration (JSON object), repeatable
    #[arg(long = "input-file")]
    pub input_files: Vec<String>,
    /// Output file declaration (JSON object), repeatable
    #[arg(long = "output-file")]
    pub output_files: Vec<String>,
    /// Additional parameter declaration (JSON object), repeatable
    #[arg(long = "additional-parameter")]
    pub additional_parameters: Vec<String>,
    /// Select parameter declaration (JSON object), repeatable
    #[arg(long = "select-parameter")]
    pub selecttext_parameters: Vec<String>,
    /// Output collection declaration (JSON object), repeatable
    #[arg(long = "collection")]
    pub collections: Vec<String>,
    /// Tokens appended to the command line
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub cl_suffix: String,
    /// File holding a replacement descriptor command
    #[arg(long)]
    pub command_override: Option<PathBuf>,
    /// File holding a replacement <tests> element
    #[arg(long)]
    pub test_override: Option<PathBuf>,
    /// File holding the help text
    #[arg(long)]
    pub help_text: Option<PathBuf>,
    /// Citations, entries separated by **ENTRY**
    #[arg(long, default_value = "")]
    pub citations: String,
    /// Author e-mail; its local part becomes the repository owner
    #[arg(long, default_value = "")]
    pub user_email: String,
    /// Directory for staging, logs and reports
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,
    /// Where to copy the finished archive
    #[arg(long)]
    pub output_archive: Option<PathBuf>,
    /// generate, validate or publish
    #[arg(long, default_value = "generate")]
    pub mode: GenerationMode,
    /// continue or abort when the harness fails
    #[arg(long, default_value = "continue")]
    pub validation_policy: ValidationPolicy,
    /// Test harness executable
    #[arg(long, default_value = DEFAULT_HARNESS)]
    pub harness: String,
    /// Galaxy checkout used by the harness
    #[arg(long, default_value = DEFAULT_GALAXY_ROOT)]
    pub galaxy_root: PathBuf,
    /// Leave author and timestamp comments out of the descriptor
    #[arg(long)]
    pub no_provenance: bool,
    /// Tool Shed URL
    #[arg(long, env = "TOOLSHED_URL", default_value = "http://localhost:9009")]
    pub toolshed_url: String,
    /// Tool Shed API key
    #[arg(long, env = "TOOLSHED_API_KEY", hide_env_values = true)]
    pub toolshed_api_key: Option<String>,
    /// Galaxy URL
    #[arg(long, env = "GALAXY_URL", default_value = "http://localhost:8080")]
    pub galaxy_url: String,
    /// Galaxy admin API key
    #[arg(long, env = "GALAXY_API_KEY", hide_env_values = true)]
    pub galaxy_api_key: Option<String>,
    /// After publishing, install the tool into Galaxy
    #[arg(long)]
    pub install: bool,
}

impl GenerateArgs {
    /// Run context for these arguments
    ///
    /// # Errors
    ///
    /// Returns error if the tool name sanitizes to nothing
    pub fn context(&self) -> Result<RunContext> {
        let mut ctx = RunContext::new(&self.tool_name, &self.work_dir)?;
        if let Some(out) = &self.output_archive {
            ctx = ctx.with_output_archive(out);
        }
        Ok(ctx)
    }

    /// Engine settings for these arguments
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            mode: self.mode,
            validation_policy: self.validation_policy,
            harness: Harness {
                program: self.harness.clone(),
                galaxy_root: self.galaxy_root.clone(),
            },
            provenance: !self.no_provenance,
        }
    }

    /// Read the referenced files and assemble the request
    ///
    /// # Errors
    ///
    /// Returns error for unreadable files or malformed declarations
    pub fn request(&self) -> Result<GenerationRequest> {
        let mut declarations = DeclarationSet::from_json_args(
            &self.input_files,
            &self.output_files,
            &self.additional_parameters,
            &self.selecttext_parameters,
            &self.collections,
        )?;
        for input in &mut declarations.inputs {
            input.name = std::path::absolute(&input.name)
                .wrap_err_with(|| format!("cannot resolve input path {}", input.name))?
                .display()
                .to_string();
        }

        Ok(GenerationRequest {
            convention: self.parampass,
            declarations,
            metadata: ToolMetadata {
                name: self.tool_name.clone(),
                version: self.tool_version.clone(),
                description: self.tool_desc.clone(),
                packages: self.packages.clone(),
                help_text: read_optional(self.help_text.as_deref())?.unwrap_or_default(),
                user_email: self.user_email.clone(),
                citations: self.citations.clone(),
            },
            sysexe: self.sysexe.clone(),
            script: read_optional(self.script_path.as_deref())?,
            cl_suffix: self.cl_suffix.clone(),
            command_override: read_optional(self.command_override.as_deref())?,
            test_override: read_optional(self.test_override.as_deref())?,
        })
    }
}

fn read_optional(path: Option<&Path>) -> Result<Option<String>> {
    path.map(|p| std::fs::read_to_string(p).wrap_err_with(|| format!("cannot read {}", p.display())))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn generate(extra: &[&str]) -> GenerateArgs {
        let mut argv = vec!["toolforge", "generate", "--tool-name", "rev tool"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Generate(args) => *args,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = generate(&[]);
        assert_eq!(args.parampass, CallingConvention::Positional);
        assert_eq!(args.mode, GenerationMode::Generate);
        assert_eq!(args.validation_policy, ValidationPolicy::Continue);
        assert_eq!(args.harness, "planemo");
        assert!(args.engine_config().provenance);
        assert_eq!(args.context().unwrap().tool_name, "revtool");
    }

    #[test]
    fn test_conventions_and_modes_parse() {
        let args = generate(&["--parampass", "0", "--mode", "publish", "--validation-policy", "abort"]);
        assert_eq!(args.parampass, CallingConvention::NoParam);
        assert!(args.mode.validates());
        assert_eq!(args.engine_config().validation_policy, ValidationPolicy::Abort);
        assert!(Cli::try_parse_from(["toolforge", "generate", "--tool-name", "t", "--parampass", "bogus"]).is_err());
    }

    #[test]
    fn test_request_reads_files_and_absolutizes_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("rev.py");
        std::fs::write(&script, "print(1)\n").unwrap();
        let args = generate(&[
            "--script-path",
            script.to_str().unwrap(),
            "--sysexe",
            "python3",
            "--input-file",
            r#"{"name":"rel/in.txt","CL":"1","format":"txt","label":"in"}"#,
            "--output-file",
            r#"{"name":"out","CL":"2","format":"txt"}"#,
        ]);
        let req = args.request().unwrap();
        assert_eq!(req.script.as_deref(), Some("print(1)\n"));
        assert!(Path::new(&req.declarations.inputs[0].name).is_absolute());
        assert_eq!(req.declarations.outputs.len(), 1);
        assert!(req.command_override.is_none());
    }

    #[test]
    fn test_missing_script_is_error() {
        let args = generate(&["--script-path", "/no/such/script.sh"]);
        assert!(args.request().is_err());
    }

    #[test]
    fn test_inspect_parses() {
        let cli = Cli::try_parse_from(["toolforge", "-v", "inspect", "t.xml", "--json"]).unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(matches!(cli.command, Commands::Inspect { json: true, .. }));
    }
}
