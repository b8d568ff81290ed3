//! Generation pipeline.
//!
//! normalize, synthesize, build, render, stage, run, archive, report. Model
//! errors stop the run before anything is spawned. Execution failures are
//! recorded and packaging still happens; validation failures abort only
//! under [`ValidationPolicy::Abort`].

use crate::executor::DirectExecutor;
use crate::harness::Harness;
use crate::report::{ExecutionMode, RunReport};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use toolforge_core::{timenow, CallingConvention, CoreError, CoreResult, RunContext};
use toolforge_plan::{parse_requirements, render, DescriptorBuilder, Provenance, Requirement, ToolMetadata};
use toolforge_storage::{build_archive, fan_out, ShedMetadata, Staging};
use toolforge_tool::{normalize, synthesize, CanonicalParameter, DeclarationSet, ProgramSpec};

/// What the caller asked for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Build, run and package
    #[default]
    Generate,
    /// Also run the test harness against the packaged tool
    Validate,
    /// Validate, then hand the archive to a registry
    Publish,
}

impl GenerationMode {
    /// Whether the harness runs even when a direct run produced the samples
    #[must_use]
    pub const fn validates(&self) -> bool {
        matches!(self, Self::Validate | Self::Publish)
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generate => "generate",
            Self::Validate => "validate",
            Self::Publish => "publish",
        })
    }
}

impl FromStr for GenerationMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "generate" => Ok(Self::Generate),
            "validate" => Ok(Self::Validate),
            "publish" => Ok(Self::Publish),
            other => Err(CoreError::InvalidConfig {
                field: "mode".to_string(),
                reason: format!("must be generate, validate or publish, got {:?}", other),
            }),
        }
    }
}

/// What to do when the harness fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Record the failure and package anyway
    #[default]
    Continue,
    /// Stop before packaging
    Abort,
}

impl FromStr for ValidationPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "continue" => Ok(Self::Continue),
            "abort" => Ok(Self::Abort),
            other => Err(CoreError::InvalidConfig {
                field: "validation_policy".to_string(),
                reason: format!("must be continue or abort, got {:?}", other),
            }),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Requested mode
    pub mode: GenerationMode,
    /// Harness failure handling
    pub validation_policy: ValidationPolicy,
    /// Harness invocation
    pub harness: Harness,
    /// Stamp author and timestamp comments into the descriptor
    pub provenance: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: GenerationMode::Generate,
            validation_policy: ValidationPolicy::Continue,
            harness: Harness::default(),
            provenance: true,
        }
    }
}

/// Everything the caller declares about one tool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    /// Calling convention
    pub convention: CallingConvention,
    /// Raw parameter declarations
    pub declarations: DeclarationSet,
    /// Name, version, packages, help and citations
    pub metadata: ToolMetadata,
    /// Explicit executable, overriding the first package
    pub sysexe: Option<String>,
    /// Script text run by the executable
    pub script: Option<String>,
    /// Tokens appended to the command line
    pub cl_suffix: String,
    /// Replacement descriptor command
    pub command_override: Option<String>,
    /// Replacement `<tests>` element
    pub test_override: Option<String>,
}

/// Direct run when the tool needs nothing beyond a bare interpreter and
/// the descriptor is fully generated; harness otherwise
#[must_use]
pub fn select_mode(requirements: &[Requirement], has_overrides: bool) -> ExecutionMode {
    if has_overrides || requirements.iter().any(|r| !r.is_bare_shell()) {
        ExecutionMode::Harness
    } else {
        ExecutionMode::Direct
    }
}

/// Runs the generation pipeline
#[derive(Debug, Clone, Default)]
pub struct ToolEngine {
    config: EngineConfig,
}

impl ToolEngine {
    /// Create an engine
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine configuration
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generate, run and package one tool
    ///
    /// # Errors
    ///
    /// Returns model errors before anything is written, `Io` and
    /// `Packaging` errors from staging, and `ValidationFailed` when the
    /// harness fails under [`ValidationPolicy::Abort`]. Execution failures
    /// are only recorded in the returned report.
    pub fn run(&self, ctx: &RunContext, request: &GenerationRequest) -> CoreResult<RunReport> {
        let ctx = absolute(ctx)?;
        let params = normalize(&request.declarations, request.convention)?;

        let mut program = ProgramSpec::resolve(
            request.sysexe.as_deref(),
            &request.metadata.packages,
            None,
        )?;
        if request.script.is_some() {
            program.script = Some(ctx.script_artifact_path(program.interpreter()));
        }
        let spec = synthesize(request.convention, &program, &params, &request.cl_suffix)?;

        let builder = self.builder(request);
        let built = builder.build(&params, &spec)?;
        let xml = render(&built.descriptor)?;
        let requirements = parse_requirements(&request.metadata.packages)?;

        ctx.prepare()?;
        let mut report = RunReport::new(&ctx.tool_name);
        report.command = spec.display_executable();

        let staging = Staging::new(&ctx);
        staging.write_descriptor(&xml)?;
        if let Some(script) = &request.script {
            staging.write_script(program.interpreter(), script)?;
        }
        ShedMetadata::new(
            &ctx.tool_name,
            &request.metadata.user_email,
            &request.metadata.description,
        )
        .write(&ctx)?;
        staging.stage_inputs(&params)?;

        let mode = select_mode(&requirements, builder.has_overrides());
        report.mode = Some(mode);
        tracing::info!(tool = %ctx.tool_name, mode = ?mode, "tool staged");

        let aborted = match mode {
            ExecutionMode::Direct => {
                let executor = DirectExecutor::new(&ctx);
                let run = executor.run(&spec)?;
                report.exit_code = run.code;
                if let Some(err) = run.failure() {
                    report.fail(&err);
                }
                for warning in executor.collect_outputs(&params)? {
                    report.warn(warning);
                }
                if self.config.mode.validates() {
                    self.validate(&ctx, &params, &mut report)?
                } else {
                    None
                }
            }
            ExecutionMode::Harness => self.validate(&ctx, &params, &mut report)?,
        };
        if let Some(err) = aborted {
            report.write(&ctx)?;
            return Err(err);
        }

        let archive = build_archive(&ctx)?;
        report.archive = Some(ctx.output_archive.clone().unwrap_or(archive));
        report.report_files = fan_out(&ctx)?;
        report.write(&ctx)?;
        tracing::info!(
            tool = %ctx.tool_name,
            succeeded = report.succeeded(),
            warnings = report.warnings.len(),
            "run finished"
        );
        Ok(report)
    }

    fn builder(&self, request: &GenerationRequest) -> DescriptorBuilder {
        let meta = &request.metadata;
        let mut builder = DescriptorBuilder::new(meta.clone())
            .with_collections(request.declarations.collections.clone());
        if let Some(script) = &request.script {
            builder = builder.with_script(script.clone());
        }
        if let Some(command) = &request.command_override {
            builder = builder.with_command_override(command.clone());
        }
        if let Some(tests) = &request.test_override {
            builder = builder.with_test_override(tests.clone());
        }
        if self.config.provenance {
            builder = builder.with_provenance(Provenance {
                author: meta.user_email.clone(),
                timestamp: timenow(),
            });
        }
        builder
    }

    /// Run the harness and promote its outputs. Returns the error to abort
    /// with, if the policy says so.
    fn validate(
        &self,
        ctx: &RunContext,
        params: &[CanonicalParameter],
        report: &mut RunReport,
    ) -> CoreResult<Option<CoreError>> {
        let run = self.config.harness.run(ctx)?;
        report.harness_exit_code = run.code;
        for warning in Staging::new(ctx).promote_harness_outputs(params)? {
            report.warn(warning);
        }
        let Some(err) = run.failure() else {
            return Ok(None);
        };
        report.fail(&err);
        Ok(match self.config.validation_policy {
            ValidationPolicy::Continue => None,
            ValidationPolicy::Abort => Some(err),
        })
    }
}

fn absolute(ctx: &RunContext) -> CoreResult<RunContext> {
    let work_dir = std::path::absolute(&ctx.work_dir).map_err(|e| CoreError::io(&ctx.work_dir, e))?;
    Ok(RunContext {
        work_dir,
        ..ctx.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolforge_tool::{InputFileDecl, OutputFileDecl, ParameterDeclaration};

    fn requirement(package: &str) -> Requirement {
        Requirement {
            package: package.to_string(),
            version: String::new(),
        }
    }

    fn cat_request(input: &std::path::Path) -> GenerationRequest {
        GenerationRequest {
            convention: CallingConvention::NoParam,
            declarations: DeclarationSet::new()
                .with(ParameterDeclaration::InputFile(InputFileDecl {
                    name: input.display().to_string(),
                    cl: "STDIN".to_string(),
                    format: "txt".to_string(),
                    label: "lines".to_string(),
                    help: String::new(),
                    repeat: false,
                }))
                .with(ParameterDeclaration::OutputFile(OutputFileDecl {
                    name: "copied".to_string(),
                    cl: "STDOUT".to_string(),
                    format: "txt".to_string(),
                    label: String::new(),
                    help: String::new(),
                    test: String::new(),
                })),
            metadata: ToolMetadata {
                name: "cat tool".to_string(),
                version: "0.01".to_string(),
                description: "copies lines".to_string(),
                user_email: "me@example.org".to_string(),
                ..ToolMetadata::default()
            },
            sysexe: Some("cat".to_string()),
            ..GenerationRequest::default()
        }
    }

    #[test]
    fn test_select_mode() {
        assert_eq!(select_mode(&[], false), ExecutionMode::Direct);
        assert_eq!(select_mode(&[requirement("bash")], false), ExecutionMode::Direct);
        assert_eq!(select_mode(&[requirement("python")], false), ExecutionMode::Harness);
        assert_eq!(select_mode(&[], true), ExecutionMode::Harness);
    }

    #[test]
    fn test_mode_and_policy_parse() {
        assert_eq!("validate".parse::<GenerationMode>().unwrap(), GenerationMode::Validate);
        assert!(GenerationMode::Publish.validates());
        assert!(!GenerationMode::Generate.validates());
        assert!("later".parse::<GenerationMode>().is_err());
        assert_eq!("abort".parse::<ValidationPolicy>().unwrap(), ValidationPolicy::Abort);
        assert_eq!(ValidationPolicy::default(), ValidationPolicy::Continue);
    }

    #[test]
    fn test_model_error_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new("cat tool", dir.path().join("work")).unwrap();
        let mut request = cat_request(&dir.path().join("in.txt"));
        request.declarations.push(ParameterDeclaration::OutputFile(OutputFileDecl {
            name: "second".to_string(),
            cl: "2".to_string(),
            format: "txt".to_string(),
            label: String::new(),
            help: String::new(),
            test: String::new(),
        }));
        let err = ToolEngine::default().run(&ctx, &request).unwrap_err();
        assert!(err.is_model_error());
        assert!(!ctx.work_dir.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_end_to_end_cat() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        std::fs::write(&input, "alpha\nbeta\n").unwrap();
        let delivered = dir.path().join("cat_tool.tgz");
        let ctx = RunContext::new("cat tool", dir.path().join("work"))
            .unwrap()
            .with_output_archive(&delivered);

        let report = ToolEngine::default().run(&ctx, &cat_request(&input)).unwrap();
        assert_eq!(report.mode, Some(ExecutionMode::Direct));
        assert!(report.succeeded(), "{:?}", report.failure);
        assert_eq!(report.exit_code, Some(0));
        assert!(report.warnings.is_empty());
        assert_eq!(report.archive.as_deref(), Some(delivered.as_path()));
        assert!(delivered.is_file());

        assert_eq!(
            std::fs::read_to_string(ctx.sample_path("copied")).unwrap(),
            "alpha\nbeta\n"
        );
        let names = toolforge_storage::list_archive(&delivered).unwrap();
        assert!(names.contains(&"cattool/cattool.xml".to_string()));
        assert!(names.contains(&"cattool/.shed.yml".to_string()));
        assert!(names.contains(&"cattool/test-data/lines_sample".to_string()));
        assert!(names.contains(&"cattool/test-data/copied_sample".to_string()));
        assert!(ctx.run_report().is_file());
        assert!(ctx.report_dir().join("cattool_xml.txt").is_file());

        let xml = std::fs::read_to_string(ctx.descriptor_path()).unwrap();
        let io = toolforge_plan::declared_io(&xml).unwrap();
        assert_eq!(io.inputs.len(), 1);
        assert_eq!(io.outputs.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_execution_failure_still_packages() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        std::fs::write(&input, "x\n").unwrap();
        let ctx = RunContext::new("fails", dir.path().join("work")).unwrap();
        let mut request = cat_request(&input);
        request.sysexe = Some("false".to_string());

        let report = ToolEngine::default().run(&ctx, &request).unwrap();
        assert!(!report.succeeded());
        assert_eq!(report.exit_code_for_caller(), 1);
        assert!(ctx.archive_path().is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_harness_failure_aborts_before_packaging() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        std::fs::write(&input, "x\n").unwrap();
        let ctx = RunContext::new("strict", dir.path().join("work")).unwrap();
        let mut request = cat_request(&input);
        request.test_override = Some("<tests><test/></tests>".to_string());
        let engine = ToolEngine::new(EngineConfig {
            validation_policy: ValidationPolicy::Abort,
            harness: Harness {
                program: "false".to_string(),
                ..Harness::default()
            },
            provenance: false,
            ..EngineConfig::default()
        });

        let err = engine.run(&ctx, &request).unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
        assert!(!ctx.archive_path().exists());
        let report = RunReport::load(&ctx.run_report()).unwrap();
        assert_eq!(report.mode, Some(ExecutionMode::Harness));
        assert_eq!(report.harness_exit_code, Some(1));
        assert!(report.failure.is_some());
    }
}
