//! Descriptor builder.
//!
//! Maps canonical parameters and the synthesized command line into a
//! [`ToolDescriptor`] and the test-case bindings shared with the execution
//! driver.

use crate::directive::CompareMode;
use crate::error::DescriptorResult;
use crate::help::{cheetah_escape, compose_help};
use crate::requirement::parse_requirements;
use crate::schema::{
    parse_citations, Citation, CitationKind, ConfigFile, InputNode, OutputNode, TestCaseBinding,
    TestSection, ToolDescriptor, FACTORY_DOI, SCRIPT_CONFIGFILE,
};
use serde::{Deserialize, Serialize};
use toolforge_core::context::sanitize_tool_name;
use toolforge_tool::{CanonicalParameter, CollectionDecl, CommandLineSpec, ParamValue, ParameterKind};

/// Project URL written into provenance comments
pub const FACTORY_URL: &str = "https://github.com/fubar2/toolfactory";

/// Descriptive fields of the tool being generated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMetadata {
    /// Tool name; the id is its sanitized form
    pub name: String,
    /// Tool version
    pub version: String,
    /// One-line description
    pub description: String,
    /// Comma-separated `package[:version]` list
    pub packages: String,
    /// User help text
    pub help_text: String,
    /// Author e-mail
    pub user_email: String,
    /// `**ENTRY**`-separated citations
    pub citations: String,
}

/// Authorship stamp. Left out of the descriptor unless set, so repeated
/// builds are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Author e-mail
    pub author: String,
    /// Build time
    pub timestamp: String,
}

/// Descriptor plus the bindings its test section was generated from
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutput {
    /// The descriptor
    pub descriptor: ToolDescriptor,
    /// Generated bindings, also used when an override replaces the tests
    pub bindings: Vec<TestCaseBinding>,
}

/// Builds tool descriptors
#[derive(Debug, Clone, Default)]
pub struct DescriptorBuilder {
    meta: ToolMetadata,
    collections: Vec<CollectionDecl>,
    script: Option<String>,
    command_override: Option<String>,
    test_override: Option<String>,
    provenance: Option<Provenance>,
}

impl DescriptorBuilder {
    /// Create a builder for a tool
    #[must_use]
    pub fn new(meta: ToolMetadata) -> Self {
        Self {
            meta,
            ..Self::default()
        }
    }

    /// Add discovered-output collections
    #[must_use]
    pub fn with_collections(mut self, collections: Vec<CollectionDecl>) -> Self {
        self.collections = collections;
        self
    }

    /// Embed a script as the `runme` configfile
    #[must_use]
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// Replace the synthesized command text
    #[must_use]
    pub fn with_command_override(mut self, command: impl Into<String>) -> Self {
        self.command_override = Some(command.into());
        self
    }

    /// Replace the generated `<tests>` element
    #[must_use]
    pub fn with_test_override(mut self, tests: impl Into<String>) -> Self {
        self.test_override = Some(tests.into());
        self
    }

    /// Stamp authorship comments into the descriptor
    #[must_use]
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Whether the command or the tests are caller-supplied
    #[must_use]
    pub fn has_overrides(&self) -> bool {
        self.command_override.is_some() || self.test_override.is_some()
    }

    /// Build the descriptor
    ///
    /// # Errors
    ///
    /// Returns error for a malformed requirement list or output test
    /// directive
    pub fn build(
        &self,
        params: &[CanonicalParameter],
        command: &CommandLineSpec,
    ) -> DescriptorResult<BuildOutput> {
        let requirements = parse_requirements(&self.meta.packages)?;

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        let mut input_bindings = Vec::new();
        let mut output_bindings = Vec::new();

        for p in params {
            match &p.kind {
                ParameterKind::OutputFile { format, test, .. } => {
                    outputs.push(OutputNode::Data {
                        name: p.internal_name.clone(),
                        format: format.clone(),
                        label: cheetah_escape(p.display_label()),
                    });
                    output_bindings.push(TestCaseBinding::Output {
                        name: p.internal_name.clone(),
                        file: p.sample_file_name(),
                        compare: CompareMode::parse(&p.name, test)?,
                    });
                }
                ParameterKind::InputFile { format, .. } => {
                    let node = InputNode::Data {
                        name: p.internal_name.clone(),
                        label: p.display_label().to_string(),
                        help: p.help.clone(),
                        format: format.clone(),
                    };
                    let binding = TestCaseBinding::Param {
                        name: p.internal_name.clone(),
                        value: p.sample_file_name(),
                    };
                    push_maybe_repeated(p, node, binding, &mut inputs, &mut input_bindings);
                }
                ParameterKind::Additional { value } | ParameterKind::Select { value } => {
                    let node = value_node(p, value);
                    let binding = TestCaseBinding::Param {
                        name: p.internal_name.clone(),
                        value: value.sample(),
                    };
                    push_maybe_repeated(p, node, binding, &mut inputs, &mut input_bindings);
                }
            }
        }

        for c in &self.collections {
            outputs.push(OutputNode::Collection {
                name: c.name.clone(),
                kind: c.kind.clone(),
                label: if c.label.is_empty() { c.name.clone() } else { c.label.clone() },
                pattern: c.discover.clone(),
            });
            output_bindings.push(TestCaseBinding::Collection {
                name: c.name.clone(),
            });
        }

        let mut bindings = input_bindings;
        bindings.extend(output_bindings);

        let tests = match &self.test_override {
            Some(text) => TestSection::Override(text.trim().to_string()),
            None => TestSection::Generated(bindings.clone()),
        };
        let command = match &self.command_override {
            Some(text) => text
                .lines()
                .map(str::trim_end)
                .collect::<Vec<_>>()
                .join("\n"),
            None => command.descriptor_command(),
        };

        let descriptor = ToolDescriptor {
            id: sanitize_tool_name(&self.meta.name),
            name: self.meta.name.clone(),
            version: self.meta.version.clone(),
            description: self.meta.description.clone(),
            comments: self.comments(),
            requirements,
            version_command: format!("echo \"{}\"", self.meta.version),
            command,
            configfile: self.script.as_ref().map(|s| ConfigFile {
                name: SCRIPT_CONFIGFILE.to_string(),
                text: format!("#raw\n{}\n#end raw", s.trim_end()),
            }),
            inputs,
            outputs,
            tests,
            help: compose_help(&self.meta.help_text, &self.meta.user_email, self.script.as_deref()),
            citations: self.citations(),
        };
        tracing::debug!(
            tool = %descriptor.id,
            inputs = descriptor.inputs.len(),
            outputs = descriptor.outputs.len(),
            "descriptor built"
        );
        Ok(BuildOutput {
            descriptor,
            bindings,
        })
    }

    fn comments(&self) -> Vec<String> {
        match &self.provenance {
            Some(p) => vec![
                format!(
                    "Created by {} at {} using the Galaxy Tool Factory.",
                    p.author, p.timestamp
                ),
                format!("Source in git at: {}", FACTORY_URL),
            ],
            None => Vec::new(),
        }
    }

    fn citations(&self) -> Vec<Citation> {
        let mut cites = parse_citations(&self.meta.citations);
        if !cites.iter().any(|c| c.kind == CitationKind::Doi && c.value == FACTORY_DOI) {
            cites.push(Citation {
                kind: CitationKind::Doi,
                value: FACTORY_DOI.to_string(),
            });
        }
        cites
    }
}

fn value_node(p: &CanonicalParameter, value: &ParamValue) -> InputNode {
    let label = p.display_label().to_string();
    match value {
        ParamValue::SelectText { options } => InputNode::Select {
            name: p.internal_name.clone(),
            label,
            help: p.help.clone(),
            options: options.clone(),
        },
        other => InputNode::Scalar {
            name: p.internal_name.clone(),
            label,
            help: p.help.clone(),
            type_name: other.type_name().to_string(),
            value: other.sample(),
        },
    }
}

fn push_maybe_repeated(
    p: &CanonicalParameter,
    node: InputNode,
    binding: TestCaseBinding,
    inputs: &mut Vec<InputNode>,
    bindings: &mut Vec<TestCaseBinding>,
) {
    if p.repeat {
        let name = format!("R_{}", p.internal_name);
        inputs.push(InputNode::Repeat {
            name: name.clone(),
            title: format!("Add as many {} as needed", p.display_label()),
            inner: Box::new(node),
        });
        bindings.push(TestCaseBinding::Repeat {
            name,
            bindings: vec![binding],
        });
    } else {
        inputs.push(node);
        bindings.push(binding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{meta, sample_decls};
    use toolforge_core::CallingConvention;
    use toolforge_tool::{normalize, synthesize, ProgramSpec};

    fn build(builder: &DescriptorBuilder) -> BuildOutput {
        let params = normalize(&sample_decls(), CallingConvention::Argparse).unwrap();
        let program = ProgramSpec::resolve(Some("python3"), "", None).unwrap();
        let spec = synthesize(CallingConvention::Argparse, &program, &params, "").unwrap();
        builder.build(&params, &spec).unwrap()
    }

    #[test]
    fn test_nodes_and_bindings() {
        let out = build(&DescriptorBuilder::new(meta()));
        let d = &out.descriptor;
        assert_eq!(d.id, "revtool");
        assert_eq!(d.requirements[0].package, "python");
        assert_eq!(d.inputs.len(), 2);
        assert!(matches!(&d.inputs[1], InputNode::Repeat { name, title, .. }
            if name == "R_k" && title == "Add as many Count as needed"));
        assert!(out.bindings.contains(&TestCaseBinding::Output {
            name: "outfile".to_string(),
            file: "outfile_sample".to_string(),
            compare: CompareMode::Diff { lines_diff: 2 },
        }));
        assert!(d.command.contains("#for $rep in $R_k:"));
        assert_eq!(d.version_command, "echo \"0.01\"");
        assert_eq!(d.citations.last().map(|c| c.value.as_str()), Some(FACTORY_DOI));
        assert!(d.comments.is_empty());
    }

    #[test]
    fn test_overrides_replace_nodes() {
        let builder = DescriptorBuilder::new(meta())
            .with_command_override("python3 $runme\n  --in $infile  \n")
            .with_test_override("<tests><test/></tests>");
        assert!(builder.has_overrides());
        let out = build(&builder);
        assert_eq!(out.descriptor.command, "python3 $runme\n  --in $infile");
        assert_eq!(
            out.descriptor.tests,
            TestSection::Override("<tests><test/></tests>".to_string())
        );
        assert!(!out.bindings.is_empty());
    }

    #[test]
    fn test_script_configfile_is_raw() {
        let out = build(&DescriptorBuilder::new(meta()).with_script("print('$x')\n"));
        let cf = out.descriptor.configfile.unwrap();
        assert_eq!(cf.name, "runme");
        assert_eq!(cf.text, "#raw\nprint('$x')\n#end raw");
        assert!(out.descriptor.help.contains("print('\\$x')"));
    }

    #[test]
    fn test_collections_and_provenance() {
        let builder = DescriptorBuilder::new(meta())
            .with_collections(vec![CollectionDecl {
                name: "pieces".to_string(),
                kind: "list".to_string(),
                label: String::new(),
                discover: "__name_and_ext__".to_string(),
            }])
            .with_provenance(Provenance {
                author: "me@example.org".to_string(),
                timestamp: "01/01/2026 10:00:00".to_string(),
            });
        let out = build(&builder);
        assert!(matches!(out.descriptor.outputs.last(), Some(OutputNode::Collection { label, .. }) if label == "pieces"));
        assert_eq!(out.bindings.last(), Some(&TestCaseBinding::Collection { name: "pieces".to_string() }));
        assert_eq!(out.descriptor.comments.len(), 2);
    }

    #[test]
    fn test_bad_directive_aborts() {
        let mut decls = sample_decls();
        decls.outputs[0].test = "diff:lots".to_string();
        let params = normalize(&decls, CallingConvention::Argparse).unwrap();
        let program = ProgramSpec::resolve(Some("python3"), "", None).unwrap();
        let spec = synthesize(CallingConvention::Argparse, &program, &params, "").unwrap();
        assert!(DescriptorBuilder::new(meta()).build(&params, &spec).is_err());
    }

    #[test]
    fn test_stdin_input_stays_top_level() {
        let mut decls = sample_decls();
        decls.inputs[0].cl = "STDIN".to_string();
        decls.inputs[0].repeat = true;
        let params = normalize(&decls, CallingConvention::Argparse).unwrap();
        let program = ProgramSpec::resolve(Some("python3"), "", None).unwrap();
        let spec = synthesize(CallingConvention::Argparse, &program, &params, "").unwrap();
        let out = DescriptorBuilder::new(meta()).build(&params, &spec).unwrap();
        assert!(matches!(&out.descriptor.inputs[0], InputNode::Data { name, .. } if name == "Input_text"));
        assert!(out.descriptor.command.ends_with("< $Input_text"));
        assert!(!out.descriptor.inputs.iter().any(
            |n| matches!(n, InputNode::Repeat { name, .. } if name == "R_Input_text")
        ));
    }
}
