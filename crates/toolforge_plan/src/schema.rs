//! Tool descriptor model.
//!
//! A tree mirroring the Galaxy tool XML sections. Built once by
//! [`crate::compiler::DescriptorBuilder`] and written once by
//! [`crate::render`].

use crate::directive::CompareMode;
use crate::requirement::Requirement;
use serde::{Deserialize, Serialize};
use toolforge_tool::SelectOption;

/// DOI of the tool factory itself, cited by every generated tool
pub const FACTORY_DOI: &str = "10.1093/bioinformatics/bts573";
/// Name of the configfile holding an embedded script
pub const SCRIPT_CONFIGFILE: &str = "runme";

/// Complete descriptor for one generated tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool id, also the file stem
    pub id: String,
    /// Display name
    pub name: String,
    /// Tool version
    pub version: String,
    /// One-line description
    pub description: String,
    /// Provenance comments written before everything else
    pub comments: Vec<String>,
    /// Package requirements
    pub requirements: Vec<Requirement>,
    /// Version command
    pub version_command: String,
    /// Command template
    pub command: String,
    /// Embedded script, if any
    pub configfile: Option<ConfigFile>,
    /// Input parameters
    pub inputs: Vec<InputNode>,
    /// Outputs
    pub outputs: Vec<OutputNode>,
    /// Test section
    pub tests: TestSection,
    /// Help text
    pub help: String,
    /// Citations
    pub citations: Vec<Citation>,
}

/// Named configfile entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Template variable name
    pub name: String,
    /// Payload
    pub text: String,
}

/// One node of the `<inputs>` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputNode {
    /// `<param type="data">`
    Data {
        /// Parameter name
        name: String,
        /// Label
        label: String,
        /// Help
        help: String,
        /// Accepted format
        format: String,
    },
    /// Scalar `<param>`
    Scalar {
        /// Parameter name
        name: String,
        /// Label
        label: String,
        /// Help
        help: String,
        /// `text`, `integer`, `float` or `boolean`
        type_name: String,
        /// Default value
        value: String,
    },
    /// `<param type="select">`
    Select {
        /// Parameter name
        name: String,
        /// Label
        label: String,
        /// Help
        help: String,
        /// Options, first selected
        options: Vec<SelectOption>,
    },
    /// `<repeat>` wrapping one node
    Repeat {
        /// Repeat name, `R_<name>`
        name: String,
        /// Repeat title
        title: String,
        /// Repeated node
        inner: Box<InputNode>,
    },
}

impl InputNode {
    /// Node name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Data { name, .. }
            | Self::Scalar { name, .. }
            | Self::Select { name, .. }
            | Self::Repeat { name, .. } => name,
        }
    }
}

/// One node of the `<outputs>` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputNode {
    /// `<data>`
    Data {
        /// Output name
        name: String,
        /// Format
        format: String,
        /// Label
        label: String,
    },
    /// `<collection>` filled by dataset discovery
    Collection {
        /// Collection name, also the directory scanned
        name: String,
        /// Collection type
        kind: String,
        /// Label
        label: String,
        /// Discovery pattern
        pattern: String,
    },
}

/// The `<tests>` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TestSection {
    /// Generated from test-case bindings
    Generated(Vec<TestCaseBinding>),
    /// Caller-supplied `<tests>` element, written verbatim
    Override(String),
}

/// One binding in the generated test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TestCaseBinding {
    /// Input or parameter with its sample value
    Param {
        /// Parameter name
        name: String,
        /// Sample value or sample file name
        value: String,
    },
    /// Repeat block wrapping nested bindings
    Repeat {
        /// Repeat name
        name: String,
        /// Nested bindings
        bindings: Vec<TestCaseBinding>,
    },
    /// Expected output
    Output {
        /// Output name
        name: String,
        /// Sample file compared against
        file: String,
        /// Comparison mode
        compare: CompareMode,
    },
    /// Expected collection, checked for presence only
    Collection {
        /// Collection name
        name: String,
    },
}

impl TestCaseBinding {
    /// Sample file names this binding refers to
    #[must_use]
    pub fn sample_files(&self) -> Vec<&str> {
        match self {
            Self::Param { value, .. } if value.ends_with(toolforge_core::context::SAMPLE_SUFFIX) => {
                vec![value.as_str()]
            }
            Self::Output { file, .. } => vec![file.as_str()],
            Self::Repeat { bindings, .. } => bindings.iter().flat_map(Self::sample_files).collect(),
            _ => Vec::new(),
        }
    }
}

/// Citation entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// `doi` or `bibtex`
    pub kind: CitationKind,
    /// DOI or BibTeX record
    pub value: String,
}

/// Citation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CitationKind {
    /// Digital object identifier
    Doi,
    /// BibTeX record
    Bibtex,
}

impl CitationKind {
    /// Attribute spelling
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Doi => "doi",
            Self::Bibtex => "bibtex",
        }
    }
}

/// Parse `**ENTRY**`-separated citations, each starting with `doi` or
/// `bibtex`. Entries without a `doi` prefix are taken as BibTeX.
#[must_use]
pub fn parse_citations(text: &str) -> Vec<Citation> {
    text.split("**ENTRY**")
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| match c.strip_prefix("doi") {
            Some(rest) => Citation {
                kind: CitationKind::Doi,
                value: rest.trim().to_string(),
            },
            None => Citation {
                kind: CitationKind::Bibtex,
                value: c.strip_prefix("bibtex").unwrap_or(c).trim().to_string(),
            },
        })
        .collect()
}
