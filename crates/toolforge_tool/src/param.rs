//! Raw parameter declarations.
//!
//! One JSON object per declaration, in the field spelling the generator
//! front end emits. Records are validated independently here; cross-record
//! rules live in [`crate::normalize`].

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolforge_core::{CoreError, CoreResult};

/// Declared input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFileDecl {
    /// Path of the sample input
    pub name: String,
    /// Ordinal, flag name, or `STDIN`
    #[serde(rename = "CL", deserialize_with = "scalar_string")]
    pub cl: String,
    /// File type tag
    #[serde(default)]
    pub format: String,
    /// Human label
    #[serde(default)]
    pub label: String,
    /// Help text
    #[serde(default)]
    pub help: String,
    /// Repeatable in the descriptor
    #[serde(default, deserialize_with = "flag")]
    pub repeat: bool,
}

/// Declared output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFileDecl {
    /// Output name, also the file the tool writes
    pub name: String,
    /// Ordinal, flag name, or `STDOUT`
    #[serde(rename = "CL", deserialize_with = "scalar_string")]
    pub cl: String,
    /// File type tag
    #[serde(default)]
    pub format: String,
    /// Human label
    #[serde(default)]
    pub label: String,
    /// Help text
    #[serde(default)]
    pub help: String,
    /// Test directive (`diff:2`, `sim_size:0.1`, ...)
    #[serde(default)]
    pub test: String,
}

/// Declared scalar parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalParamDecl {
    /// Parameter name
    pub name: String,
    /// Ordinal or flag name
    #[serde(rename = "CL", deserialize_with = "scalar_string")]
    pub cl: String,
    /// Sample value
    #[serde(default, deserialize_with = "scalar_string")]
    pub value: String,
    /// Type tag
    #[serde(rename = "type", default = "default_type")]
    pub type_tag: String,
    /// Human label
    #[serde(default)]
    pub label: String,
    /// Help text
    #[serde(default)]
    pub help: String,
    /// Literal flag spelling
    #[serde(rename = "override", default)]
    pub override_flag: String,
    /// Repeatable in the descriptor
    #[serde(default, deserialize_with = "flag")]
    pub repeat: bool,
}

/// Declared select parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectParamDecl {
    /// Parameter name
    pub name: String,
    /// Ordinal or flag name
    #[serde(rename = "CL", deserialize_with = "scalar_string")]
    pub cl: String,
    /// Option values; the first is the sample value
    #[serde(default)]
    pub value: Vec<String>,
    /// Option display texts, parallel to `value`
    #[serde(default)]
    pub texts: Vec<String>,
    /// Type tag
    #[serde(rename = "type", default = "default_select_type")]
    pub type_tag: String,
    /// Human label
    #[serde(default)]
    pub label: String,
    /// Help text
    #[serde(default)]
    pub help: String,
    /// Literal flag spelling
    #[serde(rename = "override", default)]
    pub override_flag: String,
}

/// Declared discovered-output collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDecl {
    /// Collection name, also the directory the tool writes into
    pub name: String,
    /// Collection type (`list`, `paired`, ...)
    #[serde(default = "default_collection_kind")]
    pub kind: String,
    /// Human label
    #[serde(default)]
    pub label: String,
    /// Discovery pattern
    #[serde(default = "default_discover")]
    pub discover: String,
}

fn default_type() -> String {
    "text".to_string()
}

fn default_select_type() -> String {
    "selecttext".to_string()
}

fn default_collection_kind() -> String {
    "list".to_string()
}

fn default_discover() -> String {
    "__name_and_ext__".to_string()
}

/// One raw declaration of any kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterDeclaration {
    /// Input file
    InputFile(InputFileDecl),
    /// Output file
    OutputFile(OutputFileDecl),
    /// Scalar parameter
    Additional(AdditionalParamDecl),
    /// Select parameter
    Select(SelectParamDecl),
}

impl ParameterDeclaration {
    /// Declared name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::InputFile(d) => &d.name,
            Self::OutputFile(d) => &d.name,
            Self::Additional(d) => &d.name,
            Self::Select(d) => &d.name,
        }
    }
}

/// Every declaration of one generation run, grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationSet {
    /// Input files
    #[serde(default)]
    pub inputs: Vec<InputFileDecl>,
    /// Output files
    #[serde(default)]
    pub outputs: Vec<OutputFileDecl>,
    /// Scalar parameters
    #[serde(default)]
    pub additional: Vec<AdditionalParamDecl>,
    /// Select parameters
    #[serde(default)]
    pub selects: Vec<SelectParamDecl>,
    /// Discovered-output collections
    #[serde(default)]
    pub collections: Vec<CollectionDecl>,
}

impl DeclarationSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration
    pub fn push(&mut self, decl: ParameterDeclaration) {
        match decl {
            ParameterDeclaration::InputFile(d) => self.inputs.push(d),
            ParameterDeclaration::OutputFile(d) => self.outputs.push(d),
            ParameterDeclaration::Additional(d) => self.additional.push(d),
            ParameterDeclaration::Select(d) => self.selects.push(d),
        }
    }

    /// Add a declaration, builder style
    #[must_use]
    pub fn with(mut self, decl: ParameterDeclaration) -> Self {
        self.push(decl);
        self
    }

    /// Add a collection, builder style
    #[must_use]
    pub fn with_collection(mut self, collection: CollectionDecl) -> Self {
        self.collections.push(collection);
        self
    }

    /// Parse repeatable JSON arguments, one object per element. Blank
    /// elements are skipped.
    ///
    /// # Errors
    ///
    /// Returns `MalformedParameter` naming the flag when an element is not a
    /// valid declaration object
    pub fn from_json_args(
        inputs: &[String],
        outputs: &[String],
        additional: &[String],
        selects: &[String],
        collections: &[String],
    ) -> CoreResult<Self> {
        Ok(Self {
            inputs: parse_all("input_files", inputs)?,
            outputs: parse_all("output_files", outputs)?,
            additional: parse_all("additional_parameters", additional)?,
            selects: parse_all("selecttext_parameters", selects)?,
            collections: parse_all("collection", collections)?,
        })
    }

    /// Total number of command-line parameters (collections excluded)
    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.len() + self.outputs.len() + self.additional.len() + self.selects.len()
    }

    /// Whether no command-line parameter is declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_all<T: for<'de> Deserialize<'de>>(flag: &str, raw: &[String]) -> CoreResult<Vec<T>> {
    raw.iter()
        .filter(|s| s.trim().len() > 1)
        .map(|s| {
            serde_json::from_str(s).map_err(|e| {
                CoreError::malformed(flag, format!("not a declaration object ({}): {}", e, s))
            })
        })
        .collect()
}

/// Accept strings, numbers and booleans, keeping their textual form
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!("expected a scalar, got {}", other))),
    }
}

/// Accept `"1"`/`"0"`, `"true"`/`"false"`, booleans and 0/1
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_i64().is_some_and(|v| v != 0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "" | "0" | "false" | "no" => Ok(false),
            other => Err(de::Error::custom(format!("not a flag: {:?}", other))),
        },
        Value::Null => Ok(false),
        other => Err(de::Error::custom(format!("not a flag: {}", other))),
    }
}
