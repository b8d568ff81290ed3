//! Shared test fixtures.

use crate::compiler::ToolMetadata;
use toolforge_tool::{
    AdditionalParamDecl, DeclarationSet, InputFileDecl, OutputFileDecl, ParameterDeclaration,
};

/// Argparse declarations: one input, one diffed output, one repeated integer
pub(crate) fn sample_decls() -> DeclarationSet {
    DeclarationSet::new()
        .with(ParameterDeclaration::InputFile(InputFileDecl {
            name: "/data/in.txt".to_string(),
            cl: "infile".to_string(),
            format: "txt".to_string(),
            label: "Input text".to_string(),
            help: String::new(),
            repeat: false,
        }))
        .with(ParameterDeclaration::OutputFile(OutputFileDecl {
            name: "outfile".to_string(),
            cl: "outfile".to_string(),
            format: "tabular".to_string(),
            label: String::new(),
            help: String::new(),
            test: "diff:2".to_string(),
        }))
        .with(ParameterDeclaration::Additional(AdditionalParamDecl {
            name: "k".to_string(),
            cl: "k".to_string(),
            value: "3".to_string(),
            type_tag: "integer".to_string(),
            label: "Count".to_string(),
            help: String::new(),
            override_flag: String::new(),
            repeat: true,
        }))
}

pub(crate) fn meta() -> ToolMetadata {
    ToolMetadata {
        name: "rev tool".to_string(),
        version: "0.01".to_string(),
        description: "reverses".to_string(),
        packages: "python:3.8".to_string(),
        help_text: String::new(),
        user_email: "me@example.org".to_string(),
        citations: String::new(),
    }
}
