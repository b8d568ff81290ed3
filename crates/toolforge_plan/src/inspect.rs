//! Read declared inputs and outputs back out of descriptor XML.

use crate::error::{DescriptorError, DescriptorResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// A declared data input or output
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclaredData {
    /// Parameter or output name
    pub name: String,
    /// Format attribute
    pub format: String,
}

/// Data inputs, data outputs and collections declared by a descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredIo {
    /// `<param type="data">` nodes under `<inputs>`, repeats included
    pub inputs: Vec<DeclaredData>,
    /// `<data>` nodes under `<outputs>`
    pub outputs: Vec<DeclaredData>,
    /// `<collection>` names under `<outputs>`
    pub collections: Vec<String>,
}

/// Parse a descriptor and list what it declares
///
/// # Errors
///
/// Returns `Parse` for malformed XML
pub fn declared_io(xml: &str) -> DescriptorResult<DeclaredIo> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut io = DeclaredIo::default();
    let mut stack: Vec<String> = Vec::new();
    loop {
        let event = reader
            .read_event()
            .map_err(|e| DescriptorError::Parse(format!("at byte {}: {}", reader.buffer_position(), e)))?;
        match event {
            Event::Start(e) => {
                record(&e, &stack, &mut io)?;
                stack.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Event::Empty(e) => record(&e, &stack, &mut io)?,
            Event::End(_) => {
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(io)
}

fn record(e: &BytesStart<'_>, stack: &[String], io: &mut DeclaredIo) -> DescriptorResult<()> {
    let within = |section: &str| stack.iter().any(|s| s == section);
    match e.name().as_ref() {
        b"param" if within("inputs") => {
            if attr(e, "type")?.as_deref() == Some("data") {
                io.inputs.push(declared(e)?);
            }
        }
        b"data" if within("outputs") => io.outputs.push(declared(e)?),
        b"collection" if within("outputs") => {
            io.collections.push(attr(e, "name")?.unwrap_or_default());
        }
        _ => {}
    }
    Ok(())
}

fn declared(e: &BytesStart<'_>) -> DescriptorResult<DeclaredData> {
    Ok(DeclaredData {
        name: attr(e, "name")?.unwrap_or_default(),
        format: attr(e, "format")?.unwrap_or_default(),
    })
}

fn attr(e: &BytesStart<'_>, key: &str) -> DescriptorResult<Option<String>> {
    for a in e.attributes() {
        let a = a.map_err(|err| DescriptorError::Parse(err.to_string()))?;
        if a.key.as_ref() == key.as_bytes() {
            let value = a
                .unescape_value()
                .map_err(|err| DescriptorError::Parse(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::DescriptorBuilder;
    use crate::render::render;
    use crate::testutil::{meta, sample_decls};
    use std::collections::BTreeSet;
    use toolforge_core::CallingConvention;
    use toolforge_tool::{normalize, synthesize, CollectionDecl, ProgramSpec};

    #[test]
    fn test_round_trip_preserves_names_and_formats() {
        let params = normalize(&sample_decls(), CallingConvention::Argparse).unwrap();
        let program = ProgramSpec::resolve(Some("python3"), "", None).unwrap();
        let spec = synthesize(CallingConvention::Argparse, &program, &params, "").unwrap();
        let out = DescriptorBuilder::new(meta())
            .with_collections(vec![CollectionDecl {
                name: "pieces".to_string(),
                kind: "list".to_string(),
                label: String::new(),
                discover: "__name_and_ext__".to_string(),
            }])
            .build(&params, &spec)
            .unwrap();
        let io = declared_io(&render(&out.descriptor).unwrap()).unwrap();

        let expected_inputs: BTreeSet<DeclaredData> = params
            .iter()
            .filter(|p| p.is_input())
            .map(|p| DeclaredData {
                name: p.internal_name.clone(),
                format: p.format().unwrap_or_default().to_string(),
            })
            .collect();
        let expected_outputs: BTreeSet<DeclaredData> = params
            .iter()
            .filter(|p| p.is_output())
            .map(|p| DeclaredData {
                name: p.internal_name.clone(),
                format: p.format().unwrap_or_default().to_string(),
            })
            .collect();
        assert_eq!(io.inputs.len(), expected_inputs.len());
        assert_eq!(io.inputs.into_iter().collect::<BTreeSet<_>>(), expected_inputs);
        assert_eq!(io.outputs.into_iter().collect::<BTreeSet<_>>(), expected_outputs);
        assert_eq!(io.collections, vec!["pieces".to_string()]);
    }

    #[test]
    fn test_test_section_params_ignored() {
        let xml = r#"<tool id="t"><inputs><repeat name="R_a"><param name="a" type="data" format="bam"/></repeat>
            <param name="n" type="integer" value="1"/></inputs>
            <outputs><data name="o" format="txt"/></outputs>
            <tests><test><param name="a" value="a_sample"/></test></tests></tool>"#;
        let io = declared_io(xml).unwrap();
        assert_eq!(
            io.inputs,
            vec![DeclaredData {
                name: "a".to_string(),
                format: "bam".to_string()
            }]
        );
        assert_eq!(io.outputs.len(), 1);
    }

    #[test]
    fn test_malformed_xml_is_error() {
        assert!(matches!(
            declared_io("<tool><inputs></outputs></tool>").unwrap_err(),
            DescriptorError::Parse(_)
        ));
    }

    proptest::proptest! {
        #[test]
        fn prop_positional_round_trip(
            formats in proptest::collection::vec("[a-z]{2,6}", 1..6),
            outputs in 0usize..3,
        ) {
            use toolforge_tool::{DeclarationSet, InputFileDecl, OutputFileDecl, ParameterDeclaration};
            let mut decls = DeclarationSet::new();
            for (i, fmt) in formats.iter().enumerate() {
                decls.push(ParameterDeclaration::InputFile(InputFileDecl {
                    name: format!("/d/in{}", i),
                    cl: (i + 1).to_string(),
                    format: fmt.clone(),
                    label: format!("in {}", i),
                    help: String::new(),
                    repeat: false,
                }));
            }
            for j in 0..outputs {
                decls.push(ParameterDeclaration::OutputFile(OutputFileDecl {
                    name: format!("out{}", j),
                    cl: (100 + j).to_string(),
                    format: "txt".to_string(),
                    label: String::new(),
                    help: String::new(),
                    test: String::new(),
                }));
            }
            let params = normalize(&decls, CallingConvention::Positional).unwrap();
            let program = ProgramSpec::resolve(Some("cat"), "", None).unwrap();
            let spec = synthesize(CallingConvention::Positional, &program, &params, "").unwrap();
            let builder = DescriptorBuilder::new(meta());
            let first = render(&builder.build(&params, &spec).unwrap().descriptor).unwrap();
            let second = render(&builder.build(&params, &spec).unwrap().descriptor).unwrap();
            proptest::prop_assert_eq!(&first, &second);

            let io = declared_io(&first).unwrap();
            let names: BTreeSet<String> = io.inputs.iter().map(|d| d.name.clone()).collect();
            proptest::prop_assert_eq!(names.len(), formats.len());
            for (d, fmt) in io.inputs.iter().zip(formats.iter()) {
                proptest::prop_assert_eq!(&d.format, fmt);
            }
            proptest::prop_assert_eq!(io.outputs.len(), outputs);
        }
    }
}
