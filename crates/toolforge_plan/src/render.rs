//! Galaxy tool XML writer.
//!
//! Output is fully determined by the descriptor: no timestamps, stable
//! attribute order, four-space indentation.

use crate::error::{DescriptorError, DescriptorResult};
use crate::schema::{InputNode, OutputNode, TestCaseBinding, TestSection, ToolDescriptor};
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Serialize a descriptor to XML text
///
/// # Errors
///
/// Returns error if the XML writer fails
pub fn render(desc: &ToolDescriptor) -> DescriptorResult<String> {
    let mut w = XmlWriter::new();

    for comment in &desc.comments {
        w.comment(comment)?;
    }
    w.open(
        "tool",
        &[
            ("name", desc.name.as_str()),
            ("id", desc.id.as_str()),
            ("version", desc.version.as_str()),
        ],
    )?;
    w.leaf("description", &[], &desc.description)?;

    if !desc.requirements.is_empty() {
        w.open("requirements", &[])?;
        for r in &desc.requirements {
            w.leaf(
                "requirement",
                &[("type", "package"), ("version", r.version.as_str())],
                &r.package,
            )?;
        }
        w.close("requirements")?;
    }

    w.open("stdio", &[])?;
    w.empty("exit_code", &[("range", "1:"), ("level", "fatal")])?;
    w.close("stdio")?;

    w.cdata("version_command", &desc.version_command)?;
    w.cdata("command", &desc.command)?;

    if let Some(cf) = &desc.configfile {
        w.open("configfiles", &[])?;
        w.open("configfile", &[("name", cf.name.as_str())])?;
        w.raw_cdata(&cf.text)?;
        w.close("configfile")?;
        w.close("configfiles")?;
    }

    w.open("inputs", &[])?;
    for node in &desc.inputs {
        write_input(&mut w, node)?;
    }
    w.close("inputs")?;

    w.open("outputs", &[])?;
    for node in &desc.outputs {
        write_output(&mut w, node)?;
    }
    w.close("outputs")?;

    match &desc.tests {
        TestSection::Override(text) => w.raw(text)?,
        TestSection::Generated(bindings) if bindings.is_empty() => w.empty("tests", &[])?,
        TestSection::Generated(bindings) => {
            w.open("tests", &[])?;
            w.open("test", &[])?;
            for b in bindings {
                write_binding(&mut w, b)?;
            }
            w.close("test")?;
            w.close("tests")?;
        }
    }

    w.cdata("help", &desc.help)?;

    w.open("citations", &[])?;
    for c in &desc.citations {
        w.leaf("citation", &[("type", c.kind.as_str())], &c.value)?;
    }
    w.close("citations")?;

    w.close("tool")?;
    w.finish()
}

fn write_input(w: &mut XmlWriter, node: &InputNode) -> DescriptorResult<()> {
    match node {
        InputNode::Data {
            name,
            label,
            help,
            format,
        } => w.empty(
            "param",
            &[
                ("name", name.as_str()),
                ("type", "data"),
                ("optional", "false"),
                ("label", label.as_str()),
                ("help", help.as_str()),
                ("format", format.as_str()),
                ("multiple", "false"),
            ],
        ),
        InputNode::Scalar {
            name,
            label,
            help,
            type_name,
            value,
        } if type_name == "boolean" => {
            let checked = if value == "true" { "true" } else { "false" };
            w.empty(
                "param",
                &[
                    ("name", name.as_str()),
                    ("type", "boolean"),
                    ("label", label.as_str()),
                    ("help", help.as_str()),
                    ("truevalue", "true"),
                    ("falsevalue", "false"),
                    ("checked", checked),
                ],
            )
        }
        InputNode::Scalar {
            name,
            label,
            help,
            type_name,
            value,
        } => w.empty(
            "param",
            &[
                ("name", name.as_str()),
                ("type", type_name.as_str()),
                ("label", label.as_str()),
                ("help", help.as_str()),
                ("value", value.as_str()),
            ],
        ),
        InputNode::Select {
            name,
            label,
            help,
            options,
        } => {
            w.open(
                "param",
                &[
                    ("name", name.as_str()),
                    ("type", "select"),
                    ("label", label.as_str()),
                    ("help", help.as_str()),
                ],
            )?;
            for o in options {
                w.leaf("option", &[("value", o.value.as_str())], &o.text)?;
            }
            w.close("param")
        }
        InputNode::Repeat { name, title, inner } => {
            w.open("repeat", &[("name", name.as_str()), ("title", title.as_str())])?;
            write_input(w, inner)?;
            w.close("repeat")
        }
    }
}

fn write_output(w: &mut XmlWriter, node: &OutputNode) -> DescriptorResult<()> {
    match node {
        OutputNode::Data {
            name,
            format,
            label,
        } => w.empty(
            "data",
            &[
                ("name", name.as_str()),
                ("format", format.as_str()),
                ("label", label.as_str()),
                ("hidden", "false"),
            ],
        ),
        OutputNode::Collection {
            name,
            kind,
            label,
            pattern,
        } => {
            w.open(
                "collection",
                &[
                    ("name", name.as_str()),
                    ("type", kind.as_str()),
                    ("label", label.as_str()),
                ],
            )?;
            w.empty(
                "discover_datasets",
                &[
                    ("pattern", pattern.as_str()),
                    ("directory", name.as_str()),
                    ("visible", "false"),
                ],
            )?;
            w.close("collection")
        }
    }
}

fn write_binding(w: &mut XmlWriter, binding: &TestCaseBinding) -> DescriptorResult<()> {
    match binding {
        TestCaseBinding::Param { name, value } => {
            w.empty("param", &[("name", name.as_str()), ("value", value.as_str())])
        }
        TestCaseBinding::Repeat { name, bindings } => {
            w.open("repeat", &[("name", name.as_str())])?;
            for b in bindings {
                write_binding(w, b)?;
            }
            w.close("repeat")
        }
        TestCaseBinding::Output {
            name,
            file,
            compare,
        } => {
            let extra = compare.attributes();
            let mut attrs = vec![("name", name.as_str()), ("file", file.as_str())];
            attrs.extend(extra.iter().map(|(k, v)| (*k, v.as_str())));
            w.empty("output", &attrs)
        }
        TestCaseBinding::Collection { name } => w.empty("output_collection", &[("name", name.as_str())]),
    }
}

/// Indenting wrapper over the quick-xml writer
struct XmlWriter {
    inner: Writer<Vec<u8>>,
    depth: usize,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            inner: Writer::new(Vec::new()),
            depth: 0,
        }
    }

    fn newline(&mut self) -> DescriptorResult<()> {
        if self.inner.get_ref().is_empty() {
            return Ok(());
        }
        let indent = format!("\n{}", "    ".repeat(self.depth));
        self.inner
            .write_event(Event::Text(BytesText::from_escaped(indent)))?;
        Ok(())
    }

    fn start<'a>(name: &'a str, attrs: &[(&'a str, &'a str)]) -> BytesStart<'a> {
        let mut start = BytesStart::new(name);
        for (k, v) in attrs {
            start.push_attribute((*k, *v));
        }
        start
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> DescriptorResult<()> {
        self.newline()?;
        self.inner.write_event(Event::Start(Self::start(name, attrs)))?;
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self, name: &str) -> DescriptorResult<()> {
        self.depth = self.depth.saturating_sub(1);
        self.newline()?;
        self.inner.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> DescriptorResult<()> {
        self.newline()?;
        self.inner.write_event(Event::Empty(Self::start(name, attrs)))?;
        Ok(())
    }

    fn leaf(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> DescriptorResult<()> {
        self.newline()?;
        self.inner.write_event(Event::Start(Self::start(name, attrs)))?;
        self.inner.write_event(Event::Text(BytesText::new(text)))?;
        self.inner.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn cdata(&mut self, name: &str, text: &str) -> DescriptorResult<()> {
        self.newline()?;
        self.inner.write_event(Event::Start(BytesStart::new(name)))?;
        self.cdata_body(text)?;
        self.inner.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// CDATA on its own line inside an already open element
    fn raw_cdata(&mut self, text: &str) -> DescriptorResult<()> {
        self.newline()?;
        self.cdata_body(text)
    }

    /// CDATA sections cannot contain `]]>`; split around it
    fn cdata_body(&mut self, text: &str) -> DescriptorResult<()> {
        let parts: Vec<&str> = text.split("]]>").collect();
        let last = parts.len() - 1;
        for (i, part) in parts.iter().enumerate() {
            let mut chunk = String::new();
            if i > 0 {
                chunk.push('>');
            }
            chunk.push_str(part);
            if i < last {
                chunk.push_str("]]");
            }
            self.inner.write_event(Event::CData(BytesCData::new(chunk)))?;
        }
        Ok(())
    }

    fn comment(&mut self, text: &str) -> DescriptorResult<()> {
        self.newline()?;
        let safe = text.replace("--", "- -");
        self.inner
            .write_event(Event::Comment(BytesText::from_escaped(format!(" {} ", safe))))?;
        Ok(())
    }

    /// Caller-supplied markup, written unescaped
    fn raw(&mut self, text: &str) -> DescriptorResult<()> {
        self.newline()?;
        self.inner.write_event(Event::Text(BytesText::from_escaped(text)))?;
        Ok(())
    }

    fn finish(self) -> DescriptorResult<String> {
        let mut bytes = self.inner.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(|e| DescriptorError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{DescriptorBuilder, Provenance};
    use crate::testutil::{meta, sample_decls};
    use toolforge_core::CallingConvention;
    use toolforge_tool::{normalize, synthesize, ProgramSpec};

    fn render_with(builder: DescriptorBuilder) -> String {
        let params = normalize(&sample_decls(), CallingConvention::Argparse).unwrap();
        let program = ProgramSpec::resolve(Some("python3"), "", None).unwrap();
        let spec = synthesize(CallingConvention::Argparse, &program, &params, "").unwrap();
        render(&builder.build(&params, &spec).unwrap().descriptor).unwrap()
    }

    #[test]
    fn test_sections_present() {
        let xml = render_with(DescriptorBuilder::new(meta()).with_script("print(1)"));
        assert!(xml.starts_with("<tool name=\"rev tool\" id=\"revtool\" version=\"0.01\">"));
        assert!(xml.contains("<requirement type=\"package\" version=\"3.8\">python</requirement>"));
        assert!(xml.contains("<exit_code range=\"1:\" level=\"fatal\"/>"));
        assert!(xml.contains("<command><![CDATA[python3 --infile $infile"));
        assert!(xml.contains("<configfile name=\"runme\">"));
        assert!(xml.contains("<repeat name=\"R_k\" title=\"Add as many Count as needed\">"));
        assert!(xml.contains(
            "<output name=\"outfile\" file=\"outfile_sample\" compare=\"diff\" lines_diff=\"2\"/>"
        ));
        assert!(xml.contains("<citation type=\"doi\">10.1093/bioinformatics/bts573</citation>"));
        assert!(xml.ends_with("</tool>\n"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let a = render_with(DescriptorBuilder::new(meta()));
        let b = render_with(DescriptorBuilder::new(meta()));
        assert_eq!(a, b);
    }

    #[test]
    fn test_provenance_comments_lead() {
        let xml = render_with(DescriptorBuilder::new(meta()).with_provenance(Provenance {
            author: "me@example.org".to_string(),
            timestamp: "01/01/2026 10:00:00".to_string(),
        }));
        assert!(xml.starts_with("<!-- Created by me@example.org at 01/01/2026 10:00:00"));
    }

    #[test]
    fn test_test_override_written_verbatim() {
        let xml = render_with(
            DescriptorBuilder::new(meta())
                .with_test_override("<tests>\n<test><param name=\"infile\" value=\"x\"/></test>\n</tests>"),
        );
        assert!(xml.contains("<test><param name=\"infile\" value=\"x\"/></test>"));
        assert_eq!(xml.matches("<tests>").count(), 1);
    }

    #[test]
    fn test_cdata_terminator_is_split() {
        let xml = render_with(DescriptorBuilder::new(meta()).with_command_override("echo ']]>'"));
        assert!(xml.contains("<![CDATA[echo ']]]]><![CDATA[>']]>"));
    }
}
