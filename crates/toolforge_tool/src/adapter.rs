//! Calling convention strategies.
//!
//! Each adapter turns the same canonical parameter list into a
//! [`CommandLineSpec`]. Redirections are pulled out first and always land
//! after the argument list.

use crate::cmdline::{CommandLineSpec, ProgramSpec, TokenPair, LOOP_END};
use crate::normalize::{Binding, CanonicalParameter, ParameterKind};
use toolforge_core::{CallingConvention, CoreError, CoreResult};

/// Builds both command lines for one calling convention
pub trait ConventionAdapter {
    /// Convention handled
    fn convention(&self) -> CallingConvention;

    /// Synthesize the paired command line
    ///
    /// # Errors
    ///
    /// Returns error when the parameter list violates the convention
    fn synthesize(
        &self,
        program: &ProgramSpec,
        params: &[CanonicalParameter],
    ) -> CoreResult<CommandLineSpec>;
}

/// `<` and `>` redirection only
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParamAdapter;

/// Ordinal positional arguments
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalAdapter;

/// Named `-x`/`--xx` flags
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgparseAdapter;

/// Adapter for a convention
#[must_use]
pub fn adapter_for(convention: CallingConvention) -> Box<dyn ConventionAdapter> {
    match convention {
        CallingConvention::NoParam => Box::new(NoParamAdapter),
        CallingConvention::Positional => Box::new(PositionalAdapter),
        CallingConvention::Argparse => Box::new(ArgparseAdapter),
    }
}

/// Synthesize with the adapter for `convention`, then append a user suffix
///
/// # Errors
///
/// Returns the adapter's error, or `InvalidConfig` for an unsplittable suffix
pub fn synthesize(
    convention: CallingConvention,
    program: &ProgramSpec,
    params: &[CanonicalParameter],
    suffix: &str,
) -> CoreResult<CommandLineSpec> {
    let spec = adapter_for(convention)
        .synthesize(program, params)?
        .with_suffix(suffix)?;
    tracing::debug!(
        convention = %convention,
        command = %spec.display_executable(),
        "command line synthesized"
    );
    Ok(spec)
}

/// Flag spelling derived from a token: one character gets one dash
#[must_use]
pub fn dashed(token: &str) -> String {
    let token = token.trim();
    if token.chars().count() == 1 {
        format!("-{}", token)
    } else {
        format!("--{}", token)
    }
}

/// Value token of a parameter in both spellings
#[must_use]
pub fn value_pair(param: &CanonicalParameter) -> TokenPair {
    let placeholder = param.placeholder();
    match &param.kind {
        ParameterKind::InputFile { path, .. } => TokenPair::new(path.as_str(), placeholder),
        ParameterKind::OutputFile { file_name, .. } => {
            TokenPair::new(file_name.as_str(), placeholder)
        }
        ParameterKind::Additional { value } | ParameterKind::Select { value } => {
            let descriptor = if value.is_quoted() {
                format!("\"{}\"", placeholder)
            } else {
                placeholder
            };
            TokenPair::new(value.sample(), descriptor)
        }
    }
}

struct Partition<'a> {
    stdin: Option<&'a CanonicalParameter>,
    stdout: Option<&'a CanonicalParameter>,
    args: Vec<&'a CanonicalParameter>,
}

fn partition(params: &[CanonicalParameter]) -> CoreResult<Partition<'_>> {
    let mut part = Partition {
        stdin: None,
        stdout: None,
        args: Vec::new(),
    };
    for p in params {
        let slot = match p.binding {
            Binding::Stdin => &mut part.stdin,
            Binding::Stdout => &mut part.stdout,
            _ => {
                part.args.push(p);
                continue;
            }
        };
        if slot.is_some() {
            return Err(CoreError::malformed(
                &p.name,
                "more than one parameter bound to the same redirection",
            ));
        }
        *slot = Some(p);
    }
    Ok(part)
}

fn finish(mut spec: CommandLineSpec, part: &Partition<'_>) -> CommandLineSpec {
    spec.stdin = part.stdin.map(value_pair);
    spec.stdout = part.stdout.map(value_pair);
    spec
}

impl ConventionAdapter for NoParamAdapter {
    fn convention(&self) -> CallingConvention {
        CallingConvention::NoParam
    }

    fn synthesize(
        &self,
        program: &ProgramSpec,
        params: &[CanonicalParameter],
    ) -> CoreResult<CommandLineSpec> {
        let inputs = params.iter().filter(|p| p.is_input()).count();
        let outputs = params.iter().filter(|p| p.is_output()).count();
        let others = params.len() - inputs - outputs;
        for (kind, count, limit) in [("input", inputs, 1), ("output", outputs, 1), ("additional", others, 0)] {
            if count > limit {
                return Err(CoreError::TooManyParameters {
                    kind: kind.to_string(),
                    count,
                    limit,
                });
            }
        }

        let mut spec = CommandLineSpec::new(program);
        spec.stdin = params.iter().find(|p| p.is_input()).map(value_pair);
        spec.stdout = params.iter().find(|p| p.is_output()).map(value_pair);
        Ok(spec)
    }
}

impl ConventionAdapter for PositionalAdapter {
    fn convention(&self) -> CallingConvention {
        CallingConvention::Positional
    }

    fn synthesize(
        &self,
        program: &ProgramSpec,
        params: &[CanonicalParameter],
    ) -> CoreResult<CommandLineSpec> {
        let mut part = partition(params)?;
        // Raw ordinal strings, so "10" sorts before "2".
        part.args.sort_by(|a, b| a.cl_token.cmp(&b.cl_token));

        let mut spec = CommandLineSpec::new(program);
        for p in &part.args {
            if p.override_flag.is_some() {
                tracing::debug!(parameter = %p.name, "override has no effect on positional arguments");
            }
            spec.args.push(value_pair(p));
        }
        Ok(finish(spec, &part))
    }
}

impl ConventionAdapter for ArgparseAdapter {
    fn convention(&self) -> CallingConvention {
        CallingConvention::Argparse
    }

    fn synthesize(
        &self,
        program: &ProgramSpec,
        params: &[CanonicalParameter],
    ) -> CoreResult<CommandLineSpec> {
        let part = partition(params)?;
        let mut spec = CommandLineSpec::new(program);
        for p in &part.args {
            let flag = p
                .override_flag
                .clone()
                .unwrap_or_else(|| dashed(&p.cl_token));
            let value = value_pair(p);
            if p.repeat {
                let name = &p.internal_name;
                spec.args.push(TokenPair::new(
                    flag.clone(),
                    format!("#for $rep in $R_{}:\n{}", name, flag),
                ));
                spec.args.push(TokenPair::new(
                    value.executable,
                    format!("\"$rep.{}\"\n{}", name, LOOP_END),
                ));
            } else {
                spec.args.push(TokenPair::literal(flag));
                spec.args.push(value);
            }
        }
        Ok(finish(spec, &part))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::param::{
        AdditionalParamDecl, DeclarationSet, InputFileDecl, OutputFileDecl, ParameterDeclaration,
    };

    fn program() -> ProgramSpec {
        ProgramSpec::resolve(Some("exe"), "", None).unwrap()
    }

    fn input(path: &str, cl: &str, label: &str) -> ParameterDeclaration {
        ParameterDeclaration::InputFile(InputFileDecl {
            name: path.to_string(),
            cl: cl.to_string(),
            format: "txt".to_string(),
            label: label.to_string(),
            help: String::new(),
            repeat: false,
        })
    }

    fn output(name: &str, cl: &str) -> ParameterDeclaration {
        ParameterDeclaration::OutputFile(OutputFileDecl {
            name: name.to_string(),
            cl: cl.to_string(),
            format: "txt".to_string(),
            label: String::new(),
            help: String::new(),
            test: String::new(),
        })
    }

    fn param(name: &str, cl: &str, ty: &str, value: &str, over: &str, repeat: bool) -> ParameterDeclaration {
        ParameterDeclaration::Additional(AdditionalParamDecl {
            name: name.to_string(),
            cl: cl.to_string(),
            value: value.to_string(),
            type_tag: ty.to_string(),
            label: String::new(),
            help: String::new(),
            override_flag: over.to_string(),
            repeat,
        })
    }

    fn build(decls: DeclarationSet, conv: CallingConvention) -> CoreResult<CommandLineSpec> {
        let params = normalize(&decls, conv)?;
        synthesize(conv, &program(), &params, "")
    }

    #[test]
    fn test_positional_scenario() {
        let decls = DeclarationSet::new()
            .with(output("out.txt", "2"))
            .with(input("/data/in.txt", "1", "input"));
        let spec = build(decls, CallingConvention::Positional).unwrap();
        assert_eq!(spec.executable_tokens(), vec!["exe", "/data/in.txt", "out.txt"]);
        assert_eq!(spec.descriptor_tokens(), vec!["exe", "$input", "$out_txt"]);
    }

    #[test]
    fn test_positional_sort_is_lexicographic() {
        let decls = DeclarationSet::new()
            .with(param("a", "2", "integer", "2", "", false))
            .with(param("b", "10", "integer", "10", "", false));
        let spec = build(decls, CallingConvention::Positional).unwrap();
        assert_eq!(spec.executable_tokens(), vec!["exe", "10", "2"]);
    }

    #[test]
    fn test_positional_redirects_last() {
        let decls = DeclarationSet::new()
            .with(input("/in", "STDIN", "reads"))
            .with(output("res", "STDOUT"))
            .with(param("k", "1", "text", "a b", "", false));
        let spec = build(decls, CallingConvention::Positional).unwrap();
        assert_eq!(spec.executable_tokens(), vec!["exe", "a b", "<", "/in", ">", "res"]);
        assert_eq!(spec.descriptor_tokens(), vec!["exe", "\"$k\"", "<", "$reads", ">", "$res"]);
    }

    #[test]
    fn test_no_param_scenario() {
        let decls = DeclarationSet::new()
            .with(input("/in", "STDIN", "infile"))
            .with(output("out", "STDOUT"));
        let spec = build(decls, CallingConvention::NoParam).unwrap();
        assert_eq!(spec.executable_tokens(), vec!["exe", "<", "/in", ">", "out"]);
        assert_eq!(spec.descriptor_tokens(), vec!["exe", "<", "$infile", ">", "$out"]);
    }

    #[test]
    fn test_no_param_without_output_omits_redirect() {
        let decls = DeclarationSet::new().with(input("/in", "1", "infile"));
        let spec = build(decls, CallingConvention::NoParam).unwrap();
        assert_eq!(spec.executable_tokens(), vec!["exe", "<", "/in"]);
        assert!(!spec.descriptor_tokens().contains(&">".to_string()));
    }

    #[test]
    fn test_no_param_rejects_two_inputs() {
        let decls = DeclarationSet::new()
            .with(input("/a", "1", "a"))
            .with(input("/b", "2", "b"));
        assert!(matches!(
            build(decls, CallingConvention::NoParam).unwrap_err(),
            CoreError::TooManyParameters { .. }
        ));
    }

    #[test]
    fn test_argparse_scenario() {
        let decls = DeclarationSet::new().with(param("threshold", "t", "integer", "5", "", false));
        let spec = build(decls, CallingConvention::Argparse).unwrap();
        assert_eq!(spec.descriptor_tokens(), vec!["exe", "-t", "$threshold"]);
        assert_eq!(spec.executable_tokens(), vec!["exe", "-t", "5"]);
    }

    #[test]
    fn test_argparse_dashes_and_override() {
        assert_eq!(dashed("x"), "-x");
        assert_eq!(dashed("xx"), "--xx");
        for cl in ["x", "xx"] {
            let decls = DeclarationSet::new().with(param("p", cl, "text", "v", "-o", false));
            let spec = build(decls, CallingConvention::Argparse).unwrap();
            assert_eq!(spec.executable_tokens()[1], "-o");
            assert_eq!(spec.descriptor_tokens()[1], "-o");
        }
    }

    #[test]
    fn test_argparse_repeat_scenario() {
        let decls = DeclarationSet::new()
            .with(param("k", "k", "integer", "3", "", true))
            .with(input("/in", "infile", "in"));
        let spec = build(decls, CallingConvention::Argparse).unwrap();
        assert_eq!(spec.executable_tokens(), vec!["exe", "--infile", "/in", "--k", "3"]);
        assert_eq!(spec.executable_tokens().len(), spec.descriptor_tokens().len());
        assert_eq!(
            spec.descriptor_command(),
            "exe --infile $infile #for $rep in $R_k:\n--k \"$rep.k\"\n#end for"
        );
    }

    #[test]
    fn test_argparse_stdin_input_is_never_looped() {
        let decls = DeclarationSet::new().with(ParameterDeclaration::InputFile(InputFileDecl {
            name: "/data/reads.fq".to_string(),
            cl: "STDIN".to_string(),
            format: "fastq".to_string(),
            label: "reads".to_string(),
            help: String::new(),
            repeat: true,
        }));
        let spec = build(decls, CallingConvention::Argparse).unwrap();
        assert_eq!(spec.descriptor_command(), "exe < $reads");
        assert!(!spec.descriptor_command().contains("#for"));
    }

    #[test]
    fn test_adapter_for_reports_convention() {
        for conv in [
            CallingConvention::NoParam,
            CallingConvention::Positional,
            CallingConvention::Argparse,
        ] {
            assert_eq!(adapter_for(conv).convention(), conv);
        }
    }

    proptest::proptest! {
        #[test]
        fn prop_positional_one_pair_per_parameter(ordinals in proptest::collection::btree_set(0u32..500, 0..12)) {
            let mut decls = DeclarationSet::new();
            for (i, ord) in ordinals.iter().enumerate() {
                if i % 2 == 0 {
                    decls.push(input(&format!("/data/f{}", i), &ord.to_string(), ""));
                } else {
                    decls.push(param(&format!("p{}", i), &ord.to_string(), "integer", "1", "", false));
                }
            }
            let spec = build(decls, CallingConvention::Positional).unwrap();
            proptest::prop_assert_eq!(spec.executable_tokens().len(), spec.descriptor_tokens().len());
            proptest::prop_assert_eq!(spec.args.len(), ordinals.len());
        }

        #[test]
        fn prop_argparse_flag_dashes(name in "[a-z][a-z0-9_]{0,8}") {
            let flag = dashed(&name);
            if name.len() == 1 {
                proptest::prop_assert_eq!(flag, format!("-{}", name));
            } else {
                proptest::prop_assert_eq!(flag, format!("--{}", name));
            }
        }
    }
}
