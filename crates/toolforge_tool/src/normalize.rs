//! Parameter model: raw declarations to canonical parameters.
//!
//! Everything past this boundary addresses parameter data by named field.
//! Positional ordinals are validated here, internal names are derived and
//! de-duplicated here, and the original token is preserved alongside the
//! descriptor-facing one.

use crate::param::{
    AdditionalParamDecl, DeclarationSet, InputFileDecl, OutputFileDecl, SelectParamDecl,
};
use crate::value::ParamValue;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use toolforge_core::{CallingConvention, CoreError, CoreResult};

/// Sentinel binding an input to standard input
pub const STDIN: &str = "STDIN";
/// Sentinel binding an output to standard output
pub const STDOUT: &str = "STDOUT";

/// How a parameter reaches the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Binding {
    /// Redirected from standard input
    Stdin,
    /// Redirected to standard output
    Stdout,
    /// Positional argument; the raw ordinal string is the sort key
    Ordinal(u32),
    /// Named flag
    Flag,
}

impl Binding {
    /// Whether the parameter is handled by redirection
    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        matches!(self, Self::Stdin | Self::Stdout)
    }
}

/// Kind-specific payload of a canonical parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterKind {
    /// Input file
    InputFile {
        /// Sample path
        path: String,
        /// File type tag
        format: String,
    },
    /// Output file
    OutputFile {
        /// File name the tool writes
        file_name: String,
        /// File type tag
        format: String,
        /// Raw test directive
        test: String,
    },
    /// Scalar parameter
    Additional {
        /// Typed value
        value: ParamValue,
    },
    /// Select parameter
    Select {
        /// Typed value, always [`ParamValue::SelectText`]
        value: ParamValue,
    },
}

/// A normalized parameter, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalParameter {
    /// Declared name
    pub name: String,
    /// Sanitized, collision-free identifier used for substitution and sample
    /// file names
    pub internal_name: String,
    /// Descriptor-facing token
    pub cl_token: String,
    /// Token exactly as declared
    pub original_cl_token: String,
    /// How the parameter reaches the command line
    pub binding: Binding,
    /// Human label
    pub label: String,
    /// Help text
    pub help: String,
    /// Repeatable group
    pub repeat: bool,
    /// Literal flag spelling
    pub override_flag: Option<String>,
    /// Kind-specific payload
    pub kind: ParameterKind,
}

impl CanonicalParameter {
    /// Input file?
    #[must_use]
    pub fn is_input(&self) -> bool {
        matches!(self.kind, ParameterKind::InputFile { .. })
    }

    /// Output file?
    #[must_use]
    pub fn is_output(&self) -> bool {
        matches!(self.kind, ParameterKind::OutputFile { .. })
    }

    /// File type tag for file parameters
    #[must_use]
    pub fn format(&self) -> Option<&str> {
        match &self.kind {
            ParameterKind::InputFile { format, .. } | ParameterKind::OutputFile { format, .. } => {
                Some(format)
            }
            _ => None,
        }
    }

    /// Typed value for scalar and select parameters
    #[must_use]
    pub fn value(&self) -> Option<&ParamValue> {
        match &self.kind {
            ParameterKind::Additional { value } | ParameterKind::Select { value } => Some(value),
            _ => None,
        }
    }

    /// Label shown in the descriptor. Inputs fall back to the raw token,
    /// everything else to the name.
    #[must_use]
    pub fn display_label(&self) -> &str {
        if !self.label.is_empty() {
            &self.label
        } else if self.is_input() {
            &self.original_cl_token
        } else {
            &self.name
        }
    }

    /// Descriptor substitution variable, `$internal_name`
    #[must_use]
    pub fn placeholder(&self) -> String {
        format!("${}", self.internal_name)
    }

    /// Staged sample file name
    #[must_use]
    pub fn sample_file_name(&self) -> String {
        format!("{}{}", self.internal_name, toolforge_core::context::SAMPLE_SUFFIX)
    }
}

/// Normalize declarations for a calling convention
///
/// Output order is inputs, outputs, additional, select, each in declaration
/// order.
///
/// # Errors
///
/// * `MalformedParameter` for a bad ordinal, a misplaced or repeated sentinel,
///   a missing flag, or duplicate tokens
/// * `TooManyParameters` for excess parameters under the no-parameter
///   convention
/// * `UnsupportedParameterType` for an unknown value type
pub fn normalize(
    decls: &DeclarationSet,
    convention: CallingConvention,
) -> CoreResult<Vec<CanonicalParameter>> {
    if convention == CallingConvention::NoParam {
        check_no_param_cardinality(decls)?;
    }
    check_sentinels(decls)?;

    let mut names = NameAllocator::default();
    let mut params = Vec::with_capacity(decls.len());

    for decl in &decls.inputs {
        params.push(normalize_input(decl, convention, &mut names)?);
    }
    for decl in &decls.outputs {
        params.push(normalize_output(decl, convention, &mut names)?);
    }
    for decl in &decls.additional {
        params.push(normalize_additional(decl, convention, &mut names)?);
    }
    for decl in &decls.selects {
        params.push(normalize_select(decl, convention, &mut names)?);
    }

    check_distinct_tokens(&params, convention)?;
    tracing::debug!(
        convention = %convention,
        count = params.len(),
        "parameters normalized"
    );
    Ok(params)
}

fn check_no_param_cardinality(decls: &DeclarationSet) -> CoreResult<()> {
    let limits = [
        ("input", decls.inputs.len(), 1),
        ("output", decls.outputs.len(), 1),
        ("additional", decls.additional.len() + decls.selects.len(), 0),
    ];
    for (kind, count, limit) in limits {
        if count > limit {
            return Err(CoreError::TooManyParameters {
                kind: kind.to_string(),
                count,
                limit,
            });
        }
    }
    Ok(())
}

fn check_sentinels(decls: &DeclarationSet) -> CoreResult<()> {
    let stdin: Vec<&InputFileDecl> = decls.inputs.iter().filter(|d| is_sentinel(&d.cl, STDIN)).collect();
    if stdin.len() > 1 {
        return Err(CoreError::malformed(
            &stdin[1].name,
            "only one input may be bound to STDIN",
        ));
    }
    let stdout: Vec<&OutputFileDecl> = decls.outputs.iter().filter(|d| is_sentinel(&d.cl, STDOUT)).collect();
    if stdout.len() > 1 {
        return Err(CoreError::malformed(
            &stdout[1].name,
            "only one output may be bound to STDOUT",
        ));
    }
    if let Some(d) = decls.inputs.iter().find(|d| is_sentinel(&d.cl, STDOUT)) {
        return Err(CoreError::malformed(&d.name, "an input cannot be bound to STDOUT"));
    }
    if let Some(d) = decls.outputs.iter().find(|d| is_sentinel(&d.cl, STDIN)) {
        return Err(CoreError::malformed(&d.name, "an output cannot be bound to STDIN"));
    }
    Ok(())
}

/// Overrides only replace the flag under argparse; positional parameters
/// always occupy their ordinal.
fn check_distinct_tokens(
    params: &[CanonicalParameter],
    convention: CallingConvention,
) -> CoreResult<()> {
    let mut seen = IndexSet::new();
    for p in params {
        if p.binding.is_redirect() {
            continue;
        }
        if convention == CallingConvention::Argparse && p.override_flag.is_some() {
            continue;
        }
        let key = match p.binding {
            Binding::Ordinal(n) => n.to_string(),
            _ => p.cl_token.clone(),
        };
        if !seen.insert(key) {
            return Err(CoreError::malformed(
                &p.name,
                format!("command line token {:?} is used by more than one parameter", p.cl_token),
            ));
        }
    }
    Ok(())
}

fn is_sentinel(token: &str, sentinel: &str) -> bool {
    token.trim().eq_ignore_ascii_case(sentinel)
}

fn parse_ordinal(name: &str, token: &str) -> CoreResult<Binding> {
    let token = token.trim();
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::malformed(
            name,
            format!("positional parameters must be ordinal integers, got {:?}", token),
        ));
    }
    token
        .parse()
        .map(Binding::Ordinal)
        .map_err(|_| CoreError::malformed(name, format!("ordinal {:?} is out of range", token)))
}

fn flag_binding(name: &str, token: &str, override_flag: Option<&String>) -> CoreResult<Binding> {
    if token.trim().is_empty() && override_flag.is_none() {
        return Err(CoreError::malformed(
            name,
            "argparse parameters need a flag name or an override",
        ));
    }
    Ok(Binding::Flag)
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn drop_repeat(
    name: &str,
    repeat: bool,
    convention: CallingConvention,
    binding: &Binding,
) -> bool {
    if repeat && convention.is_ordinal() {
        tracing::warn!(
            parameter = name,
            "repeat ignored: not permitted with {} command lines",
            convention
        );
        return false;
    }
    if repeat && binding.is_redirect() {
        tracing::warn!(
            parameter = name,
            "repeat ignored: redirected parameters take a single file"
        );
        return false;
    }
    repeat
}

fn normalize_input(
    decl: &InputFileDecl,
    convention: CallingConvention,
    names: &mut NameAllocator,
) -> CoreResult<CanonicalParameter> {
    let token = decl.cl.trim();
    let binding = if convention == CallingConvention::NoParam || is_sentinel(token, STDIN) {
        Binding::Stdin
    } else if convention == CallingConvention::Positional {
        parse_ordinal(&decl.name, token)?
    } else {
        flag_binding(&decl.name, token, None)?
    };

    let base = match binding {
        Binding::Flag => token.to_string(),
        _ if !decl.label.trim().is_empty() => decl.label.trim().replace(' ', "_"),
        _ => format!("input_{}", token.to_ascii_lowercase()),
    };
    let internal_name = names.allocate(&base, "input");
    let cl_token = if binding.is_redirect() {
        internal_name.clone()
    } else {
        token.to_string()
    };

    Ok(CanonicalParameter {
        name: decl.name.clone(),
        internal_name,
        cl_token,
        original_cl_token: decl.cl.clone(),
        binding: binding.clone(),
        label: decl.label.clone(),
        help: decl.help.clone(),
        repeat: drop_repeat(&decl.name, decl.repeat, convention, &binding),
        override_flag: None,
        kind: ParameterKind::InputFile {
            path: decl.name.clone(),
            format: decl.format.clone(),
        },
    })
}

fn normalize_output(
    decl: &OutputFileDecl,
    convention: CallingConvention,
    names: &mut NameAllocator,
) -> CoreResult<CanonicalParameter> {
    let token = decl.cl.trim();
    let binding = if convention == CallingConvention::NoParam || is_sentinel(token, STDOUT) {
        Binding::Stdout
    } else if convention == CallingConvention::Positional {
        parse_ordinal(&decl.name, token)?
    } else {
        flag_binding(&decl.name, token, None)?
    };
    let internal_name = names.allocate(&decl.name, "output");
    let cl_token = if binding.is_redirect() {
        internal_name.clone()
    } else {
        token.to_string()
    };

    Ok(CanonicalParameter {
        name: decl.name.clone(),
        internal_name,
        cl_token,
        original_cl_token: decl.cl.clone(),
        binding,
        label: decl.label.clone(),
        help: decl.help.clone(),
        repeat: false,
        override_flag: None,
        kind: ParameterKind::OutputFile {
            file_name: decl.name.clone(),
            format: decl.format.clone(),
            test: decl.test.trim().to_string(),
        },
    })
}

fn scalar_binding(
    name: &str,
    token: &str,
    convention: CallingConvention,
    override_flag: Option<&String>,
) -> CoreResult<Binding> {
    match convention {
        CallingConvention::Argparse => flag_binding(name, token, override_flag),
        _ => parse_ordinal(name, token),
    }
}

fn normalize_additional(
    decl: &AdditionalParamDecl,
    convention: CallingConvention,
    names: &mut NameAllocator,
) -> CoreResult<CanonicalParameter> {
    let value = ParamValue::parse(&decl.name, &decl.type_tag, &decl.value)?;
    let override_flag = non_empty(&decl.override_flag);
    let binding = scalar_binding(&decl.name, &decl.cl, convention, override_flag.as_ref())?;

    Ok(CanonicalParameter {
        name: decl.name.clone(),
        internal_name: names.allocate(&decl.name, "param"),
        cl_token: decl.cl.trim().to_string(),
        original_cl_token: decl.cl.clone(),
        binding: binding.clone(),
        label: decl.label.clone(),
        help: decl.help.clone(),
        repeat: drop_repeat(&decl.name, decl.repeat, convention, &binding),
        override_flag,
        kind: ParameterKind::Additional { value },
    })
}

fn normalize_select(
    decl: &SelectParamDecl,
    convention: CallingConvention,
    names: &mut NameAllocator,
) -> CoreResult<CanonicalParameter> {
    let value = ParamValue::select(&decl.name, &decl.type_tag, &decl.value, &decl.texts)?;
    let override_flag = non_empty(&decl.override_flag);
    let binding = scalar_binding(&decl.name, &decl.cl, convention, override_flag.as_ref())?;

    Ok(CanonicalParameter {
        name: decl.name.clone(),
        internal_name: names.allocate(&decl.name, "param"),
        cl_token: decl.cl.trim().to_string(),
        original_cl_token: decl.cl.clone(),
        binding,
        label: decl.label.clone(),
        help: decl.help.clone(),
        repeat: false,
        override_flag,
        kind: ParameterKind::Select { value },
    })
}

/// Hands out sanitized identifiers, suffixing `_2`, `_3`, ... on collision
#[derive(Debug, Default)]
struct NameAllocator {
    used: IndexSet<String>,
}

impl NameAllocator {
    fn allocate(&mut self, base: &str, prefix: &str) -> String {
        let mut ident: String = base
            .trim()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if ident.is_empty() {
            ident = prefix.to_string();
        } else if ident.starts_with(|c: char| c.is_ascii_digit()) {
            ident = format!("{}_{}", prefix, ident);
        }

        let mut candidate = ident.clone();
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{}_{}", ident, n);
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}
