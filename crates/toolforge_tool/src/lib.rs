//! toolforge parameter model and command-line synthesis
//!
//! Raw declarations are normalized once into canonical parameters. A
//! convention adapter then turns them into a paired command line: one
//! projection to run the tool directly, one for the descriptor template.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod param;
pub mod value;
pub mod normalize;
pub mod cmdline;
pub mod adapter;

pub use param::{
    AdditionalParamDecl, CollectionDecl, DeclarationSet, InputFileDecl, OutputFileDecl,
    ParameterDeclaration, SelectParamDecl,
};
pub use value::{ParamValue, SelectOption};
pub use normalize::{normalize, Binding, CanonicalParameter, ParameterKind};
pub use cmdline::{CommandLineSpec, ProgramSpec, TokenPair};
pub use adapter::{
    adapter_for, synthesize, ArgparseAdapter, ConventionAdapter, NoParamAdapter,
    PositionalAdapter,
};
