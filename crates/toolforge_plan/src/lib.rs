//! toolforge descriptor builder
//!
//! Maps canonical parameters and a synthesized command line into a Galaxy
//! tool descriptor, writes it as XML and reads declared inputs and outputs
//! back.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod directive;
pub mod requirement;
pub mod help;
pub mod schema;
pub mod compiler;
pub mod render;
pub mod inspect;

#[cfg(test)]
mod testutil;

pub use error::{DescriptorError, DescriptorResult};
pub use directive::CompareMode;
pub use requirement::{parse_requirements, Requirement};
pub use help::{cheetah_escape, compose_help};
pub use schema::{
    parse_citations, Citation, CitationKind, ConfigFile, InputNode, OutputNode, TestCaseBinding,
    TestSection, ToolDescriptor,
};
pub use compiler::{BuildOutput, DescriptorBuilder, Provenance, ToolMetadata};
pub use render::render;
pub use inspect::{declared_io, DeclaredData, DeclaredIo};
