//! toolforge runtime
//!
//! Drives one generation run end to end: stage the descriptor and samples,
//! run the tool directly or through the test harness, then package and
//! report.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod executor;
pub mod harness;
pub mod report;

pub use engine::{
    select_mode, EngineConfig, GenerationMode, GenerationRequest, ToolEngine, ValidationPolicy,
};
pub use executor::{DirectExecutor, DirectRun};
pub use harness::{Harness, HarnessRun};
pub use report::{ExecutionMode, RunReport};
