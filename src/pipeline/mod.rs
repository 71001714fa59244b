//! Clone and scan pipeline
//!
//! Coordinators for the two gated phases, the on-disk layout they share, and
//! the orchestrator that runs them scope by scope.

pub mod clone;
pub mod error;
pub mod layout;
pub mod orchestrator;
pub mod preflight;
pub mod runner;
pub mod scan;
pub mod tools;

pub use clone::{CloneCoordinator, CloneOutcome, ClonedTarget};
pub use error::{PipelineError, PipelineResult};
pub use layout::{ScopeRoot, WorkLayout};
pub use orchestrator::{Pipeline, PipelineReport, ScopeRun};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use scan::{ScanCoordinator, ScanOutcome, ScanStatus, ScannedTarget};
pub use tools::{Tool, ToolPaths, ToolSelection, ToolSet};
