//! Photomark Batch Orchestrator
//!
//! Renders many files with the same settings:
//! - `orchestrator`: striped worker pool with pause, resume, cancel and retry
//! - `control`: the run signal workers wait on
//! - `progress`: remaining-time estimation
//! - `processor`: per-file work ([`FileProcessor`], [`EngineProcessor`])

pub mod control;
pub mod orchestrator;
pub mod processor;
pub mod progress;

pub use control::*;
pub use orchestrator::*;
pub use processor::*;
pub use progress::*;
