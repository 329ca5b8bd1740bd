// src/pipeline/mod.rs

//! File pipelines.
//!
//! - [`record`] is the unit of data flowing through a pipeline.
//! - [`glob`] resolves include/exclude patterns to the current file set.
//! - [`stage`] defines the per-record transformation contract.
//! - [`stages`] holds the built-in stages.
//! - [`runner`] drives records through stages with per-record fault
//!   isolation and writes the results.

pub mod glob;
pub mod record;
pub mod runner;
pub mod stage;
pub mod stages;

pub use glob::{GlobPattern, MatchedFile, PathMatcher};
pub use record::FileRecord;
pub use runner::{Pipeline, PipelineReport, RecordFailure};
pub use stage::{Stage, StageFuture, StageOutput};
