// src/task/mod.rs

//! Tasks: named, invokable units of work.
//!
//! A task either wraps a [`Pipeline`](crate::pipeline::Pipeline) or performs
//! a bespoke side effect. Every task must be safe to invoke again after a
//! failed or partial run.
//!
//! - [`pipeline`] forwards a pipeline run.
//! - [`clean`] removes a directory tree.
//! - [`command`] runs shell commands in order (external compilers).
//! - [`inject`] substitutes `__NAME__` placeholders from the environment.
//! - [`project_config`] rewrites the project config document.
//! - [`registry`] keeps tasks by unique name.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::pipeline::PipelineReport;

pub mod clean;
pub mod command;
pub mod inject;
pub mod pipeline;
pub mod project_config;
pub mod registry;

pub use clean::CleanTask;
pub use command::CommandTask;
pub use inject::InjectTask;
pub use pipeline::PipelineTask;
pub use project_config::ProjectConfigTask;
pub use registry::TaskRegistry;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// What a successful invocation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskReport {
    /// A pipeline ran; its report may still carry recoverable failures.
    Pipeline(PipelineReport),
    /// A bespoke operation completed.
    Done,
}

impl TaskReport {
    pub fn recoverable_failures(&self) -> usize {
        match self {
            TaskReport::Pipeline(r) => r.failures.len(),
            TaskReport::Done => 0,
        }
    }
}

pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<TaskReport>> + Send + 'a>>;

/// A named unit the composer can schedule.
///
/// `Err` values are task failures unless [`BuildError::is_fatal`] says
/// otherwise.
///
/// [`BuildError::is_fatal`]: crate::errors::BuildError::is_fatal
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    /// One-line human description, used by `--dry-run`.
    fn describe(&self) -> String {
        self.name().to_string()
    }

    fn invoke(&self) -> TaskFuture<'_>;
}
