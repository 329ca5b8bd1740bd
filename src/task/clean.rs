// src/task/clean.rs

use std::path::PathBuf;

use tracing::info;

use crate::context::BuildContext;
use crate::errors::BuildError;

use super::{Task, TaskFuture, TaskName, TaskReport};

/// Removes a directory tree. An already-absent directory is a success.
#[derive(Debug, Clone)]
pub struct CleanTask {
    name: TaskName,
    dir: PathBuf,
    ctx: BuildContext,
}

impl CleanTask {
    pub fn new(name: impl Into<TaskName>, dir: impl Into<PathBuf>, ctx: BuildContext) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            ctx,
        }
    }
}

impl Task for CleanTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!("{}: remove {:?}", self.name, self.dir)
    }

    fn invoke(&self) -> TaskFuture<'_> {
        Box::pin(async move {
            let path = self.ctx.resolve(&self.dir);
            self.ctx
                .blocking(move |fs| fs.remove_dir_all(&path))
                .await
                .map_err(|e| BuildError::task_failed(&self.name, format!("{e:#}")))?;
            info!(task = %self.name, dir = ?self.dir, "removed output directory");
            Ok(TaskReport::Done)
        })
    }
}
