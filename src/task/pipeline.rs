// src/task/pipeline.rs

use crate::context::BuildContext;
use crate::pipeline::Pipeline;

use super::{Task, TaskFuture, TaskName, TaskReport};

/// Task that simply runs a pipeline and forwards its result.
#[derive(Debug, Clone)]
pub struct PipelineTask {
    name: TaskName,
    pipeline: Pipeline,
    ctx: BuildContext,
}

impl PipelineTask {
    pub fn new(name: impl Into<TaskName>, pipeline: Pipeline, ctx: BuildContext) -> Self {
        Self {
            name: name.into(),
            pipeline,
            ctx,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

impl Task for PipelineTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        let source = self.pipeline.source().matcher();
        format!(
            "{}: pipeline {:?} (exclude {:?}) stages {:?}",
            self.name,
            source.include(),
            source.exclude(),
            self.pipeline.stage_names()
        )
    }

    fn invoke(&self) -> TaskFuture<'_> {
        Box::pin(async move {
            let report = self.pipeline.run(&self.ctx).await?;
            Ok(TaskReport::Pipeline(report))
        })
    }
}
