// src/task/inject.rs

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::env::EnvLoader;
use crate::context::BuildContext;
use crate::errors::{BuildError, Result};
use crate::pipeline::stages::TemplateSubstitution;
use crate::pipeline::{GlobPattern, Pipeline, PipelineReport};

use super::{Task, TaskFuture, TaskName, TaskReport};

/// Rewrites a text file in place, replacing `__NAME__` placeholders with
/// environment values whose name carries `prefix`.
///
/// Unresolved placeholders become empty strings unless `strict` is set, in
/// which case they fail the task. A second run over already-substituted
/// output is a no-op.
#[derive(Debug, Clone)]
pub struct InjectTask {
    name: TaskName,
    file: String,
    prefix: String,
    strict: bool,
    env: EnvLoader,
    ctx: BuildContext,
}

impl InjectTask {
    pub fn new(
        name: impl Into<TaskName>,
        file: impl Into<String>,
        prefix: impl Into<String>,
        strict: bool,
        env: EnvLoader,
        ctx: BuildContext,
    ) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            prefix: prefix.into(),
            strict,
            env,
            ctx,
        }
    }

    async fn run(&self) -> Result<PipelineReport> {
        let env = self.env.clone();
        let root = self.ctx.root().to_path_buf();
        let snapshot = self.ctx.blocking(move |fs| env.load(fs, &root)).await?;
        let vars = Arc::new(snapshot.with_prefix(&self.prefix));
        info!(task = %self.name, count = vars.len(), prefix = %self.prefix, "injecting global variables");

        let dir = parent_dir(&self.file);
        let source = GlobPattern::single_file(&self.file, dir)?;
        let pipeline = Pipeline::new(source, dir).stage(TemplateSubstitution::new(vars, self.strict));
        pipeline.run(&self.ctx).await
    }
}

/// Parent directory of a root-relative file, `.` for top-level files.
pub(crate) fn parent_dir(file: &str) -> &Path {
    match Path::new(file).parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Single-document tasks surface their record failure as a task failure.
pub(crate) fn single_record_result(task: &str, report: PipelineReport) -> Result<TaskReport> {
    if let Some(failure) = report.failures.first() {
        return Err(BuildError::task_failed(
            task,
            format!("{} ({}): {}", failure.path, failure.stage, failure.message),
        ));
    }
    if report.matched == 0 {
        warn!(task = %task, "source file not found; nothing written");
    }
    Ok(TaskReport::Pipeline(report))
}

impl Task for InjectTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!(
            "{}: inject {}* variables into {}{}",
            self.name,
            self.prefix,
            self.file,
            if self.strict { " (strict)" } else { "" }
        )
    }

    fn invoke(&self) -> TaskFuture<'_> {
        Box::pin(async move {
            let report = self.run().await?;
            single_record_result(&self.name, report)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FileSystem;
    use crate::fs::mock::MockFileSystem;
    use std::collections::BTreeMap;

    fn inject(fs: &MockFileSystem, vars: &[(&str, &str)], strict: bool) -> InjectTask {
        let captured: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        InjectTask::new(
            "inject",
            "dist/config.js",
            "APP_",
            strict,
            EnvLoader::with_vars(vec![".env".into()], captured),
            BuildContext::new(".", Arc::new(fs.clone())),
        )
    }

    #[tokio::test]
    async fn replaces_only_prefixed_variables() {
        let fs = MockFileSystem::new();
        fs.add_file("./dist/config.js", "mode=__APP_ENV__;x=__APP_MISSING__;home=__HOME__;");
        fs.add_file("./.env", "APP_ENV=prod\n");

        inject(&fs, &[("HOME", "/root")], false).invoke().await.unwrap();

        let out = fs.read_to_string(Path::new("./dist/config.js")).unwrap();
        assert_eq!(out, "mode=prod;x=;home=;");
    }

    #[tokio::test]
    async fn second_run_leaves_output_unchanged() {
        let fs = MockFileSystem::new();
        fs.add_file("./dist/config.js", "env=__APP_ENV__");
        let task = inject(&fs, &[("APP_ENV", "prod")], false);

        task.invoke().await.unwrap();
        let once = fs.read_to_string(Path::new("./dist/config.js")).unwrap();
        task.invoke().await.unwrap();
        let twice = fs.read_to_string(Path::new("./dist/config.js")).unwrap();

        assert_eq!(once, "env=prod");
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn strict_mode_fails_the_task() {
        let fs = MockFileSystem::new();
        fs.add_file("./dist/config.js", "x=__APP_MISSING__");

        let err = inject(&fs, &[], true).invoke().await.unwrap_err();

        assert!(!err.is_fatal());
        assert!(err.to_string().contains("APP_MISSING"));
        // The document is left as it was.
        let out = fs.read_to_string(Path::new("./dist/config.js")).unwrap();
        assert_eq!(out, "x=__APP_MISSING__");
    }

    #[tokio::test]
    async fn missing_file_is_not_an_error() {
        let fs = MockFileSystem::new();
        let report = inject(&fs, &[], false).invoke().await.unwrap();
        assert_eq!(report, TaskReport::Pipeline(PipelineReport::default()));
    }
}
