// src/task/project_config.rs

use tracing::{info, warn};

use crate::config::env::EnvLoader;
use crate::context::BuildContext;
use crate::errors::Result;
use crate::pipeline::stages::JsonEdit;
use crate::pipeline::{GlobPattern, Pipeline, PipelineReport};

use super::inject::{parent_dir, single_record_result};
use super::{Task, TaskFuture, TaskName};

/// Copies the project config document into the output root, overwriting
/// `miniprogramRoot` and `appid`. All other keys are kept as they are.
#[derive(Debug, Clone)]
pub struct ProjectConfigTask {
    name: TaskName,
    file: String,
    dest: String,
    miniprogram_root: String,
    appid_var: String,
    env: EnvLoader,
    ctx: BuildContext,
}

impl ProjectConfigTask {
    pub fn new(
        name: impl Into<TaskName>,
        file: impl Into<String>,
        dest: impl Into<String>,
        miniprogram_root: impl Into<String>,
        appid_var: impl Into<String>,
        env: EnvLoader,
        ctx: BuildContext,
    ) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            dest: dest.into(),
            miniprogram_root: miniprogram_root.into(),
            appid_var: appid_var.into(),
            env,
            ctx,
        }
    }

    async fn run(&self) -> Result<PipelineReport> {
        let env = self.env.clone();
        let root = self.ctx.root().to_path_buf();
        let snapshot = self.ctx.blocking(move |fs| env.load(fs, &root)).await?;

        let mut edit = JsonEdit::new().set("miniprogramRoot", self.miniprogram_root.as_str());
        match snapshot.get(&self.appid_var) {
            Some(appid) => {
                info!(task = %self.name, appid = %appid, "setting appid");
                edit = edit.set("appid", appid);
            }
            None => warn!(
                task = %self.name,
                var = %self.appid_var,
                "appid variable is not set; keeping the document's appid"
            ),
        }

        let source = GlobPattern::single_file(&self.file, parent_dir(&self.file))?;
        Pipeline::new(source, &self.dest)
            .stage(edit)
            .run(&self.ctx)
            .await
    }
}

impl Task for ProjectConfigTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!(
            "{}: {} -> {}/ (miniprogramRoot={:?}, appid=${})",
            self.name, self.file, self.dest, self.miniprogram_root, self.appid_var
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
    use serde_json::Value;
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::Arc;

    fn task(fs: &MockFileSystem, appid: Option<&str>) -> ProjectConfigTask {
        let captured: BTreeMap<String, String> = appid
            .map(|a| BTreeMap::from([("APPID".to_string(), a.to_string())]))
            .unwrap_or_default();
        ProjectConfigTask::new(
            "project_config",
            "project.config.json",
            "dist",
            "./",
            "APPID",
            EnvLoader::with_vars(Vec::new(), captured),
            BuildContext::new(".", Arc::new(fs.clone())),
        )
    }

    fn read_json(fs: &MockFileSystem, path: &str) -> Value {
        serde_json::from_str(&fs.read_to_string(Path::new(path)).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn rewrites_root_and_appid_only() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "./project.config.json",
            r#"{"miniprogramRoot":"dist/","appid":"touristappid","compileType":"miniprogram"}"#,
        );

        task(&fs, Some("wx0001")).invoke().await.unwrap();

        let doc = read_json(&fs, "./dist/project.config.json");
        assert_eq!(doc["miniprogramRoot"], "./");
        assert_eq!(doc["appid"], "wx0001");
        assert_eq!(doc["compileType"], "miniprogram");
        // The source document is untouched.
        assert_eq!(read_json(&fs, "./project.config.json")["appid"], "touristappid");
    }

    #[tokio::test]
    async fn invoking_twice_is_idempotent() {
        let fs = MockFileSystem::new();
        fs.add_file("./project.config.json", r#"{"appid":"a"}"#);
        let t = task(&fs, Some("wx9"));

        t.invoke().await.unwrap();
        let once = fs.read_to_string(Path::new("./dist/project.config.json")).unwrap();
        t.invoke().await.unwrap();
        let twice = fs.read_to_string(Path::new("./dist/project.config.json")).unwrap();

        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn missing_appid_keeps_existing_value() {
        let fs = MockFileSystem::new();
        fs.add_file("./project.config.json", r#"{"appid":"keep-me"}"#);

        task(&fs, None).invoke().await.unwrap();

        assert_eq!(read_json(&fs, "./dist/project.config.json")["appid"], "keep-me");
    }

    #[tokio::test]
    async fn malformed_document_fails_the_task() {
        let fs = MockFileSystem::new();
        fs.add_file("./project.config.json", "{ not json");

        let err = task(&fs, Some("wx")).invoke().await.unwrap_err();
        assert!(!err.is_fatal());
    }
}
