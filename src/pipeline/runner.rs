// src/pipeline/runner.rs

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::context::BuildContext;
use crate::errors::{BuildError, Result};
use crate::pipeline::glob::{GlobPattern, MatchedFile};
use crate::pipeline::record::FileRecord;
use crate::pipeline::stage::{Stage, StageOutput};

/// A record that failed somewhere in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub path: String,
    pub stage: String,
    pub message: String,
}

/// Per-record outcome inside a single run.
#[derive(Debug)]
enum RecordOutcome {
    Written(PathBuf),
    Dropped(PathBuf),
    Failed(RecordFailure),
}

/// Summary of one pipeline run.
///
/// Failures listed here are recoverable: the run itself still succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub matched: usize,
    /// Destination paths written, relative to the project root.
    pub written: Vec<PathBuf>,
    pub dropped: Vec<PathBuf>,
    pub failures: Vec<RecordFailure>,
}

impl PipelineReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Ordered stages applied to a source file-set, written under `dest`.
///
/// Stage order is fixed once built. A pipeline holds no per-run state, so
/// it can be run any number of times.
#[derive(Clone)]
pub struct Pipeline {
    source: GlobPattern,
    stages: Vec<Arc<dyn Stage>>,
    dest: PathBuf,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<&str> = self.stages.iter().map(|s| s.name()).collect();
        f.debug_struct("Pipeline")
            .field("source", &self.source)
            .field("stages", &stages)
            .field("dest", &self.dest)
            .finish()
    }
}

impl Pipeline {
    pub fn new(source: GlobPattern, dest: impl Into<PathBuf>) -> Self {
        Self {
            source,
            stages: Vec::new(),
            dest: dest.into(),
        }
    }

    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn stage_arc(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn source(&self) -> &GlobPattern {
        &self.source
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Resolve the source set, push every record through all stages and
    /// write the survivors.
    ///
    /// Per-record failures, write errors included, end up in the report.
    /// Only a destination directory that cannot be created rejects the run
    /// (`BuildError::Fatal`).
    pub async fn run(&self, ctx: &BuildContext) -> Result<PipelineReport> {
        let source = self.source.clone();
        let root = ctx.root().to_path_buf();
        let files = ctx.blocking(move |fs| source.resolve(fs, &root)).await?;
        let mut report = PipelineReport {
            matched: files.len(),
            ..Default::default()
        };

        if files.is_empty() {
            debug!(dest = ?self.dest, "no source files matched; nothing to write");
            return Ok(report);
        }

        let dest_dir = ctx.resolve(&self.dest);
        let dir = dest_dir.clone();
        ctx.blocking(move |fs| fs.create_dir_all(&dir))
            .await
            .map_err(|e| {
                BuildError::Fatal(format!("destination {:?} is not writable: {e:#}", dest_dir))
            })?;

        for file in files {
            match self.process(ctx, file).await {
                RecordOutcome::Written(p) => report.written.push(p),
                RecordOutcome::Dropped(p) => report.dropped.push(p),
                RecordOutcome::Failed(failure) => {
                    warn!(
                        path = %failure.path,
                        stage = %failure.stage,
                        error = %failure.message,
                        "record failed; continuing with remaining files"
                    );
                    report.failures.push(failure);
                }
            }
        }

        if report.has_failures() {
            warn!(
                failed = report.failures.len(),
                written = report.written.len(),
                "pipeline finished with recoverable errors"
            );
        } else {
            info!(written = report.written.len(), dest = ?self.dest, "pipeline finished");
        }

        Ok(report)
    }

    async fn process(&self, ctx: &BuildContext, file: MatchedFile) -> RecordOutcome {
        let rel = file.relative.to_string_lossy().replace('\\', "/");
        let failed = |stage: &str, e: anyhow::Error| {
            RecordOutcome::Failed(RecordFailure {
                path: rel.clone(),
                stage: stage.to_string(),
                message: format!("{e:#}"),
            })
        };

        let src = file.path.clone();
        let contents = match ctx.blocking(move |fs| fs.read(&src)).await {
            Ok(c) => c,
            Err(e) => return failed("read", e),
        };

        let mut record = FileRecord::new(self.source.base(), &file.relative, contents);
        for stage in &self.stages {
            match stage.apply(record).await {
                Ok(StageOutput::Emit(next)) => record = next,
                Ok(StageOutput::Drop) => {
                    debug!(path = %rel, stage = stage.name(), "record dropped");
                    return RecordOutcome::Dropped(file.relative);
                }
                Err(e) => return failed(stage.name(), e),
            }
        }

        let rel_out = self.dest.join(record.relative());
        let out_path = ctx.resolve(&rel_out);
        let contents = record.into_contents();
        if let Err(e) = ctx.blocking(move |fs| fs.write(&out_path, &contents)).await {
            return failed("write", e);
        }
        debug!(from = %rel, to = ?rel_out, "wrote record");
        RecordOutcome::Written(rel_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FileSystem;
    use crate::fs::mock::MockFileSystem;
    use crate::pipeline::stage::StageFuture;
    use crate::pipeline::stages::RenameExtension;
    use anyhow::bail;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Fails any record containing `BROKEN`, drops records containing `SKIP`.
    struct Picky;

    impl Stage for Picky {
        fn name(&self) -> &str {
            "picky"
        }

        fn apply(&self, record: FileRecord) -> StageFuture<'_> {
            Box::pin(async move {
                let text = record.text()?;
                if text.contains("BROKEN") {
                    bail!("syntax error in {}", record.display_path());
                }
                if text.contains("SKIP") {
                    return Ok(StageOutput::Drop);
                }
                Ok(StageOutput::Emit(record))
            })
        }
    }

    fn ctx(fs: &MockFileSystem) -> BuildContext {
        BuildContext::new(".", Arc::new(fs.clone()))
    }

    fn less_pipeline() -> Pipeline {
        let source = GlobPattern::new(&["src/**/*.less".to_string()], &[], "src").unwrap();
        Pipeline::new(source, "dist")
            .stage(Picky)
            .stage(RenameExtension::new("wxss"))
    }

    #[tokio::test]
    async fn one_bad_record_does_not_abort_the_batch() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/a.less", "a{}");
        fs.add_file("./src/b.less", "BROKEN");
        fs.add_file("./src/pages/c.less", "c{}");

        let report = less_pipeline().run(&ctx(&fs)).await.unwrap();

        assert_eq!(report.matched, 3);
        assert_eq!(report.written.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, "b.less");
        assert_eq!(report.failures[0].stage, "picky");
        assert!(fs.is_file(Path::new("./dist/a.wxss")));
        assert!(fs.is_file(Path::new("./dist/pages/c.wxss")));
        assert!(!fs.exists(Path::new("./dist/b.wxss")));
    }

    #[tokio::test]
    async fn empty_source_set_succeeds_with_no_writes() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/index.wxml", "<view/>");

        let report = less_pipeline().run(&ctx(&fs)).await.unwrap();

        assert_eq!(report, PipelineReport::default());
        assert!(!fs.exists(Path::new("./dist")));
    }

    #[tokio::test]
    async fn dropped_records_are_not_written() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/a.less", "SKIP");

        let report = less_pipeline().run(&ctx(&fs)).await.unwrap();

        assert_eq!(report.dropped, vec![PathBuf::from("a.less")]);
        assert!(report.written.is_empty());
    }

    #[tokio::test]
    async fn unwritable_destination_is_fatal() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/a.less", "a{}");
        fs.deny_writes_under("./dist");

        let err = less_pipeline().run(&ctx(&fs)).await.unwrap_err();
        assert!(err.is_fatal(), "expected fatal error, got {err:?}");
    }

    #[tokio::test]
    async fn failed_write_is_recorded_and_later_files_still_land() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/a.less", "a{}");
        fs.add_file("./src/locked/b.less", "b{}");
        fs.add_file("./src/z.less", "z{}");
        fs.deny_writes_under("./dist/locked");

        let report = less_pipeline().run(&ctx(&fs)).await.unwrap();

        assert_eq!(report.written.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, "locked/b.less");
        assert_eq!(report.failures[0].stage, "write");
        assert!(fs.is_file(Path::new("./dist/a.wxss")));
        assert!(fs.is_file(Path::new("./dist/z.wxss")));
        assert!(!fs.exists(Path::new("./dist/locked/b.wxss")));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn file_io_yields_to_sibling_tasks() {
        let fs = MockFileSystem::new();
        for name in ["a", "b", "c", "d"] {
            fs.add_file(format!("./src/{name}.png"), "PNG");
        }
        let source = GlobPattern::new(&["src/**/*.png".to_string()], &[], "src").unwrap();
        let copy = Pipeline::new(source, "dist");
        let ctx = ctx(&fs);
        let done = AtomicBool::new(false);

        let run = async {
            copy.run(&ctx).await.unwrap();
            done.store(true, Ordering::SeqCst);
        };
        let sibling = async {
            tokio::task::yield_now().await;
            !done.load(Ordering::SeqCst)
        };
        let ((), interleaved) = tokio::join!(run, sibling);

        assert!(interleaved, "a stage-less copy ran to completion without yielding");
        assert_eq!(fs.file_paths().iter().filter(|p| p.starts_with("./dist")).count(), 4);
    }

    #[tokio::test]
    async fn rerunning_yields_the_same_output() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/a.less", "a{}");
        let pipeline = less_pipeline();

        let first = pipeline.run(&ctx(&fs)).await.unwrap();
        let snapshot = fs.file_paths();
        let second = pipeline.run(&ctx(&fs)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(snapshot, fs.file_paths());
    }
}
