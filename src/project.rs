// src/project.rs

//! The concrete mini-program build: turns a validated [`ConfigFile`] into a
//! task registry, a composer and the default watch bindings.
//!
//! The set of tasks is closed ([`TaskKind`]); configuration only changes
//! their inputs and the shape of the build graph.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::compose::{Composer, GraphExpr, task};
use crate::config::{ConfigFile, EnvLoader};
use crate::context::BuildContext;
use crate::pipeline::stages::{ExternalCommand, PathRemap, Prepend, RenameExtension};
use crate::pipeline::{GlobPattern, Pipeline};
use crate::task::{
    CleanTask, CommandTask, InjectTask, PipelineTask, ProjectConfigTask, Task, TaskRegistry,
};
use crate::watch::WatchBinding;

/// Every task a project registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    Clean,
    ProjectConfig,
    Static,
    Markup,
    Style,
    Compile,
    Inject,
}

impl TaskKind {
    pub const ALL: [TaskKind; 7] = [
        TaskKind::Clean,
        TaskKind::ProjectConfig,
        TaskKind::Static,
        TaskKind::Markup,
        TaskKind::Style,
        TaskKind::Compile,
        TaskKind::Inject,
    ];

    /// Name used in graph expressions and logs.
    pub fn name(self) -> &'static str {
        match self {
            TaskKind::Clean => "clean",
            TaskKind::ProjectConfig => "project_config",
            TaskKind::Static => "static",
            TaskKind::Markup => "markup",
            TaskKind::Style => "style",
            TaskKind::Compile => "compile",
            TaskKind::Inject => "inject",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fully wired build session.
#[derive(Debug)]
pub struct Project {
    composer: Arc<Composer>,
    build_graph: GraphExpr,
    bindings: Vec<WatchBinding>,
    ctx: BuildContext,
    use_hash: bool,
}

impl Project {
    pub fn new(cfg: &ConfigFile, ctx: BuildContext, env: EnvLoader) -> Result<Self> {
        let mut registry = TaskRegistry::new();
        for kind in TaskKind::ALL {
            registry.register_arc(build_task(kind, cfg, &ctx, &env)?)?;
        }

        let composer = Composer::new(registry)
            .with_task_timeout(cfg.graph.task_timeout_secs.map(Duration::from_secs));

        Ok(Self {
            composer: Arc::new(composer),
            build_graph: cfg.build_graph.clone(),
            bindings: default_bindings(cfg)?,
            ctx,
            use_hash: cfg.watch.use_hash,
        })
    }

    pub fn composer(&self) -> &Arc<Composer> {
        &self.composer
    }

    pub fn build_graph(&self) -> &GraphExpr {
        &self.build_graph
    }

    pub fn bindings(&self) -> &[WatchBinding] {
        &self.bindings
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// Human-readable plan: graph, tasks and watch bindings.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("build: {}\n\n", self.build_graph));

        out.push_str(&format!("tasks ({}):\n", self.composer.registry().len()));
        for task in self.composer.registry().iter() {
            out.push_str(&format!("  - {}\n", task.describe()));
        }

        out.push_str(&format!("\nwatch ({}):\n", self.bindings.len()));
        for binding in &self.bindings {
            out.push_str(&format!(
                "  - {}: {:?} -> {}\n",
                binding.name(),
                binding.matcher().include(),
                binding.target()
            ));
        }
        out
    }
}

fn build_task(
    kind: TaskKind,
    cfg: &ConfigFile,
    ctx: &BuildContext,
    env: &EnvLoader,
) -> Result<Arc<dyn Task>> {
    let name = kind.name();
    let dist = cfg.paths.dist.as_str();
    let src = cfg.paths.src.as_str();

    let task: Arc<dyn Task> = match kind {
        TaskKind::Clean => Arc::new(CleanTask::new(name, dist, ctx.clone())),
        TaskKind::ProjectConfig => Arc::new(ProjectConfigTask::new(
            name,
            cfg.paths.project_config.as_str(),
            dist,
            cfg.env.miniprogram_root.as_str(),
            cfg.env.appid_var.as_str(),
            env.clone(),
            ctx.clone(),
        )),
        TaskKind::Static => {
            let source =
                GlobPattern::new(&cfg.static_files.files, &cfg.static_files.exclude, src)?;
            Arc::new(PipelineTask::new(name, Pipeline::new(source, dist), ctx.clone()))
        }
        TaskKind::Markup => {
            let source = GlobPattern::new(&cfg.markup.files, &cfg.markup.exclude, src)?;
            let pipeline = Pipeline::new(source, dist).stage(PathRemap::new(&cfg.remap.aliases)?);
            Arc::new(PipelineTask::new(name, pipeline, ctx.clone()))
        }
        TaskKind::Style => Arc::new(PipelineTask::new(name, style_pipeline(cfg, ctx)?, ctx.clone())),
        TaskKind::Compile => Arc::new(CommandTask::new(
            name,
            cfg.compile.commands.clone(),
            ctx.clone(),
        )),
        TaskKind::Inject => Arc::new(InjectTask::new(
            name,
            cfg.paths.global_config.as_str(),
            cfg.env.prefix.as_str(),
            cfg.env.strict_placeholders,
            env.clone(),
            ctx.clone(),
        )),
    };
    Ok(task)
}

/// remap aliases -> prepend variables import -> external compilers -> rename.
fn style_pipeline(cfg: &ConfigFile, ctx: &BuildContext) -> Result<Pipeline> {
    let source = GlobPattern::new(&cfg.style.files, &cfg.style.exclude, &cfg.paths.src)?;
    let mut pipeline = Pipeline::new(source, &cfg.paths.dist).stage(PathRemap::new(&cfg.remap.aliases)?);

    if !cfg.style.variables.is_empty() {
        pipeline = pipeline.stage(Prepend::style_import(&cfg.style.variables));
    }
    for cmd in &cfg.style.commands {
        pipeline = pipeline.stage(ExternalCommand::new(cmd.as_str(), ctx.root()));
    }
    Ok(pipeline.stage(RenameExtension::new(cfg.style.extension.as_str())))
}

/// One binding per source category, each retriggering only its own task.
pub fn default_bindings(cfg: &ConfigFile) -> Result<Vec<WatchBinding>> {
    let no_excludes: &[String] = &[];
    Ok(vec![
        WatchBinding::new(
            "compile",
            &cfg.compile.files,
            no_excludes,
            task(TaskKind::Compile.name()),
        )?,
        WatchBinding::new(
            "markup",
            &cfg.markup.files,
            &cfg.markup.exclude,
            task(TaskKind::Markup.name()),
        )?,
        WatchBinding::new(
            "static",
            &cfg.static_files.files,
            &cfg.static_files.exclude,
            task(TaskKind::Static.name()),
        )?,
        WatchBinding::new(
            "style",
            &cfg.style.watch,
            no_excludes,
            task(TaskKind::Style.name()),
        )?,
        WatchBinding::for_paths("env", &cfg.paths.env_files, task(TaskKind::Inject.name()))?,
        WatchBinding::for_paths(
            "project_config",
            std::slice::from_ref(&cfg.paths.project_config),
            task(TaskKind::ProjectConfig.name()),
        )?,
    ])
}
