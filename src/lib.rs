// src/lib.rs

pub mod cli;
pub mod compose;
pub mod config;
pub mod context;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod project;
pub mod task;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::cli::{CliArgs, Command};
use crate::compose::RunSummary;
use crate::config::{EnvLoader, default_config_path, load_or_default};
use crate::context::BuildContext;
use crate::project::Project;
use crate::watch::{WatchController, spawn_watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and the environment snapshot
/// - the project's tasks and composer
/// - a one-shot build, or build + file watcher until Ctrl-C
pub async fn run(args: CliArgs) -> Result<()> {
    let explicit = args.config.is_some();
    let config_path = args
        .config
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    let cfg = load_or_default(&config_path, explicit)?;

    let root = config_root_dir(&config_path);
    let root = root.canonicalize().unwrap_or(root);
    let env = EnvLoader::capture(cfg.paths.env_files.iter().map(PathBuf::from).collect());
    let project = Project::new(&cfg, BuildContext::on_disk(&root), env)?;

    if args.dry_run {
        println!("minibuild dry-run ({})", root.display());
        print!("{}", project.describe());
        return Ok(());
    }

    match args.command.unwrap_or_default() {
        Command::Build => {
            let summary = build(&project).await?;
            if !summary.is_success() {
                bail!("build failed: {}", summary.failed_tasks().join(", "));
            }
            Ok(())
        }
        Command::Watch => watch(project).await,
    }
}

/// Run the project's build graph once.
pub async fn build(project: &Project) -> Result<RunSummary> {
    let summary = project.composer().execute(project.build_graph()).await?;
    for failure in &summary.failures {
        error!(task = %failure.task, "{}", failure.message);
    }
    Ok(summary)
}

/// Initial build, then rebuild on change until Ctrl-C.
///
/// A failed initial build does not prevent watching; a fatal one does.
async fn watch(project: Project) -> Result<()> {
    let summary = build(&project).await?;
    if !summary.is_success() {
        warn!(
            failed = ?summary.failed_tasks(),
            "initial build failed; watching anyway"
        );
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let _watcher = spawn_watcher(project.context().root(), tx)?;

    let controller = WatchController::new(
        project.context().clone(),
        project.bindings().to_vec(),
        Arc::clone(project.composer()),
    )
    .with_content_hashing(project.use_hash());

    tokio::select! {
        _ = controller.run(rx) => {}
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("Ctrl-C received; stopping");
        }
    }
    Ok(())
}

/// Figure out the project root.
///
/// - If the config path has a non-empty parent (e.g. "app/Minibuild.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Minibuild.toml" (parent = ""),
///   we fall back to the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
