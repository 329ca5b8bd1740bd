// src/compose/composer.rs

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::compose::graph::GraphExpr;
use crate::errors::{BuildError, Result};
use crate::task::{TaskName, TaskRegistry};

/// A task that settled with a (non-fatal) failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub task: TaskName,
    pub message: String,
}

/// Aggregate result of executing a graph expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks that succeeded, in completion order.
    pub completed: Vec<TaskName>,
    pub failures: Vec<TaskFailure>,
    /// Per-record failures swallowed by pipelines along the way.
    pub recoverable: usize,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_tasks(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.task.as_str()).collect()
    }

    fn merge(&mut self, other: RunSummary) {
        self.completed.extend(other.completed);
        self.failures.extend(other.failures);
        self.recoverable += other.recoverable;
    }
}

type NodeFuture<'a> = Pin<Box<dyn Future<Output = Result<RunSummary>> + Send + 'a>>;

/// Executes graph expressions against a task registry.
///
/// - `series`: children run in order; the first failed child stops it.
/// - `parallel`: children run concurrently and are all awaited, failed
///   siblings included; their failures are collected.
/// - Fatal errors (`BuildError::is_fatal`) propagate as `Err` and reject
///   the whole execution. A `parallel` node still waits for its running
///   siblings before rejecting; nothing is cancelled mid-flight.
///
/// The composer keeps no state between executions.
#[derive(Debug)]
pub struct Composer {
    registry: TaskRegistry,
    task_timeout: Option<Duration>,
}

impl Composer {
    pub fn new(registry: TaskRegistry) -> Self {
        Self {
            registry,
            task_timeout: None,
        }
    }

    /// Fail any single task that has not settled within `timeout`.
    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub async fn execute(&self, expr: &GraphExpr) -> Result<RunSummary> {
        expr.validate(|name| self.registry.contains(name))?;

        let started = Instant::now();
        debug!(graph = %expr, "executing graph");
        let summary = self.run_node(expr).await?;

        if summary.is_success() {
            info!(
                graph = %expr,
                tasks = summary.completed.len(),
                recoverable = summary.recoverable,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "graph finished"
            );
        } else {
            warn!(
                graph = %expr,
                failed = ?summary.failed_tasks(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "graph finished with failed tasks"
            );
        }
        Ok(summary)
    }

    fn run_node<'a>(&'a self, expr: &'a GraphExpr) -> NodeFuture<'a> {
        Box::pin(async move {
            match expr {
                GraphExpr::Task(name) => self.run_task(name).await,
                GraphExpr::Series(children) => {
                    let mut summary = RunSummary::default();
                    for child in children {
                        let result = self.run_node(child).await?;
                        let failed = !result.is_success();
                        summary.merge(result);
                        if failed {
                            debug!(graph = %expr, "series stopped after failure");
                            break;
                        }
                    }
                    Ok(summary)
                }
                GraphExpr::Parallel(children) => {
                    let results = join_all(children.iter().map(|c| self.run_node(c))).await;
                    let mut summary = RunSummary::default();
                    let mut fatal: Option<BuildError> = None;
                    for result in results {
                        match result {
                            Ok(s) => summary.merge(s),
                            Err(e) => {
                                fatal.get_or_insert(e);
                            }
                        }
                    }
                    match fatal {
                        Some(e) => Err(e),
                        None => Ok(summary),
                    }
                }
            }
        })
    }

    async fn run_task(&self, name: &str) -> Result<RunSummary> {
        let task = self.registry.get(name)?;
        let started = Instant::now();
        info!(task = %name, "starting task");

        let result = match self.task_timeout {
            Some(limit) => match tokio::time::timeout(limit, task.invoke()).await {
                Ok(r) => r,
                Err(_) => Err(BuildError::task_failed(
                    name,
                    format!("did not settle within {}s", limit.as_secs()),
                )),
            },
            None => task.invoke().await,
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(report) => {
                info!(
                    task = %name,
                    elapsed_ms,
                    recoverable = report.recoverable_failures(),
                    "task finished"
                );
                Ok(RunSummary {
                    completed: vec![name.to_string()],
                    failures: Vec::new(),
                    recoverable: report.recoverable_failures(),
                })
            }
            Err(e) if e.is_fatal() => {
                error!(task = %name, error = %e, "fatal error; aborting build");
                Err(e)
            }
            Err(e) => {
                error!(task = %name, elapsed_ms, error = %e, "task failed");
                Ok(RunSummary {
                    completed: Vec::new(),
                    failures: vec![TaskFailure {
                        task: name.to_string(),
                        message: e.to_string(),
                    }],
                    recoverable: 0,
                })
            }
        }
    }
}
