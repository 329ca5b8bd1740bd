// src/task/command.rs

use std::collections::VecDeque;
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::context::BuildContext;
use crate::errors::{BuildError, Result};
use crate::pipeline::stages::command::shell;

use super::{Task, TaskFuture, TaskName, TaskReport};

const STDERR_TAIL_LINES: usize = 20;

/// Keep only the last `STDERR_TAIL_LINES` lines.
fn push_tail(tail: &mut VecDeque<String>, line: String) {
    tail.push_back(line);
    if tail.len() > STDERR_TAIL_LINES {
        tail.pop_front();
    }
}

/// Runs shell commands one after another in the project root.
///
/// The first non-zero exit fails the task; later commands are skipped.
#[derive(Debug, Clone)]
pub struct CommandTask {
    name: TaskName,
    commands: Vec<String>,
    ctx: BuildContext,
}

impl CommandTask {
    pub fn new(name: impl Into<TaskName>, commands: Vec<String>, ctx: BuildContext) -> Self {
        Self {
            name: name.into(),
            commands,
            ctx,
        }
    }

    async fn run_one(&self, cmd: &str) -> Result<()> {
        info!(task = %self.name, cmd = %cmd, "starting command");

        let mut child = shell(cmd)
            .current_dir(self.ctx.root())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning `{cmd}` for task '{}'", self.name))?;

        if let Some(stdout) = child.stdout.take() {
            let task_name = self.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(task = %task_name, "{}", line);
                }
            });
        }

        let stderr_tail = child.stderr.take().map(|stderr| {
            let task_name = self.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                let mut tail = VecDeque::new();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(task = %task_name, "stderr: {}", line);
                    push_tail(&mut tail, line);
                }
                Vec::from(tail).join("\n")
            })
        });

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for `{cmd}` in task '{}'", self.name))?;

        if status.success() {
            return Ok(());
        }

        let code = status.code().unwrap_or(-1);
        let tail = match stderr_tail {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };
        warn!(task = %self.name, cmd = %cmd, exit_code = code, "command failed");
        Err(BuildError::task_failed(
            &self.name,
            format!("`{cmd}` exited with {code}: {}", tail.trim()),
        ))
    }
}

impl Task for CommandTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!("{}: run {:?}", self.name, self.commands)
    }

    fn invoke(&self) -> TaskFuture<'_> {
        Box::pin(async move {
            for cmd in &self.commands {
                self.run_one(cmd).await?;
            }
            Ok(TaskReport::Done)
        })
    }
}
