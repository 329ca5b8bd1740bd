// src/pipeline/stages/command.rs

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::pipeline::record::FileRecord;
use crate::pipeline::stage::{Stage, StageFuture, StageOutput};

/// Pipes a record's contents through an external tool (stdin -> stdout).
///
/// A non-zero exit fails the record with the tool's stderr as the message.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    cmd: String,
    cwd: PathBuf,
}

impl ExternalCommand {
    pub fn new(cmd: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            cmd: cmd.into(),
            cwd: cwd.into(),
        }
    }

    async fn run(&self, input: Vec<u8>) -> Result<Vec<u8>> {
        let mut child = shell(&self.cmd)
            .current_dir(&self.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning `{}`", self.cmd))?;

        if let Some(mut stdin) = child.stdin.take() {
            // stdin is fed concurrently with draining stdout.
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&input).await {
                    debug!(error = %e, "tool closed stdin before reading all input");
                }
            });
        }

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("waiting for `{}`", self.cmd))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "`{}` exited with {}: {}",
                self.cmd,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }
        Ok(output.stdout)
    }
}

/// Build a shell command appropriate for the platform.
pub(crate) fn shell(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

impl Stage for ExternalCommand {
    fn name(&self) -> &str {
        &self.cmd
    }

    fn apply(&self, record: FileRecord) -> StageFuture<'_> {
        Box::pin(async move {
            debug!(cmd = %self.cmd, path = %record.display_path(), "piping record through tool");
            let out = self
                .run(record.contents().to_vec())
                .await
                .with_context(|| format!("compiling {}", record.display_path()))?;
            Ok(StageOutput::Emit(record.with_contents(out)))
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pipes_contents_through_tool() {
        let stage = ExternalCommand::new("tr a-z A-Z", ".");
        let rec = FileRecord::new("src", "a.less", b"body{}".to_vec());
        let StageOutput::Emit(out) = stage.apply(rec).await.unwrap() else {
            panic!("expected emitted record");
        };
        assert_eq!(out.contents(), b"BODY{}");
    }

    #[tokio::test]
    async fn tool_that_ignores_stdin_still_emits_its_output() {
        let stage = ExternalCommand::new("exec 0<&-; printf done", ".");
        let rec = FileRecord::new("src", "big.less", vec![b'x'; 1 << 20]);
        let StageOutput::Emit(out) = stage.apply(rec).await.unwrap() else {
            panic!("expected emitted record");
        };
        assert_eq!(out.contents(), b"done");
    }

    #[tokio::test]
    async fn non_zero_exit_fails_the_record() {
        let stage = ExternalCommand::new("echo bad syntax >&2; exit 3", ".");
        let rec = FileRecord::new("src", "broken.less", b"{".to_vec());
        let err = stage.apply(rec).await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("broken.less"));
        assert!(msg.contains("bad syntax"));
    }
}
