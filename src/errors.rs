// src/errors.rs

//! Crate-wide error type and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Duplicate task name: {0}")]
    DuplicateTask(String),

    #[error("Malformed graph expression: {0}")]
    GraphSyntax(String),

    #[error("Task '{task}' failed: {message}")]
    TaskFailed { task: String, message: String },

    #[error("Fatal: {0}")]
    Fatal(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuildError {
    /// Fatal errors reject the whole build regardless of composition.
    ///
    /// Everything else is an ordinary task failure: it aborts the enclosing
    /// `series` and is collected inside a `parallel`.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BuildError::Fatal(_)
                | BuildError::TaskNotFound(_)
                | BuildError::DuplicateTask(_)
                | BuildError::GraphSyntax(_)
                | BuildError::ConfigError(_)
        )
    }

    pub fn task_failed(task: impl Into<String>, message: impl Into<String>) -> Self {
        BuildError::TaskFailed {
            task: task.into(),
            message: message.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildError>;
