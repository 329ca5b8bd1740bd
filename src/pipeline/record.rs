// src/pipeline/record.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// A single file flowing through a pipeline.
///
/// Identity is the path relative to `base`; the destination path is
/// `dest.join(relative)`, so relative structure is preserved unless a stage
/// renames the record.
#[derive(Clone, PartialEq, Eq)]
pub struct FileRecord {
    base: PathBuf,
    relative: PathBuf,
    contents: Vec<u8>,
}

impl fmt::Debug for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRecord")
            .field("base", &self.base)
            .field("relative", &self.relative)
            .field("len", &self.contents.len())
            .finish()
    }
}

impl FileRecord {
    pub fn new(base: impl Into<PathBuf>, relative: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            base: base.into(),
            relative: relative.into(),
            contents,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// Forward-slash form of the relative path, used in logs and reports.
    pub fn display_path(&self) -> String {
        self.relative.to_string_lossy().replace('\\', "/")
    }

    pub fn extension(&self) -> Option<&str> {
        self.relative.extension().and_then(|e| e.to_str())
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn into_contents(self) -> Vec<u8> {
        self.contents
    }

    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.contents)
            .with_context(|| format!("{} is not valid UTF-8", self.display_path()))
    }

    pub fn with_contents(self, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: contents.into(),
            ..self
        }
    }

    pub fn with_extension(self, ext: &str) -> Self {
        let relative = self.relative.with_extension(ext);
        Self { relative, ..self }
    }
}
