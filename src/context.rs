// src/context.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::fs::{FileSystem, RealFileSystem};

/// Project root plus the filesystem every task reads and writes through.
///
/// All source patterns and destination directories are relative to `root`.
#[derive(Clone)]
pub struct BuildContext {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl BuildContext {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
        }
    }

    /// Context backed by the real filesystem.
    pub fn on_disk(root: impl Into<PathBuf>) -> Self {
        Self::new(root, Arc::new(RealFileSystem))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn resolve(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel)
    }

    /// Run filesystem work on tokio's blocking pool.
    ///
    /// Task bodies go through here for every read and write so that each
    /// one is a suspension point for sibling tasks.
    pub async fn blocking<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&dyn FileSystem) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let fs = Arc::clone(&self.fs);
        tokio::task::spawn_blocking(move || f(fs.as_ref()))
            .await
            .context("filesystem worker panicked")?
    }
}
