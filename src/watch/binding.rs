// src/watch/binding.rs

use std::path::Path;

use anyhow::Result;

use crate::compose::GraphExpr;
use crate::pipeline::PathMatcher;

/// A watched pattern set and the graph it retriggers.
///
/// Bindings are created once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    name: String,
    matcher: PathMatcher,
    target: GraphExpr,
}

impl WatchBinding {
    pub fn new(
        name: impl Into<String>,
        include: &[String],
        exclude: &[String],
        target: GraphExpr,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            matcher: PathMatcher::new(include, exclude)?,
            target,
        })
    }

    /// Binding for a fixed set of literal paths (config files, env files).
    pub fn for_paths<S: AsRef<str>>(
        name: impl Into<String>,
        paths: &[S],
        target: GraphExpr,
    ) -> Result<Self> {
        let escaped: Vec<String> = paths
            .iter()
            .map(|p| globset::escape(p.as_ref()))
            .collect();
        Self::new(name, &escaped, &[], target)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &GraphExpr {
        &self.target
    }

    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.matches(rel_path)
    }
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Falls back to comparing canonical forms when the direct prefix check
/// fails (symlinked temp dirs, `/private/var` on macOS). Returns `None` for
/// paths outside `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let to_str = |p: &Path| p.to_string_lossy().replace('\\', "/");

    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_str(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    // Removed files can't be canonicalized; canonicalize the parent instead.
    let path_canon = path.canonicalize().ok().or_else(|| {
        let parent = path.parent()?.canonicalize().ok()?;
        Some(parent.join(path.file_name()?))
    })?;
    path_canon.strip_prefix(&root_canon).ok().map(to_str)
}
