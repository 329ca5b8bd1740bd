// src/pipeline/glob.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;

/// Compiled include/exclude glob sets.
///
/// Patterns are evaluated against forward-slash paths relative to the
/// project root, e.g. `"src/pages/index.wxml"`.
#[derive(Clone)]
pub struct PathMatcher {
    include: Vec<String>,
    exclude: Vec<String>,
    include_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathMatcher")
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .finish_non_exhaustive()
    }
}

impl PathMatcher {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include_set = build_globset(include).context("building include globset")?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };

        Ok(Self {
            include: include.to_vec(),
            exclude: exclude.to_vec(),
            include_set,
            exclude_set,
        })
    }

    pub fn include(&self) -> &[String] {
        &self.include
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// A source file-set: a matcher plus the base directory that relative
/// output paths are computed from.
///
/// Resolution is lazy and never cached: every call walks the tree again.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    matcher: PathMatcher,
    base: PathBuf,
    /// Set for single-file patterns; resolved by a direct lookup, no walk.
    literal: Option<PathBuf>,
}

/// One file found by [`GlobPattern::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFile {
    /// Absolute (root-joined) path for reading.
    pub path: PathBuf,
    /// Path relative to the pattern's base directory.
    pub relative: PathBuf,
}

impl GlobPattern {
    pub fn new(include: &[String], exclude: &[String], base: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            matcher: PathMatcher::new(include, exclude)?,
            base: base.into(),
            literal: None,
        })
    }

    /// A pattern that matches exactly one root-relative file.
    pub fn single_file(rel_path: &str, base: impl Into<PathBuf>) -> Result<Self> {
        let escaped = globset::escape(rel_path);
        let mut pattern = Self::new(&[escaped], &[], base)?;
        pattern.literal = Some(PathBuf::from(rel_path));
        Ok(pattern)
    }

    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Walk `root/base` and collect every file the matcher accepts, sorted
    /// by path. A missing base directory resolves to an empty set.
    pub fn resolve(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<MatchedFile>> {
        let base_is_root = self.base.as_os_str().is_empty() || self.base == Path::new(".");
        let base_dir = if base_is_root {
            root.to_path_buf()
        } else {
            root.join(&self.base)
        };
        let mut files = Vec::new();

        if let Some(literal) = &self.literal {
            let path = root.join(literal);
            let relative = if base_is_root {
                Some(literal.as_path())
            } else {
                literal.strip_prefix(&self.base).ok()
            };
            if let (true, Some(relative)) = (fs.is_file(&path), relative) {
                files.push(MatchedFile {
                    relative: relative.to_path_buf(),
                    path,
                });
            }
            return Ok(files);
        }

        if !fs.is_dir(&base_dir) {
            return Ok(files);
        }

        let mut stack = vec![base_dir.clone()];
        while let Some(dir) = stack.pop() {
            for path in fs.read_dir(&dir)? {
                if fs.is_dir(&path) {
                    stack.push(path);
                } else if fs.is_file(&path) {
                    let Ok(rel_root) = path.strip_prefix(root) else {
                        continue;
                    };
                    let rel_str = rel_root.to_string_lossy().replace('\\', "/");
                    if !self.matcher.matches(&rel_str) {
                        continue;
                    }
                    if let Ok(relative) = path.strip_prefix(&base_dir) {
                        files.push(MatchedFile {
                            relative: relative.to_path_buf(),
                            path: path.clone(),
                        });
                    }
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_includes_minus_excludes_relative_to_base() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/app.less", "a");
        fs.add_file("./src/pages/home.less", "b");
        fs.add_file("./src/styles/variables.less", "c");
        fs.add_file("./src/pages/home.wxml", "d");

        let pattern = GlobPattern::new(
            &strings(&["src/**/*.less"]),
            &strings(&["src/styles/**"]),
            "src",
        )
        .unwrap();

        let files = pattern.resolve(&fs, Path::new(".")).unwrap();
        let rel: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(rel, vec![PathBuf::from("app.less"), PathBuf::from("pages/home.less")]);
    }

    #[test]
    fn brace_alternatives_match_static_assets() {
        let m = PathMatcher::new(
            &strings(&["src/**/*.{png,jpg,jpeg,gif,js,json}"]),
            &strings(&["src/config.json"]),
        )
        .unwrap();
        assert!(m.matches("src/assets/logo.png"));
        assert!(m.matches("src/pages/index.json"));
        assert!(!m.matches("src/config.json"));
        assert!(!m.matches("src/pages/index.wxml"));
    }

    #[test]
    fn missing_base_is_an_empty_set() {
        let fs = MockFileSystem::new();
        let pattern = GlobPattern::new(&strings(&["src/**/*.wxml"]), &[], "src").unwrap();
        assert!(pattern.resolve(&fs, Path::new(".")).unwrap().is_empty());
    }

    #[test]
    fn single_file_pattern_is_literal() {
        let fs = MockFileSystem::new();
        fs.add_file("./project.config.json", "{}");
        fs.add_file("./other.json", "{}");
        let pattern = GlobPattern::single_file("project.config.json", ".").unwrap();
        let files = pattern.resolve(&fs, Path::new(".")).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, PathBuf::from("project.config.json"));
    }
}
