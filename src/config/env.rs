// src/config/env.rs

//! Environment variables as an explicit, immutable mapping.
//!
//! The process environment is captured once at startup by
//! [`EnvLoader::capture`]. Tasks then call [`EnvLoader::load`] to get an
//! [`EnvSnapshot`] built from the `.env` files overlaid by that capture;
//! nothing reads `std::env` after startup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::fs::FileSystem;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    pub fn new(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    /// Variables eligible for placeholder injection: only those whose name
    /// starts with `prefix`.
    pub fn with_prefix(&self, prefix: &str) -> BTreeMap<String, String> {
        self.vars
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct EnvLoader {
    files: Vec<PathBuf>,
    captured: BTreeMap<String, String>,
}

impl EnvLoader {
    /// Capture the current process environment. Call once, at startup.
    pub fn capture(files: Vec<PathBuf>) -> Self {
        Self::with_vars(files, std::env::vars().collect())
    }

    pub fn with_vars(files: Vec<PathBuf>, captured: BTreeMap<String, String>) -> Self {
        Self { files, captured }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Build a fresh snapshot: env files in order (later files win), then
    /// the captured process environment on top. Missing files are skipped.
    pub fn load(&self, fs: &dyn FileSystem, root: &Path) -> Result<EnvSnapshot> {
        let mut vars = BTreeMap::new();
        for file in &self.files {
            let path = root.join(file);
            if !fs.is_file(&path) {
                debug!(file = ?file, "env file not present; skipping");
                continue;
            }
            let text = fs.read_to_string(&path)?;
            vars.extend(parse_env_file(&text));
        }
        vars.extend(self.captured.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(EnvSnapshot { vars })
    }
}

/// Parse `KEY=value` lines. Blank lines, `#` comments and an optional
/// `export ` prefix are accepted; matching surrounding quotes are removed.
pub fn parse_env_file(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for q in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(q) && value.ends_with(q) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
