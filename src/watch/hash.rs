// src/watch/hash.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let contents = fs.read(path)?;
    let mut hasher = Hasher::new();
    hasher.update(&contents);
    Ok(hasher.finalize().to_hex().to_string())
}

/// Last content hash seen per path.
///
/// Used to drop change events that did not actually change a file (editors
/// touching mtime, duplicate notify events for one save).
#[derive(Debug, Default)]
pub struct ContentHashes {
    hashes: HashMap<PathBuf, String>,
}

impl ContentHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current hash of `path` and report whether it differs from
    /// the previous one. Unreadable or removed files always count as changed.
    pub fn observe(&mut self, fs: &dyn FileSystem, path: &Path) -> bool {
        match compute_file_hash(fs, path) {
            Ok(hash) => {
                let previous = self.hashes.insert(path.to_path_buf(), hash.clone());
                let changed = previous.as_deref() != Some(hash.as_str());
                if !changed {
                    debug!(path = ?path, "content hash unchanged");
                }
                changed
            }
            Err(_) => {
                self.hashes.remove(path);
                true
            }
        }
    }
}
