// src/pipeline/stages/remap.rs

use anyhow::{Context, Result};
use regex::Regex;

use crate::pipeline::record::FileRecord;
use crate::pipeline::stage::{Stage, StageFuture, StageOutput};

/// Rewrites `@name/` alias references into root-absolute `/name/` paths.
///
/// Only the configured alias names are touched; everything else in the
/// text is left byte-for-byte intact.
#[derive(Debug, Clone)]
pub struct PathRemap {
    pattern: Regex,
}

impl PathRemap {
    pub fn new<S: AsRef<str>>(aliases: &[S]) -> Result<Self> {
        let alternatives: Vec<String> = aliases
            .iter()
            .map(|a| regex::escape(a.as_ref()))
            .collect();
        let pattern = Regex::new(&format!("@({})/", alternatives.join("|")))
            .context("compiling path alias pattern")?;
        Ok(Self { pattern })
    }

    pub fn remap<'t>(&self, text: &'t str) -> std::borrow::Cow<'t, str> {
        self.pattern.replace_all(text, "/$1/")
    }
}

impl Stage for PathRemap {
    fn name(&self) -> &str {
        "remap"
    }

    fn apply(&self, record: FileRecord) -> StageFuture<'_> {
        Box::pin(async move {
            let text = self.remap(record.text()?).into_owned();
            Ok(StageOutput::Emit(record.with_contents(text)))
        })
    }
}
