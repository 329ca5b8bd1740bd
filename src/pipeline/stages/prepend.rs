// src/pipeline/stages/prepend.rs

use crate::pipeline::record::FileRecord;
use crate::pipeline::stage::{Stage, StageFuture, StageOutput};

/// Inserts a fixed header before the record's contents.
#[derive(Debug, Clone)]
pub struct Prepend {
    header: String,
}

impl Prepend {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }

    /// `@import '<path>';` header used to expose shared style variables.
    pub fn style_import(path: &str) -> Self {
        Self::new(format!("@import '{path}';"))
    }
}

impl Stage for Prepend {
    fn name(&self) -> &str {
        "prepend"
    }

    fn apply(&self, record: FileRecord) -> StageFuture<'_> {
        Box::pin(async move {
            let mut contents = Vec::with_capacity(self.header.len() + record.contents().len());
            contents.extend_from_slice(self.header.as_bytes());
            contents.extend_from_slice(record.contents());
            Ok(StageOutput::Emit(record.with_contents(contents)))
        })
    }
}
