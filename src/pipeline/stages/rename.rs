// src/pipeline/stages/rename.rs

use crate::pipeline::record::FileRecord;
use crate::pipeline::stage::{Stage, StageFuture, StageOutput};

/// Metadata-only stage: swaps the extension, leaves contents alone.
#[derive(Debug, Clone)]
pub struct RenameExtension {
    extension: String,
}

impl RenameExtension {
    pub fn new(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        let extension = extension.trim_start_matches('.').to_string();
        Self { extension }
    }
}

impl Stage for RenameExtension {
    fn name(&self) -> &str {
        "rename"
    }

    fn apply(&self, record: FileRecord) -> StageFuture<'_> {
        Box::pin(async move { Ok(StageOutput::Emit(record.with_extension(&self.extension))) })
    }
}
