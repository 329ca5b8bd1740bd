// src/pipeline/stage.rs

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

use super::record::FileRecord;

/// What a stage did with a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutput {
    /// Pass a (possibly replaced) record on to the next stage.
    Emit(FileRecord),
    /// Remove the record from the stream; nothing is written for it.
    Drop,
}

pub type StageFuture<'a> = Pin<Box<dyn Future<Output = Result<StageOutput>> + Send + 'a>>;

/// One transformation step applied to a single record.
///
/// Implementations must be deterministic given their own configuration and
/// must not touch state other than the record they return. An `Err` is
/// attributed to the record that caused it; the pipeline keeps going with
/// the remaining records.
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, record: FileRecord) -> StageFuture<'_>;
}
