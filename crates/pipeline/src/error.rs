use docshelf_storage::StorageError;
use thiserror::Error;

/// Errors that abort a whole pipeline operation.
///
/// Per-file problems never surface here; they are folded into
/// [`docshelf_core::OrganizeOutcome::Failed`] so one bad file cannot sink
/// a batch run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Listing the root or preparing category folders failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
