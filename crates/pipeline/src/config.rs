/// Tunables for the organizing pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum confidence (inclusive) at which the model's category is
    /// accepted; anything below routes to review.
    pub confidence_threshold: f64,
    /// Maximum characters of extracted text forwarded to the model.
    pub content_cap: usize,
    /// Pause between files during a batch run, in milliseconds.
    pub batch_delay_ms: u64,
    /// Budget for downloading one file's content, in seconds.
    pub download_timeout_seconds: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: docshelf_core::DEFAULT_CONFIDENCE_THRESHOLD,
            content_cap: docshelf_core::DEFAULT_CONTENT_CAP,
            batch_delay_ms: 500,
            download_timeout_seconds: 60,
        }
    }
}

// -- Tests ------------------------------------------------------------------
