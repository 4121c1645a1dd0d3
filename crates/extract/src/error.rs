use thiserror::Error;

/// Failure modes of a text-extraction adapter.
///
/// None of these abort a file: the pipeline answers every variant with
/// filename-only fallback content.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No adapter exists for this MIME type.
    #[error("unsupported type: {0}")]
    Unsupported(String),

    /// The bytes could not be parsed as the declared type.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// Parsing succeeded but yielded no usable text.
    #[error("no extractable text")]
    Empty,
}
