use async_trait::async_trait;
use docshelf_core::{ClassificationResult, ExtractedContent, FileRecord};

use crate::error::ClassifyError;

/// Everything the classifier sees about one file.
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    /// Display name of the file.
    pub name: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Extracted (already truncated) text content.
    pub content: String,
}

impl ClassifyRequest {
    /// Build a request from a file record and its extracted content.
    #[must_use]
    pub fn new(file: &FileRecord, content: &ExtractedContent) -> Self {
        Self {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
            content: content.text.clone(),
        }
    }
}

/// Trait for classifying a document into one of the known categories.
#[async_trait]
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Classify the file described by `request`.
    ///
    /// Implementations surface transport and schema failures as
    /// [`ClassifyError`]; they never guess a category on error.
    async fn classify(
        &self,
        request: &ClassifyRequest,
    ) -> Result<ClassificationResult, ClassifyError>;
}
