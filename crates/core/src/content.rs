use serde::{Deserialize, Serialize};

/// Default maximum characters of extracted text forwarded to classification.
pub const DEFAULT_CONTENT_CAP: usize = 3000;

/// Where the text handed to the classifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    /// Text was extracted from the file bytes.
    Extracted,
    /// Extraction failed or was unsupported; content is synthesized from
    /// the file name alone.
    FilenameOnly,
}

/// Text handed to the classifier for one file.
///
/// Ephemeral: produced and consumed within a single pipeline run, never
/// persisted. Text is capped at construction; the cap is a hard contract,
/// not a hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub text: String,
    pub source: ContentSource,
}

impl ExtractedContent {
    /// Wrap extracted text, truncating to at most `cap` characters.
    #[must_use]
    pub fn extracted(text: impl Into<String>, cap: usize) -> Self {
        Self {
            text: truncate_chars(text.into(), cap),
            source: ContentSource::Extracted,
        }
    }

    /// Fallback content built solely from the file name, used when
    /// extraction cannot produce text.
    #[must_use]
    pub fn filename_only(name: &str) -> Self {
        Self {
            text: format!("Filename: {name}"),
            source: ContentSource::FilenameOnly,
        }
    }

    /// Whether extraction succeeded, as opposed to the filename fallback.
    #[must_use]
    pub fn is_extracted(&self) -> bool {
        self.source == ContentSource::Extracted
    }
}

/// Truncate to `cap` characters on a character boundary.
fn truncate_chars(mut text: String, cap: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(cap) {
        text.truncate(idx);
    }
    text
}

// -- Tests ------------------------------------------------------------------
