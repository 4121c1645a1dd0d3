//! Text-extraction adapters.
//!
//! Pure `bytes -> text` functions with no network access, dispatched by MIME
//! type. Native provider documents are exported to plain text or CSV before
//! download, so only container formats need real parsers here.

pub mod docx;
pub mod error;
pub mod pdf;
pub mod sheet;

pub use error::ExtractError;

/// Extract text content from a file's bytes according to its MIME type.
///
/// Returns [`ExtractError::Unsupported`] for types with no adapter; the
/// caller decides what to substitute (the pipeline falls back to
/// filename-only content and never fails a file over extraction).
pub fn extract(mime_type: &str, bytes: &[u8]) -> Result<String, ExtractError> {
    let mime = mime_type.to_ascii_lowercase();

    if mime.contains("pdf") {
        pdf::extract(bytes)
    } else if mime.contains("wordprocessingml") {
        docx::extract(bytes)
    } else if mime.contains("spreadsheetml") {
        sheet::extract_xlsx(bytes)
    } else if mime.contains("ms-excel") {
        sheet::extract_xls(bytes)
    } else if is_textual(&mime) {
        plain_text(bytes)
    } else {
        Err(ExtractError::Unsupported(mime_type.to_string()))
    }
}

/// Plain-text family: anything under `text/` plus the structured text
/// formats that classify well as-is.
fn is_textual(mime: &str) -> bool {
    mime.starts_with("text/")
        || mime.contains("json")
        || mime.contains("csv")
        || mime.contains("xml")
        || mime.contains("yaml")
}

fn plain_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(trimmed.to_string())
}

// -- Tests ------------------------------------------------------------------
