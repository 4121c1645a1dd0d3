use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::ExtractError;

/// Extract text from PDF bytes.
///
/// `pdf-extract` panics on some malformed font tables instead of returning
/// an error, so the call runs under `catch_unwind` and a panic is reported
/// as a malformed document.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let outcome = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)));

    let text = match outcome {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => return Err(ExtractError::Malformed(e.to_string())),
        Err(_) => {
            tracing::warn!("pdf parser panicked on malformed input");
            return Err(ExtractError::Malformed("pdf parser panicked".into()));
        }
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(text.to_string())
}

// -- Tests ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_malformed_not_panic() {
        let result = extract(b"definitely not a pdf");
        assert!(matches!(result, Err(ExtractError::Malformed(_))));
    }

    #[test]
    fn empty_input_is_malformed() {
        assert!(extract(b"").is_err());
    }
}
