use docx_rs::{DocumentChild, ParagraphChild, RunChild};

use crate::error::ExtractError;

/// Extract paragraph text from DOCX bytes.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = docx_rs::read_docx(bytes).map_err(|e| ExtractError::Malformed(e.to_string()))?;

    let mut text = String::new();
    for child in &doc.document.children {
        append_child_text(child, &mut text);
    }

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(text.to_string())
}

/// Walk one document element, appending run text. Paragraphs end with a
/// newline so the classifier sees document structure.
fn append_child_text(element: &DocumentChild, output: &mut String) {
    if let DocumentChild::Paragraph(paragraph) = element {
        for child in &paragraph.children {
            append_paragraph_text(child, output);
        }
        if !output.ends_with('\n') {
            output.push('\n');
        }
    }
}

fn append_paragraph_text(child: &ParagraphChild, output: &mut String) {
    match child {
        ParagraphChild::Run(run) => {
            for run_child in &run.children {
                if let RunChild::Text(text) = run_child {
                    output.push_str(&text.text);
                }
            }
        }
        ParagraphChild::Hyperlink(link) => {
            for nested in &link.children {
                append_paragraph_text(nested, output);
            }
        }
        _ => {}
    }
}

// -- Tests ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_malformed() {
        let result = extract(b"not a zip archive");
        assert!(matches!(result, Err(ExtractError::Malformed(_))));
    }
}
