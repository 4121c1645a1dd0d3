use docshelf_core::Category;

use crate::classifier::ClassifyRequest;

/// Build the classification prompt for one file.
///
/// Deterministic: a fixed template over the request fields and the closed
/// category list. The content is truncated before it reaches this point, so
/// prompt size is bounded by the content cap.
#[must_use]
pub fn build_prompt(request: &ClassifyRequest) -> String {
    let categories = Category::CLASSIFIABLE
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Classify this file into ONE category from:
{categories}

File name: {name}
Type: {mime}
Size: {size} bytes

Content:
{content}

Return ONLY valid JSON:
{{
  "category": "...",
  "confidence": 0.0-1.0,
  "reasoning": "...",
  "subcategory": "optional"
}}"#,
        name = request.name,
        mime = request.mime_type,
        size = request.size,
        content = request.content,
    )
}

// -- Tests ------------------------------------------------------------------
