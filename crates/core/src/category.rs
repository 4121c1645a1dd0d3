use std::fmt;

use serde::{Deserialize, Serialize};

/// Topical destination for an organized file.
///
/// The classifiable set is closed. Model output that cannot be normalized to
/// a known name falls back to [`Category::Miscellaneous`];
/// [`Category::NeedsReview`] is the low-confidence sentinel chosen by the
/// routing policy and is never offered to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "HR")]
    Hr,
    Finance,
    Academics,
    Projects,
    Marketing,
    Personal,
    /// Overflow destination for content that fits nothing else.
    Miscellaneous,
    /// Low-confidence sentinel; files land here for human triage.
    #[serde(rename = "Needs Review")]
    NeedsReview,
}

impl Category {
    /// Categories the model may choose from, in prompt order.
    pub const CLASSIFIABLE: [Category; 7] = [
        Category::Hr,
        Category::Finance,
        Category::Academics,
        Category::Projects,
        Category::Marketing,
        Category::Personal,
        Category::Miscellaneous,
    ];

    /// Every folder the organizer manages, including the review sentinel.
    pub const ALL: [Category; 8] = [
        Category::Hr,
        Category::Finance,
        Category::Academics,
        Category::Projects,
        Category::Marketing,
        Category::Personal,
        Category::Miscellaneous,
        Category::NeedsReview,
    ];

    /// Folder display name for this category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Hr => "HR",
            Category::Finance => "Finance",
            Category::Academics => "Academics",
            Category::Projects => "Projects",
            Category::Marketing => "Marketing",
            Category::Personal => "Personal",
            Category::Miscellaneous => "Miscellaneous",
            Category::NeedsReview => "Needs Review",
        }
    }

    /// Normalize a model-proposed category string.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Unknown names map to [`Category::Miscellaneous`] rather than failing,
    /// so routing stays total over arbitrary model output.
    #[must_use]
    pub fn normalize(raw: &str) -> Category {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hr" => Category::Hr,
            "finance" => Category::Finance,
            "academics" => Category::Academics,
            "projects" => Category::Projects,
            "marketing" => Category::Marketing,
            "personal" => Category::Personal,
            "miscellaneous" => Category::Miscellaneous,
            "needs review" => Category::NeedsReview,
            _ => Category::Miscellaneous,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Tests ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_known_names() {
        assert_eq!(Category::normalize("HR"), Category::Hr);
        assert_eq!(Category::normalize("finance"), Category::Finance);
        assert_eq!(Category::normalize("  Projects "), Category::Projects);
        assert_eq!(Category::normalize("needs review"), Category::NeedsReview);
    }

    #[test]
    fn normalize_unknown_falls_back_to_miscellaneous() {
        assert_eq!(Category::normalize("Legal"), Category::Miscellaneous);
        assert_eq!(Category::normalize(""), Category::Miscellaneous);
        assert_eq!(Category::normalize("finance & ops"), Category::Miscellaneous);
    }

    #[test]
    fn classifiable_excludes_sentinel() {
        assert!(!Category::CLASSIFIABLE.contains(&Category::NeedsReview));
        assert!(Category::ALL.contains(&Category::NeedsReview));
        assert_eq!(Category::ALL.len(), Category::CLASSIFIABLE.len() + 1);
    }

    #[test]
    fn display_matches_folder_names() {
        assert_eq!(Category::Hr.to_string(), "HR");
        assert_eq!(Category::NeedsReview.to_string(), "Needs Review");
    }

    #[test]
    fn serde_uses_folder_names() {
        let json = serde_json::to_string(&Category::Hr).unwrap();
        assert_eq!(json, r#""HR""#);
        let back: Category = serde_json::from_str(r#""Needs Review""#).unwrap();
        assert_eq!(back, Category::NeedsReview);
    }
}
