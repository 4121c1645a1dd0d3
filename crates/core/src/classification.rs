use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::Category;

/// Validated result of one classification call.
///
/// Immutable after parsing; the confidence bound is enforced at
/// construction so downstream routing never sees an out-of-range value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Proposed destination, already normalized to the closed set.
    pub category: Category,
    /// Model-reported probability in `[0, 1]` that the category is correct.
    pub confidence: f64,
    /// Free-text justification, passed through unvalidated.
    pub reasoning: String,
    /// Optional finer-grained label.
    pub subcategory: Option<String>,
}

/// Confidence value outside the `[0, 1]` contract.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("confidence {0} outside [0, 1]")]
pub struct InvalidConfidence(pub f64);

impl ClassificationResult {
    /// Build a result, rejecting confidence values outside `[0, 1]`.
    pub fn new(
        category: Category,
        confidence: f64,
        reasoning: impl Into<String>,
        subcategory: Option<String>,
    ) -> Result<Self, InvalidConfidence> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(InvalidConfidence(confidence));
        }
        Ok(Self {
            category,
            confidence,
            reasoning: reasoning.into(),
            subcategory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bounds_inclusive() {
        assert!(ClassificationResult::new(Category::Finance, 0.0, "", None).is_ok());
        assert!(ClassificationResult::new(Category::Finance, 1.0, "", None).is_ok());
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let err = ClassificationResult::new(Category::Finance, 1.2, "", None).unwrap_err();
        assert_eq!(err, InvalidConfidence(1.2));
        assert!(ClassificationResult::new(Category::Finance, -0.1, "", None).is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let result =
            ClassificationResult::new(Category::Hr, 0.92, "employment contract", None).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""HR""#));
        let back: ClassificationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.category, Category::Hr);
    }
}
