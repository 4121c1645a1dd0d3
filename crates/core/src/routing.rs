use crate::category::Category;
use crate::classification::ClassificationResult;

/// Confidence at or above which a file is routed to the model's category.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Decide the destination folder for a classification result.
///
/// Pure function of the result and threshold. The comparison is inclusive:
/// confidence exactly at the threshold auto-organizes. Anything below routes
/// to [`Category::NeedsReview`] regardless of the proposed category.
#[must_use]
pub fn route(result: &ClassificationResult, threshold: f64) -> Category {
    if result.confidence >= threshold {
        result.category
    } else {
        Category::NeedsReview
    }
}

// -- Tests ------------------------------------------------------------------
