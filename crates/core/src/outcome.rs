use std::fmt;

use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Terminal outcome of organizing one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrganizeOutcome {
    /// File was moved into the destination category folder.
    Moved { category: Category },
    /// File was intentionally left alone; no side effects occurred.
    Skipped { reason: SkipReason },
    /// Pipeline failed for this file. The organized marker was not set, so
    /// the file stays eligible for a later pass.
    Failed(OrganizeError),
}

/// Why a file was skipped without processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The record is a folder, not a document.
    Folder,
    /// Media type with no text-extraction adapter.
    MediaType,
    /// A previous run already moved this file.
    AlreadyOrganized,
    /// Another in-flight run holds the claim for this file.
    InFlight,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::Folder => "folder",
            SkipReason::MediaType => "media type",
            SkipReason::AlreadyOrganized => "already organized",
            SkipReason::InFlight => "in flight",
        };
        f.write_str(s)
    }
}

/// Error detail when organizing a file fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeError {
    /// Error category code (e.g. `classification`, `move`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Whether a later pass may succeed.
    pub retryable: bool,
}

impl fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Aggregate counts for one batch sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub organized: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl BatchSummary {
    /// Fold one outcome into the counts.
    pub fn record(&mut self, outcome: &OrganizeOutcome) {
        match outcome {
            OrganizeOutcome::Moved { .. } => self.organized += 1,
            OrganizeOutcome::Skipped { .. } => self.skipped += 1,
            OrganizeOutcome::Failed(_) => self.errors += 1,
        }
    }

    /// Total files observed by the sweep.
    #[must_use]
    pub fn total(&self) -> usize {
        self.organized + self.skipped + self.errors
    }
}

// -- Tests ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_records_each_outcome() {
        let mut summary = BatchSummary::default();
        summary.record(&OrganizeOutcome::Moved {
            category: Category::Finance,
        });
        summary.record(&OrganizeOutcome::Skipped {
            reason: SkipReason::MediaType,
        });
        summary.record(&OrganizeOutcome::Failed(OrganizeError {
            code: "classification".into(),
            message: "timed out".into(),
            retryable: true,
        }));

        assert_eq!(summary.organized, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn outcome_serde_roundtrip() {
        let outcome = OrganizeOutcome::Moved {
            category: Category::Finance,
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("Finance"));
        let back: OrganizeOutcome = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, OrganizeOutcome::Moved { .. }));
    }

    #[test]
    fn skip_reason_display() {
        assert_eq!(SkipReason::AlreadyOrganized.to_string(), "already organized");
        assert_eq!(SkipReason::Folder.to_string(), "folder");
    }
}
