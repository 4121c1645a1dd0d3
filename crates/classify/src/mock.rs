use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docshelf_core::{Category, ClassificationResult};

use crate::classifier::{Classifier, ClassifyRequest};
use crate::error::ClassifyError;

/// A mock classifier that returns a configurable result and records the
/// requests it receives.
#[derive(Debug, Clone)]
pub struct MockClassifier {
    result: ClassificationResult,
    requests: Arc<Mutex<Vec<ClassifyRequest>>>,
}

impl MockClassifier {
    /// Create a mock returning the given result for every request.
    #[must_use]
    pub fn with_result(result: ClassificationResult) -> Self {
        Self {
            result,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A mock that confidently proposes `category` (confidence 0.95).
    #[must_use]
    pub fn confident(category: Category) -> Self {
        Self::with_result(ClassificationResult {
            category,
            confidence: 0.95,
            reasoning: "mock classification".into(),
            subcategory: None,
        })
    }

    /// A mock that proposes `category` below the default threshold
    /// (confidence 0.4), so routing sends the file to review.
    #[must_use]
    pub fn uncertain(category: Category) -> Self {
        Self::with_result(ClassificationResult {
            category,
            confidence: 0.4,
            reasoning: "mock classification".into(),
            subcategory: None,
        })
    }

    /// Number of classify calls observed.
    #[must_use]
    pub fn calls(&self) -> u32 {
        u32::try_from(self.requests.lock().unwrap().len()).unwrap_or(u32::MAX)
    }

    /// Every request seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ClassifyRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent request, if any.
    #[must_use]
    pub fn last_request(&self) -> Option<ClassifyRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(
        &self,
        request: &ClassifyRequest,
    ) -> Result<ClassificationResult, ClassifyError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.result.clone())
    }
}

/// A classifier that always fails, for exercising error paths.
#[derive(Debug, Clone)]
pub struct FailingClassifier {
    message: String,
    retryable: bool,
    calls: Arc<AtomicU32>,
}

impl FailingClassifier {
    /// Fails every call with a retryable service error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Fails every call with a non-retryable schema error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Number of classify calls observed.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for FailingClassifier {
    async fn classify(
        &self,
        _request: &ClassifyRequest,
    ) -> Result<ClassificationResult, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.retryable {
            Err(ClassifyError::Api {
                status: 503,
                message: self.message.clone(),
            })
        } else {
            Err(ClassifyError::InvalidResponse(self.message.clone()))
        }
    }
}

// -- Tests ------------------------------------------------------------------
