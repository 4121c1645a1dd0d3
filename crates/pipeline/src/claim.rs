use std::collections::HashSet;

use tokio::sync::Mutex;

/// Files currently being organized.
///
/// Batch sweeps and change notifications can both trigger the same file;
/// the claim check and insertion run under a single lock, so exactly one
/// caller wins for any given id.
#[derive(Debug, Default)]
pub struct ClaimSet {
    inner: Mutex<HashSet<String>>,
}

impl ClaimSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id` for processing. Returns `false` when the claim is already
    /// held, in which case the caller must leave the file alone.
    pub async fn claim(&self, id: &str) -> bool {
        self.inner.lock().await.insert(id.to_string())
    }

    /// Release a claim so a later trigger may process the file again.
    pub async fn release(&self, id: &str) {
        self.inner.lock().await.remove(id);
    }

    /// Whether `id` is currently claimed.
    pub async fn contains(&self, id: &str) -> bool {
        self.inner.lock().await.contains(id)
    }
}

// -- Tests ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_claim_wins() {
        let claims = ClaimSet::new();
        assert!(claims.claim("file-1").await);
        assert!(!claims.claim("file-1").await);
        assert!(claims.claim("file-2").await);
    }

    #[tokio::test]
    async fn release_allows_reclaim() {
        let claims = ClaimSet::new();
        assert!(claims.claim("file-1").await);
        claims.release("file-1").await;
        assert!(!claims.contains("file-1").await);
        assert!(claims.claim("file-1").await);
    }
}
