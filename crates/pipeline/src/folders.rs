use std::collections::HashMap;

use docshelf_core::Category;
use docshelf_storage::{StorageError, StorageProvider};
use tokio::sync::Mutex;
use tracing::debug;

/// Cache of category folder ids under the watched root.
///
/// An entry is inserted only after the backend confirms the folder, so a
/// failed creation is retried on the next resolve instead of poisoning
/// the cache with a bogus id.
#[derive(Debug, Default)]
pub struct FolderCache {
    inner: Mutex<HashMap<Category, String>>,
}

impl FolderCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the folder id for `category`, creating the folder under
    /// `root` on first use.
    pub async fn resolve(
        &self,
        storage: &dyn StorageProvider,
        category: Category,
        root: &str,
    ) -> Result<String, StorageError> {
        let mut cache = self.inner.lock().await;
        if let Some(id) = cache.get(&category) {
            return Ok(id.clone());
        }

        let id = storage.ensure_folder(category.as_str(), root).await?;
        debug!(category = %category, folder = %id, "resolved category folder");
        cache.insert(category, id.clone());
        Ok(id)
    }
}

// -- Tests ------------------------------------------------------------------
