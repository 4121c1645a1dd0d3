use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use docshelf_core::{ChangeEvent, ChangeList, FOLDER_MIME, FileRecord, SubscriptionChannel};
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::provider::{ChannelRequest, ListFilter, StorageProvider};

#[derive(Debug, Default)]
struct Inner {
    files: HashMap<String, FileRecord>,
    contents: HashMap<String, Bytes>,
    /// (parent, name) -> folder id.
    folders: HashMap<(String, String), String>,
    changes: Vec<ChangeEvent>,
    active_channel: Option<SubscriptionChannel>,
    cancelled: Vec<String>,
    next_id: u64,
}

/// In-memory storage provider for tests.
///
/// Cursors are vector indices rendered as strings, so `changes_since`
/// returns everything recorded after the cursor was taken.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
    fail_downloads: AtomicBool,
    fail_moves: AtomicBool,
    fail_marks: AtomicBool,
    fail_folders: AtomicBool,
    fail_watch: AtomicBool,
    fail_changes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file with its content.
    pub async fn add_file(&self, record: FileRecord, content: impl Into<Bytes>) {
        let mut inner = self.inner.lock().await;
        inner.contents.insert(record.id.clone(), content.into());
        inner.files.insert(record.id.clone(), record);
    }

    /// Fetch a file record by id.
    pub async fn file(&self, id: &str) -> Option<FileRecord> {
        self.inner.lock().await.files.get(id).cloned()
    }

    /// Append a change event for a known file to the change feed.
    pub async fn record_change(&self, file_id: &str) {
        let mut inner = self.inner.lock().await;
        let file = inner.files.get(file_id).cloned();
        inner.changes.push(ChangeEvent {
            file_id: file_id.to_string(),
            removed: file.is_none(),
            file,
        });
    }

    /// Channel ids passed to `cancel_watch` so far.
    pub async fn cancelled_channels(&self) -> Vec<String> {
        self.inner.lock().await.cancelled.clone()
    }

    /// The most recent channel registered via `watch`.
    pub async fn active_channel(&self) -> Option<SubscriptionChannel> {
        self.inner.lock().await.active_channel.clone()
    }

    /// Make subsequent downloads fail with a retryable timeout.
    pub fn fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent moves fail with a server error.
    pub fn fail_moves(&self, fail: bool) {
        self.fail_moves.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent folder creations fail with a server error.
    pub fn fail_folders(&self, fail: bool) {
        self.fail_folders.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent organized-marker writes fail with a server error.
    pub fn fail_marks(&self, fail: bool) {
        self.fail_marks.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent watch registrations fail.
    pub fn fail_watch(&self, fail: bool) {
        self.fail_watch.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent change-feed reads fail.
    pub fn fail_changes(&self, fail: bool) {
        self.fail_changes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageProvider for MemoryStorage {
    async fn list(
        &self,
        root: &str,
        filter: &ListFilter,
    ) -> Result<Vec<FileRecord>, StorageError> {
        let inner = self.inner.lock().await;
        let mut records: Vec<FileRecord> = inner
            .files
            .values()
            .filter(|f| f.parent_id.as_deref() == Some(root))
            .filter(|f| filter.accepts(f))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    async fn download(&self, file: &FileRecord) -> Result<Bytes, StorageError> {
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(StorageError::Timeout(5));
        }
        let inner = self.inner.lock().await;
        inner
            .contents
            .get(&file.id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(file.id.clone()))
    }

    async fn move_file(&self, id: &str, dest_folder: &str) -> Result<(), StorageError> {
        if self.fail_moves.load(Ordering::SeqCst) {
            return Err(StorageError::Api {
                status: 500,
                message: "move rejected".into(),
            });
        }
        let mut inner = self.inner.lock().await;
        let file = inner
            .files
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        file.parent_id = Some(dest_folder.to_string());
        Ok(())
    }

    async fn ensure_folder(&self, name: &str, parent: &str) -> Result<String, StorageError> {
        if self.fail_folders.load(Ordering::SeqCst) {
            return Err(StorageError::Api {
                status: 500,
                message: "folder creation rejected".into(),
            });
        }
        let mut inner = self.inner.lock().await;
        let key = (parent.to_string(), name.to_string());
        if let Some(id) = inner.folders.get(&key) {
            return Ok(id.clone());
        }
        inner.next_id += 1;
        let id = format!("folder-{}", inner.next_id);
        inner.folders.insert(key, id.clone());
        inner.files.insert(
            id.clone(),
            FileRecord {
                id: id.clone(),
                name: name.to_string(),
                mime_type: FOLDER_MIME.to_string(),
                size: 0,
                parent_id: Some(parent.to_string()),
                organized: false,
            },
        );
        Ok(id)
    }

    async fn mark_organized(&self, id: &str) -> Result<(), StorageError> {
        if self.fail_marks.load(Ordering::SeqCst) {
            return Err(StorageError::Api {
                status: 500,
                message: "marker write rejected".into(),
            });
        }
        let mut inner = self.inner.lock().await;
        let file = inner
            .files
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        file.organized = true;
        Ok(())
    }

    async fn watch(
        &self,
        _root: &str,
        request: &ChannelRequest,
    ) -> Result<SubscriptionChannel, StorageError> {
        if self.fail_watch.load(Ordering::SeqCst) {
            return Err(StorageError::Api {
                status: 500,
                message: "watch rejected".into(),
            });
        }
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let mut channel = SubscriptionChannel::new(request.lease_secs);
        channel.id = request.id.clone();
        channel.token = request.token.clone();
        channel.resource_id = Some(format!("mem-resource-{}", inner.next_id));
        inner.active_channel = Some(channel.clone());
        Ok(channel)
    }

    async fn cancel_watch(&self, channel: &SubscriptionChannel) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        inner.cancelled.push(channel.id.clone());
        if inner
            .active_channel
            .as_ref()
            .is_some_and(|c| c.id == channel.id)
        {
            inner.active_channel = None;
        }
        Ok(())
    }

    async fn start_cursor(&self) -> Result<String, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner.changes.len().to_string())
    }

    async fn changes_since(&self, cursor: &str) -> Result<ChangeList, StorageError> {
        if self.fail_changes.load(Ordering::SeqCst) {
            return Err(StorageError::Http("connection refused".into()));
        }
        let inner = self.inner.lock().await;
        let from: usize = cursor
            .parse()
            .map_err(|_| StorageError::InvalidResponse(format!("bad cursor {cursor:?}")))?;
        let events = inner.changes.get(from..).unwrap_or_default().to_vec();
        Ok(ChangeList {
            events,
            next_cursor: inner.changes.len().to_string(),
        })
    }
}

// -- Tests ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn file_in(root: &str, id: &str, name: &str) -> FileRecord {
        FileRecord {
            id: id.into(),
            name: name.into(),
            mime_type: "application/pdf".into(),
            size: 10,
            parent_id: Some(root.into()),
            organized: false,
        }
    }

    #[tokio::test]
    async fn list_scopes_to_root_and_applies_filter() {
        let storage = MemoryStorage::new();
        storage.add_file(file_in("root", "a", "a.pdf"), "a").await;
        storage.add_file(file_in("other", "b", "b.pdf"), "b").await;
        let mut organized = file_in("root", "c", "c.pdf");
        organized.organized = true;
        storage.add_file(organized, "c").await;

        let files = storage.list("root", &ListFilter::sweep()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, "a");
    }

    #[tokio::test]
    async fn ensure_folder_is_idempotent() {
        let storage = MemoryStorage::new();
        let first = storage.ensure_folder("Finance", "root").await.unwrap();
        let second = storage.ensure_folder("Finance", "root").await.unwrap();
        assert_eq!(first, second);

        let folder = storage.file(&first).await.unwrap();
        assert!(folder.is_folder());
    }

    #[tokio::test]
    async fn move_then_mark_updates_record() {
        let storage = MemoryStorage::new();
        storage.add_file(file_in("root", "a", "a.pdf"), "a").await;
        let dest = storage.ensure_folder("HR", "root").await.unwrap();

        storage.move_file("a", &dest).await.unwrap();
        storage.mark_organized("a").await.unwrap();

        let moved = storage.file("a").await.unwrap();
        assert_eq!(moved.parent_id.as_deref(), Some(dest.as_str()));
        assert!(moved.organized);
    }

    #[tokio::test]
    async fn change_feed_returns_tail_after_cursor() {
        let storage = MemoryStorage::new();
        storage.add_file(file_in("root", "a", "a.pdf"), "a").await;
        storage.record_change("a").await;

        let cursor = storage.start_cursor().await.unwrap();
        storage.add_file(file_in("root", "b", "b.pdf"), "b").await;
        storage.record_change("b").await;

        let list = storage.changes_since(&cursor).await.unwrap();
        assert_eq!(list.events.len(), 1);
        assert_eq!(list.events[0].file_id, "b");
        assert_eq!(list.next_cursor, "2");
    }

    #[tokio::test]
    async fn removed_change_has_no_record() {
        let storage = MemoryStorage::new();
        storage.record_change("ghost").await;

        let list = storage.changes_since("0").await.unwrap();
        assert!(list.events[0].removed);
        assert!(list.events[0].file.is_none());
    }

    #[tokio::test]
    async fn watch_registers_channel_and_cancel_clears_it() {
        let storage = MemoryStorage::new();
        let request = ChannelRequest {
            id: "chan-1".into(),
            token: "tok-1".into(),
            address: "https://example.com/notifications".into(),
            lease_secs: 3600,
        };
        let channel = storage.watch("root", &request).await.unwrap();
        assert_eq!(channel.id, "chan-1");
        assert!(channel.resource_id.is_some());
        assert!(storage.active_channel().await.is_some());

        storage.cancel_watch(&channel).await.unwrap();
        assert!(storage.active_channel().await.is_none());
        assert_eq!(storage.cancelled_channels().await, vec!["chan-1"]);
    }

    #[tokio::test]
    async fn failure_switches_surface_errors() {
        let storage = MemoryStorage::new();
        storage.add_file(file_in("root", "a", "a.pdf"), "a").await;

        storage.fail_downloads(true);
        let record = storage.file("a").await.unwrap();
        let err = storage.download(&record).await.unwrap_err();
        assert!(err.is_retryable());

        storage.fail_moves(true);
        let err = storage.move_file("a", "dest").await.unwrap_err();
        assert!(matches!(err, StorageError::Api { status: 500, .. }));
    }
}
