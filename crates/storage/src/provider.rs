use async_trait::async_trait;
use bytes::Bytes;
use docshelf_core::{ChangeList, FileRecord, SubscriptionChannel};

use crate::error::StorageError;

/// Constraints applied to a listing sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListFilter {
    /// Skip files already carrying the organized marker.
    pub exclude_organized: bool,
    /// Skip folders, including the category folders the organizer created.
    pub exclude_folders: bool,
}

impl ListFilter {
    /// The filter a batch sweep uses: documents only, not yet organized.
    #[must_use]
    pub fn sweep() -> Self {
        Self {
            exclude_organized: true,
            exclude_folders: true,
        }
    }

    /// Whether `file` passes this filter.
    #[must_use]
    pub fn accepts(&self, file: &FileRecord) -> bool {
        if self.exclude_organized && file.organized {
            return false;
        }
        if self.exclude_folders && file.is_folder() {
            return false;
        }
        true
    }
}

/// Parameters for establishing a push channel with the provider.
#[derive(Debug, Clone)]
pub struct ChannelRequest {
    /// Channel identifier the provider will echo back in notifications.
    pub id: String,
    /// Opaque token echoed alongside the identifier.
    pub token: String,
    /// Public HTTPS address the provider POSTs notifications to.
    pub address: String,
    /// Requested lease in seconds. The provider may shorten it.
    pub lease_secs: u64,
}

impl ChannelRequest {
    /// Build the request that would establish `channel` at `address`.
    #[must_use]
    pub fn for_channel(channel: &SubscriptionChannel, address: impl Into<String>) -> Self {
        let lease_secs = (channel.expires_at - channel.created_at)
            .num_seconds()
            .max(0)
            .unsigned_abs();
        Self {
            id: channel.id.clone(),
            token: channel.token.clone(),
            address: address.into(),
            lease_secs,
        }
    }
}

/// Remote file-storage collaborator.
///
/// The pipeline and ingestion layers only speak this trait; the HTTP client
/// and the in-memory test double both implement it.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug {
    /// List the direct children of `root` that pass `filter`.
    async fn list(
        &self,
        root: &str,
        filter: &ListFilter,
    ) -> Result<Vec<FileRecord>, StorageError>;

    /// Fetch a file's bytes. Native provider documents are exported to their
    /// text form rather than downloaded raw.
    async fn download(&self, file: &FileRecord) -> Result<Bytes, StorageError>;

    /// Re-parent a file into `dest_folder`. Moving a file into its current
    /// parent is a no-op, which makes retrying a timed-out move safe.
    async fn move_file(&self, id: &str, dest_folder: &str) -> Result<(), StorageError>;

    /// Return the folder named `name` under `parent`, creating it if absent.
    /// Idempotent: repeated calls yield the same identifier.
    async fn ensure_folder(&self, name: &str, parent: &str) -> Result<String, StorageError>;

    /// Persist the organized marker on a file.
    async fn mark_organized(&self, id: &str) -> Result<(), StorageError>;

    /// Establish a push-notification channel for changes under `root`.
    async fn watch(
        &self,
        root: &str,
        request: &ChannelRequest,
    ) -> Result<SubscriptionChannel, StorageError>;

    /// Stop a previously established channel. Best effort; a channel whose
    /// lease already lapsed reports success.
    async fn cancel_watch(&self, channel: &SubscriptionChannel) -> Result<(), StorageError>;

    /// A cursor positioned at "now", before which no changes are reported.
    async fn start_cursor(&self) -> Result<String, StorageError>;

    /// Everything that changed after `cursor`, plus the cursor to use next.
    async fn changes_since(&self, cursor: &str) -> Result<ChangeList, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use docshelf_core::FOLDER_MIME;

    #[test]
    fn sweep_filter_excludes_organized_and_folders() {
        let filter = ListFilter::sweep();

        let mut organized = FileRecord::new("a", "done.pdf", "application/pdf");
        organized.organized = true;
        assert!(!filter.accepts(&organized));

        let folder = FileRecord::new("b", "Finance", FOLDER_MIME);
        assert!(!filter.accepts(&folder));

        let fresh = FileRecord::new("c", "new.pdf", "application/pdf");
        assert!(filter.accepts(&fresh));
    }

    #[test]
    fn default_filter_accepts_everything() {
        let filter = ListFilter::default();
        let folder = FileRecord::new("b", "Finance", FOLDER_MIME);
        assert!(filter.accepts(&folder));
    }

    #[test]
    fn channel_request_mirrors_channel() {
        let channel = SubscriptionChannel::new(3600);
        let request = ChannelRequest::for_channel(&channel, "https://example.com/notifications");
        assert_eq!(request.id, channel.id);
        assert_eq!(request.token, channel.token);
        assert_eq!(request.lease_secs, 3600);
    }
}
