use std::sync::Arc;

use docshelf_core::FileRecord;
use docshelf_storage::StorageProvider;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::error::IngestError;
use crate::state::{IngestState, WatchMode};

/// Resource state the provider sends when a channel is first established.
const SYNC_STATE: &str = "sync";

/// A push notification, as read off the webhook request headers.
///
/// The provider sends no body; everything of interest travels in headers,
/// and the change content itself has to be fetched from the change feed.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Channel identifier chosen at subscription time.
    pub channel_id: String,
    /// Token chosen at subscription time, echoed back verbatim.
    pub token: String,
    /// What happened: `sync` on channel creation, otherwise a change kind.
    pub resource_state: String,
    /// Monotonic per-channel sequence number.
    pub message_number: String,
}

impl Notification {
    /// Identifier used for duplicate suppression. Message numbers restart
    /// per channel, so the channel id is part of the key.
    #[must_use]
    pub fn event_id(&self) -> String {
        format!("{}:{}", self.channel_id, self.message_number)
    }
}

/// What the intake did with a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// The change feed was resolved; this many files were handed to the
    /// organize queue.
    Enqueued { enqueued: usize },
    /// Initial handshake for a freshly established channel.
    Handshake,
    /// Dropped without touching the change feed.
    Discarded(DiscardReason),
}

/// Why a notification was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Channel id or token does not match the active channel; the sender
    /// is a superseded or unknown channel.
    StaleChannel,
    /// Same message was already processed during this channel's lifetime.
    Duplicate,
}

/// Turns notifications (and polling passes) into queued files.
///
/// Verification, dedup, change resolution, and the cursor advance all run
/// under one state lock, so concurrent notifications resolve the feed one
/// at a time and never double-enqueue.
#[derive(Debug)]
pub struct ChangeIntake {
    storage: Arc<dyn StorageProvider>,
    state: Arc<Mutex<IngestState>>,
    queue: mpsc::Sender<FileRecord>,
    root: String,
}

impl ChangeIntake {
    pub fn new(
        storage: Arc<dyn StorageProvider>,
        state: Arc<Mutex<IngestState>>,
        queue: mpsc::Sender<FileRecord>,
        root: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            state,
            queue,
            root: root.into(),
        }
    }

    /// Handle one push notification.
    ///
    /// Notifications that fail the channel check are discarded rather than
    /// erroring: a stale channel keeps POSTing until its lease runs out,
    /// and that is the provider's problem, not ours.
    pub async fn handle(&self, notification: &Notification) -> Result<IntakeOutcome, IngestError> {
        let mut state = self.state.lock().await;

        let matches = state
            .channel
            .as_ref()
            .is_some_and(|c| c.matches(&notification.channel_id, &notification.token));
        if !matches {
            debug!(
                channel = %notification.channel_id,
                "notification failed the channel check, dropping"
            );
            return Ok(IntakeOutcome::Discarded(DiscardReason::StaleChannel));
        }

        if notification.resource_state == SYNC_STATE {
            debug!(channel = %notification.channel_id, "channel handshake");
            return Ok(IntakeOutcome::Handshake);
        }

        let event_id = notification.event_id();
        if !state.seen.insert(event_id.clone()) {
            debug!(event = %event_id, "duplicate notification, dropping");
            return Ok(IntakeOutcome::Discarded(DiscardReason::Duplicate));
        }

        match self.resolve_locked(&mut state).await {
            Ok(enqueued) => Ok(IntakeOutcome::Enqueued { enqueued }),
            Err(e) => {
                // The cursor did not advance; un-mark the event so the
                // next trigger replays this window.
                state.seen.remove(&event_id);
                Err(e)
            }
        }
    }

    /// Resolve pending changes outside any notification. The polling
    /// fallback calls this on its interval.
    pub async fn resolve_pending(&self) -> Result<usize, IngestError> {
        let mut state = self.state.lock().await;
        self.resolve_locked(&mut state).await
    }

    /// Whether ingestion currently relies on polling.
    pub async fn is_polling(&self) -> bool {
        self.state.lock().await.mode == WatchMode::Polling
    }

    async fn resolve_locked(&self, state: &mut IngestState) -> Result<usize, IngestError> {
        let Some(cursor) = state.cursor.clone() else {
            // First contact: take a baseline so later passes see only new
            // changes. Pre-existing files are the batch sweep's job.
            let cursor = self.storage.start_cursor().await?;
            state.cursor = Some(cursor);
            return Ok(0);
        };

        let list = self.storage.changes_since(&cursor).await?;
        let mut enqueued = 0usize;
        for event in list.events {
            if event.removed {
                continue;
            }
            let Some(file) = event.file else {
                continue;
            };
            // Only direct children of the watched root are candidates; a
            // move out of the root (our own included) falls out here.
            if file.parent_id.as_deref() != Some(self.root.as_str()) {
                continue;
            }
            if file.organized {
                continue;
            }
            debug!(file = %file.name, "change event queued for organizing");
            self.queue
                .send(file)
                .await
                .map_err(|_| IngestError::QueueClosed)?;
            enqueued += 1;
        }
        state.cursor = Some(list.next_cursor);
        Ok(enqueued)
    }
}

// -- Tests ------------------------------------------------------------------
