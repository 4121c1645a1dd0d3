use std::collections::HashSet;
use std::sync::Arc;

use docshelf_core::SubscriptionChannel;
use tokio::sync::Mutex;

/// How change events currently reach the organizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchMode {
    /// Push notifications arrive on an active channel.
    Push,
    /// Periodic change-feed polling, used before the first successful
    /// subscription and whenever the channel lapses.
    #[default]
    Polling,
}

/// Shared watch-session state.
///
/// Holds the active channel, the change-feed cursor, and the notification
/// dedup ledger. The intake, the subscription manager, and the poller all
/// work against one instance behind a mutex; the notification checks and
/// the cursor advance must happen under a single lock acquisition to stay
/// consistent.
#[derive(Debug, Default)]
pub struct IngestState {
    pub(crate) channel: Option<SubscriptionChannel>,
    pub(crate) seen: HashSet<String>,
    pub(crate) cursor: Option<String>,
    pub(crate) mode: WatchMode,
}

impl IngestState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap fresh state in the shared handle the intake, the subscription
    /// manager, and the poller expect.
    #[must_use]
    pub fn shared() -> Arc<Mutex<IngestState>> {
        Arc::new(Mutex::new(Self::new()))
    }

    /// The currently active push channel, if any.
    #[must_use]
    pub fn channel(&self) -> Option<&SubscriptionChannel> {
        self.channel.as_ref()
    }

    /// The current ingestion mode.
    #[must_use]
    pub fn mode(&self) -> WatchMode {
        self.mode
    }
}
