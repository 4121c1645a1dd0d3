use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use docshelf_core::{RetryStrategy, SubscriptionChannel};
use docshelf_storage::{ChannelRequest, StorageProvider};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::state::{IngestState, WatchMode};

/// Default lease: seven days, matching what the provider grants at most.
pub const DEFAULT_LEASE_SECONDS: u64 = 604_800;

/// Default renewal margin: one hour before expiry.
pub const DEFAULT_RENEWAL_MARGIN_SECONDS: u64 = 3600;

/// Subscription lifecycle settings.
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    /// Public HTTPS address the provider POSTs notifications to.
    pub address: String,
    /// Requested channel lease in seconds.
    pub lease_seconds: u64,
    /// How long before expiry renewal runs, in seconds.
    pub renewal_margin_seconds: u64,
    /// Backoff between failed subscription attempts.
    pub retry: RetryStrategy,
}

impl SubscriptionConfig {
    /// Settings for notifications delivered to `address`, with the default
    /// lease and renewal margin.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            lease_seconds: DEFAULT_LEASE_SECONDS,
            renewal_margin_seconds: DEFAULT_RENEWAL_MARGIN_SECONDS,
            retry: RetryStrategy::default(),
        }
    }
}

/// Owns the push channel: establishes it, renews it shortly before expiry,
/// and degrades ingestion to polling while the provider will not take a
/// subscription.
///
/// Renewal installs a replacement channel rather than extending the old
/// one. The dedup ledger resets with it, since message numbers restart per
/// channel, and notifications still carrying the superseded channel's
/// token fail the intake's channel check from that point on.
#[derive(Debug)]
pub struct SubscriptionManager {
    storage: Arc<dyn StorageProvider>,
    state: Arc<Mutex<IngestState>>,
    config: SubscriptionConfig,
    root: String,
}

impl SubscriptionManager {
    pub fn new(
        storage: Arc<dyn StorageProvider>,
        state: Arc<Mutex<IngestState>>,
        config: SubscriptionConfig,
        root: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            state,
            config,
            root: root.into(),
        }
    }

    /// Establish the initial channel right away instead of waiting for the
    /// background loop's first pass.
    pub async fn establish(&self) -> Result<(), IngestError> {
        self.ensure_channel().await.map(drop)
    }

    /// Run the renewal loop until `cancel` fires, then stop the active
    /// channel.
    pub async fn run(self, cancel: CancellationToken) {
        let mut attempt: u32 = 0;
        loop {
            let wait = match self.ensure_channel().await {
                Ok(wait) => {
                    attempt = 0;
                    wait
                }
                Err(e) => {
                    self.degrade_if_lapsed().await;
                    let backoff = self.config.retry.delay_for(attempt);
                    attempt = attempt.saturating_add(1);
                    warn!(
                        error = %e,
                        attempt,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        "subscription attempt failed"
                    );
                    backoff
                }
            };

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(wait) => {}
            }
        }
        self.teardown().await;
    }

    /// Make sure a live channel exists, subscribing or renewing as needed.
    /// Returns how long to sleep until the next lifecycle action.
    async fn ensure_channel(&self) -> Result<Duration, IngestError> {
        let now = Utc::now();
        {
            let state = self.state.lock().await;
            if let Some(channel) = &state.channel {
                let due = channel.renew_at(self.config.renewal_margin_seconds);
                if now < due && !channel.is_expired(now) {
                    return Ok(wake_after(due));
                }
            }
        }
        self.subscribe().await
    }

    async fn subscribe(&self) -> Result<Duration, IngestError> {
        // Baseline the cursor before registering, so nothing slips between
        // registration and the first resolution.
        let baseline = if self.state.lock().await.cursor.is_none() {
            Some(self.storage.start_cursor().await?)
        } else {
            None
        };

        let candidate = SubscriptionChannel::new(self.config.lease_seconds);
        let request = ChannelRequest::for_channel(&candidate, &self.config.address);
        let channel = self.storage.watch(&self.root, &request).await?;

        let expires_at = channel.expires_at;
        let due = channel.renew_at(self.config.renewal_margin_seconds);

        let previous = {
            let mut state = self.state.lock().await;
            if let Some(cursor) = baseline {
                state.cursor = Some(cursor);
            }
            // Message numbers restart with the new channel.
            state.seen.clear();
            state.mode = WatchMode::Push;
            state.channel.replace(channel)
        };

        if let Some(old) = previous {
            if let Err(e) = self.storage.cancel_watch(&old).await {
                debug!(channel = %old.id, error = %e, "failed to stop superseded channel");
            }
        }

        info!(channel = %request.id, %expires_at, "push channel established");
        Ok(wake_after(due))
    }

    /// Flip to polling when the active channel is gone or past its lease.
    /// A renewal failure with time still on the old lease keeps push alive.
    async fn degrade_if_lapsed(&self) {
        let mut state = self.state.lock().await;
        let live = state
            .channel
            .as_ref()
            .is_some_and(|c| !c.is_expired(Utc::now()));
        if !live && state.mode != WatchMode::Polling {
            state.channel = None;
            state.mode = WatchMode::Polling;
            warn!("push channel lapsed, falling back to change-feed polling");
        }
    }

    async fn teardown(&self) {
        let channel = self.state.lock().await.channel.take();
        if let Some(channel) = channel {
            match self.storage.cancel_watch(&channel).await {
                Ok(()) => info!(channel = %channel.id, "stopped push channel"),
                Err(e) => {
                    debug!(channel = %channel.id, error = %e, "failed to stop channel during shutdown");
                }
            }
        }
    }
}

/// Sleep duration until `due`, with a one second floor so a tight renewal
/// window cannot spin the loop.
fn wake_after(due: DateTime<Utc>) -> Duration {
    (due - Utc::now())
        .to_std()
        .unwrap_or(Duration::ZERO)
        .max(Duration::from_secs(1))
}

// -- Tests ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use docshelf_storage::MemoryStorage;

    use super::*;

    fn manager_with(
        storage: Arc<MemoryStorage>,
        state: Arc<Mutex<IngestState>>,
    ) -> SubscriptionManager {
        SubscriptionManager::new(
            storage,
            state,
            SubscriptionConfig::new("https://docshelf.example/notifications"),
            "root",
        )
    }

    #[tokio::test]
    async fn establish_registers_channel_and_baseline() {
        let storage = Arc::new(MemoryStorage::new());
        let state = IngestState::shared();
        let manager = manager_with(storage.clone(), state.clone());

        manager.establish().await.unwrap();

        let guard = state.lock().await;
        let channel = guard.channel().unwrap();
        assert!(channel.resource_id.is_some());
        assert_eq!(guard.cursor.as_deref(), Some("0"));
        assert_eq!(guard.mode(), WatchMode::Push);
        assert_eq!(storage.active_channel().await.unwrap().id, channel.id);
    }

    #[tokio::test]
    async fn renewal_replaces_channel_and_clears_ledger() {
        let storage = Arc::new(MemoryStorage::new());
        let state = IngestState::shared();
        let manager = manager_with(storage.clone(), state.clone());

        manager.establish().await.unwrap();
        let old_id = {
            let mut guard = state.lock().await;
            guard.seen.insert("stale-channel:4".into());
            guard.cursor = Some("5".into());
            // Force the lease to look spent.
            let expired = SubscriptionChannel::new(0);
            let expired_id = expired.id.clone();
            guard.channel = Some(expired);
            expired_id
        };

        manager.establish().await.unwrap();

        let guard = state.lock().await;
        let renewed = guard.channel().unwrap();
        assert_ne!(renewed.id, old_id);
        assert!(guard.seen.is_empty());
        // The cursor survives renewal; no change window is lost.
        assert_eq!(guard.cursor.as_deref(), Some("5"));
        assert!(storage.cancelled_channels().await.contains(&old_id));
    }

    #[tokio::test]
    async fn failed_subscription_leaves_polling_mode() {
        let storage = Arc::new(MemoryStorage::new());
        let state = IngestState::shared();
        storage.fail_watch(true);
        let manager = manager_with(storage, state.clone());

        assert!(manager.establish().await.is_err());
        assert_eq!(state.lock().await.mode(), WatchMode::Polling);
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_recovers_after_watch_failures() {
        let storage = Arc::new(MemoryStorage::new());
        let state = IngestState::shared();
        storage.fail_watch(true);

        let cancel = CancellationToken::new();
        let manager = manager_with(storage.clone(), state.clone());
        let task = tokio::spawn(manager.run(cancel.clone()));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(state.lock().await.channel().is_none());
        assert_eq!(state.lock().await.mode(), WatchMode::Polling);

        storage.fail_watch(false);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(state.lock().await.mode(), WatchMode::Push);
        assert!(state.lock().await.channel().is_some());

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_active_channel() {
        let storage = Arc::new(MemoryStorage::new());
        let state = IngestState::shared();
        let manager = manager_with(storage.clone(), state.clone());
        manager.establish().await.unwrap();
        let id = state.lock().await.channel().unwrap().id.clone();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(manager.run(cancel.clone()));
        tokio::task::yield_now().await;
        cancel.cancel();
        task.await.unwrap();

        assert!(storage.cancelled_channels().await.contains(&id));
        assert!(state.lock().await.channel().is_none());
    }
}
