use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::notification::ChangeIntake;

/// Default polling cadence: five minutes.
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 300;

/// Change-feed polling fallback.
///
/// Ticks on a fixed interval and resolves pending changes whenever push
/// delivery is not active. While a healthy channel exists the ticks are
/// no-ops, so running the poller unconditionally is cheap.
#[derive(Debug)]
pub struct Poller {
    intake: Arc<ChangeIntake>,
    interval: Duration,
}

impl Poller {
    pub fn new(intake: Arc<ChangeIntake>, interval: Duration) -> Self {
        Self { intake, interval }
    }

    /// Poll until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if !self.intake.is_polling().await {
                continue;
            }
            match self.intake.resolve_pending().await {
                Ok(0) => {}
                Ok(enqueued) => info!(enqueued, "polling pass queued files"),
                Err(e) => warn!(error = %e, "polling pass failed"),
            }
        }
    }
}

// -- Tests ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use docshelf_core::FileRecord;
    use docshelf_storage::MemoryStorage;
    use tokio::sync::mpsc;

    use super::*;
    use crate::state::{IngestState, WatchMode};

    fn root_file(id: &str) -> FileRecord {
        FileRecord {
            id: id.into(),
            name: format!("{id}.txt"),
            mime_type: "text/plain".into(),
            size: 1,
            parent_id: Some("root".into()),
            organized: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polling_picks_up_changes_when_push_is_down() {
        let storage = Arc::new(MemoryStorage::new());
        let state = IngestState::shared();
        state.lock().await.cursor = Some("0".into());
        let (sender, mut receiver) = mpsc::channel(16);
        let intake = Arc::new(ChangeIntake::new(
            storage.clone(),
            state.clone(),
            sender,
            "root",
        ));

        let cancel = CancellationToken::new();
        let poller = Poller::new(intake, Duration::from_secs(300));
        let task = tokio::spawn(poller.run(cancel.clone()));

        storage.add_file(root_file("f1"), "hello").await;
        storage.record_change("f1").await;

        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(receiver.recv().await.unwrap().id, "f1");

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn polling_is_idle_while_push_is_healthy() {
        let storage = Arc::new(MemoryStorage::new());
        let state = IngestState::shared();
        {
            let mut guard = state.lock().await;
            guard.cursor = Some("0".into());
            guard.mode = WatchMode::Push;
        }
        let (sender, mut receiver) = mpsc::channel(16);
        let intake = Arc::new(ChangeIntake::new(
            storage.clone(),
            state.clone(),
            sender,
            "root",
        ));

        let cancel = CancellationToken::new();
        let poller = Poller::new(intake, Duration::from_secs(300));
        let task = tokio::spawn(poller.run(cancel.clone()));

        storage.add_file(root_file("f1"), "hello").await;
        storage.record_change("f1").await;

        tokio::time::sleep(Duration::from_secs(900)).await;
        assert!(receiver.try_recv().is_err());

        cancel.cancel();
        task.await.unwrap();
    }
}
