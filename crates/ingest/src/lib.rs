//! Change ingestion: how edits in the watched folder become organize work.
//!
//! Three collaborators share one [`IngestState`]:
//!
//! - [`ChangeIntake`] verifies push notifications, deduplicates them, and
//!   resolves the provider's change feed into queued [`docshelf_core::FileRecord`]s.
//! - [`SubscriptionManager`] owns the push channel lifecycle: subscribe on
//!   start, renew before the lease ends, fall back to polling on failure.
//! - [`Poller`] ticks the change feed whenever push delivery is down.

pub mod error;
pub mod manager;
pub mod notification;
pub mod poller;
pub mod state;

pub use error::IngestError;
pub use manager::{
    DEFAULT_LEASE_SECONDS, DEFAULT_RENEWAL_MARGIN_SECONDS, SubscriptionConfig,
    SubscriptionManager,
};
pub use notification::{ChangeIntake, DiscardReason, IntakeOutcome, Notification};
pub use poller::{DEFAULT_POLL_INTERVAL_SECONDS, Poller};
pub use state::{IngestState, WatchMode};
