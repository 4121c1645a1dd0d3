use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::file::FileRecord;

/// A time-bounded push-notification subscription against the provider.
///
/// The invariant `expires_at = created_at + lease` holds at construction.
/// Channels are replaced on renewal, never mutated; notifications carrying a
/// superseded channel's token are stale and must be discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionChannel {
    /// Channel identifier we choose and the provider echoes back.
    pub id: String,
    /// Opaque token echoed in every notification for this channel.
    pub token: String,
    /// Provider-side identifier for the watched resource, required to
    /// cancel the channel. Filled in from the provider's watch response.
    pub resource_id: Option<String>,
    /// When the channel was created.
    pub created_at: DateTime<Utc>,
    /// When the lease ends and notifications stop.
    pub expires_at: DateTime<Utc>,
}

impl SubscriptionChannel {
    /// Create a channel with a fresh id and token and the given lease.
    #[must_use]
    pub fn new(lease_secs: u64) -> Self {
        let created_at = Utc::now();
        let lease = Duration::seconds(i64::try_from(lease_secs).unwrap_or(i64::MAX));
        Self {
            id: Uuid::new_v4().to_string(),
            token: Uuid::new_v4().to_string(),
            resource_id: None,
            created_at,
            expires_at: created_at + lease,
        }
    }

    /// Whether the lease has ended at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// The instant renewal should run: a fixed margin before expiry, but
    /// never before creation for very short leases.
    #[must_use]
    pub fn renew_at(&self, margin_secs: u64) -> DateTime<Utc> {
        let margin = Duration::seconds(i64::try_from(margin_secs).unwrap_or(i64::MAX));
        (self.expires_at - margin).max(self.created_at)
    }

    /// Whether a notification's channel id and token match this channel.
    #[must_use]
    pub fn matches(&self, channel_id: &str, token: &str) -> bool {
        self.id == channel_id && self.token == token
    }
}

/// One provider-reported change to the watched tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Identifier of the changed file.
    pub file_id: String,
    /// Whether the file was removed. Removals are ignored by ingestion.
    #[serde(default)]
    pub removed: bool,
    /// Full record when the provider includes it in the change feed.
    pub file: Option<FileRecord>,
}

/// A page of changes plus the cursor for the next query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeList {
    pub events: Vec<ChangeEvent>,
    /// Cursor covering everything up to and including these events.
    pub next_cursor: String,
}

// -- Tests ------------------------------------------------------------------
