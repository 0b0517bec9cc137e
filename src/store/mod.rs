//! Remote document store: the `monitored_chats` collection we read and the
//! append-only messages collection we write.

pub mod firestore;
#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::{IngestedMessage, MonitoredChatConfig};

pub const MONITORED_CHATS_COLLECTION: &str = "monitored_chats";

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short label for log lines.
    fn name(&self) -> &str;

    /// Cheap round-trip used once at startup to pick the sink mode.
    async fn probe(&self) -> Result<(), StoreError>;

    /// Every document of the monitored-chats collection.
    async fn fetch_monitored_chats(&self) -> Result<Vec<MonitoredChatConfig>, StoreError>;

    /// Append one message; returns the new document id.
    async fn append_message(&self, message: &IngestedMessage) -> Result<String, StoreError>;

    /// `true` when a message with this fingerprint was created at or after `since`.
    async fn fingerprint_seen_since(
        &self,
        fingerprint: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

/// Stand-in used when no remote project is configured.  Every call fails,
/// which sends the config store to its cache and the sink to local files.
pub struct OfflineStore;

#[async_trait]
impl DocumentStore for OfflineStore {
    fn name(&self) -> &str {
        "offline"
    }

    async fn probe(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn fetch_monitored_chats(&self) -> Result<Vec<MonitoredChatConfig>, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn append_message(&self, _message: &IngestedMessage) -> Result<String, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn fingerprint_seen_since(
        &self,
        _fingerprint: &str,
        _since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable)
    }
}
