//! Where accepted messages end up: the remote store when it answered at
//! startup, otherwise one JSON file per message on local disk.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::atomic_file;
use crate::env::env_or;
use crate::error::IngestError;
use crate::model::IngestedMessage;
use crate::store::DocumentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    Remote,
    Local,
}

impl fmt::Display for SinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Remote => "remote",
            Self::Local => "local",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavedTo {
    Remote(String),
    Local(PathBuf),
}

pub struct PersistenceSink {
    mode: SinkMode,
    store: Arc<dyn DocumentStore>,
    local_dir: PathBuf,
}

impl PersistenceSink {
    /// Probe the store once and fix the mode for the rest of the run.
    pub async fn select(store: Arc<dyn DocumentStore>, local_dir: impl Into<PathBuf>) -> Self {
        let local_dir = local_dir.into();
        let mode = match store.probe().await {
            Ok(()) => {
                info!("Remote store {} is reachable; saving messages remotely", store.name());
                SinkMode::Remote
            }
            Err(e) => {
                warn!(
                    "Remote store {} unavailable ({e}); saving messages to {}",
                    store.name(),
                    local_dir.display()
                );
                SinkMode::Local
            }
        };
        Self {
            mode,
            store,
            local_dir,
        }
    }

    /// `LOCAL_MESSAGES_DIR`, default `./data/messages`.
    pub async fn select_from_env(store: Arc<dyn DocumentStore>) -> Self {
        Self::select(store, env_or("LOCAL_MESSAGES_DIR", "./data/messages")).await
    }

    pub fn mode(&self) -> SinkMode {
        self.mode
    }

    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    /// Write one message.  Single attempt, no retry.
    pub async fn save(&self, message: &IngestedMessage) -> Result<SavedTo, IngestError> {
        match self.mode {
            SinkMode::Remote => self
                .store
                .append_message(message)
                .await
                .map(SavedTo::Remote)
                .map_err(|e| IngestError::Persistence(e.to_string())),
            SinkMode::Local => {
                let path = self
                    .local_dir
                    .join(local_file_name(message.created_at, &message.fingerprint));
                let message = message.clone();
                tokio::task::spawn_blocking(move || {
                    atomic_file::create_json(&path, &message)
                        .map(|()| SavedTo::Local(path))
                        .map_err(|e| IngestError::Persistence(format!("{e:#}")))
                })
                .await
                .map_err(|e| IngestError::Persistence(format!("local write task failed: {e}")))?
            }
        }
    }
}

/// `message_<YYYYmmdd_HHMMSS>_<first 8 fingerprint chars>.json`
pub fn local_file_name(created_at: DateTime<Utc>, fingerprint: &str) -> String {
    let prefix = fingerprint.get(..8).unwrap_or(fingerprint);
    format!(
        "message_{}_{prefix}.json",
        created_at.format("%Y%m%d_%H%M%S")
    )
}
