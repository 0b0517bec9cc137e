//! Monitored-chat configuration with a local TTL cache in front of the
//! remote store.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::atomic_file;
use crate::env::{env_or, parse_env};
use crate::error::IngestError;
use crate::model::MonitoredChatConfig;
use crate::store::DocumentStore;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// On-disk cache: the last fetched collection and when it was written.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    written_at: DateTime<Utc>,
    chats: Vec<MonitoredChatConfig>,
}

pub struct MonitoredChatConfigStore {
    store: Arc<dyn DocumentStore>,
    cache_path: PathBuf,
    ttl: Duration,
}

impl MonitoredChatConfigStore {
    pub fn new(store: Arc<dyn DocumentStore>, cache_path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            store,
            cache_path: cache_path.into(),
            ttl,
        }
    }

    /// | Env var                 | Default                                |
    /// |-------------------------|----------------------------------------|
    /// | `CONFIG_CACHE_PATH`     | `./config/monitored_chats_cache.json`  |
    /// | `CONFIG_CACHE_TTL_SECS` | `3600`                                 |
    pub fn from_env(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(
            store,
            env_or("CONFIG_CACHE_PATH", "./config/monitored_chats_cache.json"),
            Duration::from_secs(parse_env("CONFIG_CACHE_TTL_SECS", DEFAULT_CACHE_TTL.as_secs())),
        )
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Current monitored-chat list.  Never fails: a remote failure falls back
    /// to the cache (even when stale), then to an empty list.
    pub async fn load(&self, force_refresh: bool) -> Vec<MonitoredChatConfig> {
        let cached = self.read_cache();

        if !force_refresh {
            if let Some(cache) = &cached {
                if self.is_fresh(cache) {
                    debug!(
                        "Using cached monitored chats ({} entries, written {})",
                        cache.chats.len(),
                        cache.written_at
                    );
                    return cache.chats.clone();
                }
            }
        }

        match self.store.fetch_monitored_chats().await {
            Ok(chats) => {
                info!(
                    "Loaded {} monitored chats from {}",
                    chats.len(),
                    self.store.name()
                );
                if let Err(e) = self.write_cache(&chats) {
                    warn!("Failed to update monitored chat cache: {e:#}");
                }
                chats
            }
            Err(e) => {
                let err = IngestError::ConfigLoad(e.to_string());
                match cached {
                    Some(cache) => {
                        warn!(
                            "{err}; using cached monitored chats from {} ({} entries)",
                            cache.written_at,
                            cache.chats.len()
                        );
                        cache.chats
                    }
                    None => {
                        warn!("{err}; no cache at {}, monitoring nothing", self.cache_path.display());
                        Vec::new()
                    }
                }
            }
        }
    }

    /// Re-fetch from the remote store regardless of cache age.
    pub async fn force_update(&self) -> Vec<MonitoredChatConfig> {
        self.load(true).await
    }

    fn is_fresh(&self, cache: &CacheFile) -> bool {
        let age = Utc::now().signed_duration_since(cache.written_at);
        // A timestamp from the future means clock skew; refetch.
        age.to_std().is_ok_and(|age| age < self.ttl)
    }

    fn read_cache(&self) -> Option<CacheFile> {
        if !self.cache_path.exists() {
            return None;
        }
        match read_cache_file(&self.cache_path) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!("Ignoring unreadable monitored chat cache: {e:#}");
                None
            }
        }
    }

    fn write_cache(&self, chats: &[MonitoredChatConfig]) -> Result<()> {
        let cache = CacheFile {
            written_at: Utc::now(),
            chats: chats.to_vec(),
        };
        atomic_file::replace_json(&self.cache_path, &cache)
    }
}

fn read_cache_file(path: &Path) -> Result<CacheFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}
