use anyhow::{Result, anyhow};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::chat_config::MonitoredChatConfigStore;
use crate::discovery::ChatDirectoryDiscovery;
use crate::engine::{EngineCfg, IngestionEngine, RunStats};
use crate::env::parse_env;
use crate::error::IngestError;
use crate::platform::ChatPlatform;
use crate::sink::PersistenceSink;
use crate::store::firestore::{FirestoreCfg, FirestoreStore};
use crate::store::{DocumentStore, OfflineStore};

/// Firestore when a project is configured, otherwise a store that is
/// always unavailable.
pub(super) fn build_store() -> Result<Arc<dyn DocumentStore>> {
    match FirestoreCfg::from_env() {
        Some(cfg) => {
            let store = FirestoreStore::new(cfg)?;
            info!("Remote store: {store}");
            Ok(Arc::new(store))
        }
        None => {
            warn!("FIRESTORE_PROJECT_ID is not set; running without a remote store");
            Ok(Arc::new(OfflineStore))
        }
    }
}

pub(super) fn event_queue_capacity() -> usize {
    parse_env("EVENT_QUEUE_CAPACITY", 1024usize).max(1)
}

/// Wire every component from the environment and run the engine to the end.
pub(super) async fn run_engine(
    platform: Box<dyn ChatPlatform>,
    discovery: Option<ChatDirectoryDiscovery>,
    shutdown: watch::Receiver<bool>,
) -> Result<RunStats> {
    let store = build_store()?;
    let configs = MonitoredChatConfigStore::from_env(Arc::clone(&store));
    let sink = PersistenceSink::select_from_env(Arc::clone(&store)).await;

    let engine = IngestionEngine::new(
        platform,
        discovery,
        configs,
        sink,
        store,
        EngineCfg::from_env(),
    );

    engine.run(shutdown).await.map_err(|e| match e {
        IngestError::AuthenticationRequired(reason) => anyhow!(
            "Telegram login needed ({reason}); rerun with TG_INTERACTIVE_LOGIN=1 on a terminal"
        ),
        other => anyhow!(other),
    })
}

/// Flip the shutdown flag on Ctrl-C.
pub(super) fn shutdown_on_ctrl_c() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    let (tx, rx) = watch::channel(false);
    let signal_tx = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received; draining");
            let _ = signal_tx.send(true);
        }
    });
    (tx, rx)
}
