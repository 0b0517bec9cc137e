//! The ingestion state machine: connect, discover, monitor, drain, stop.
//!
//! One consumer, one ordered event queue, one event in flight at a time.
//! The dedup cache and counters are owned by the engine and never shared.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::chat_config::MonitoredChatConfigStore;
use crate::discovery::ChatDirectoryDiscovery;
use crate::env::{opt_env, parse_env};
use crate::error::IngestError;
use crate::filter::{DedupCache, MatchIndex, classify, fingerprint};
use crate::model::{InboundEvent, IngestedMessage};
use crate::platform::ChatPlatform;
use crate::sink::{PersistenceSink, SavedTo, SinkMode};
use crate::store::DocumentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Initializing,
    Discovering,
    Monitoring,
    Draining,
    Stopped,
    Failed,
}

/// How duplicates are recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupMode {
    /// Fingerprints seen by this process only.
    InMemory,
    /// Also ask the remote store whether the fingerprint was saved within
    /// the trailing window.  Only consulted while the sink is remote.
    RemoteWindow { window: Duration },
}

#[derive(Debug, Clone)]
pub struct EngineCfg {
    pub dedup_mode: DedupMode,
    pub config_refresh: Duration,
}

impl EngineCfg {
    /// | Env var               | Default  |
    /// |-----------------------|----------|
    /// | `DEDUP_MODE`          | `memory` |
    /// | `DEDUP_WINDOW_HOURS`  | `24`     |
    /// | `CONFIG_REFRESH_SECS` | `300`    |
    pub fn from_env() -> Self {
        let dedup_mode = match opt_env("DEDUP_MODE").map(|v| v.to_lowercase()).as_deref() {
            Some("remote_window") | Some("remote") => DedupMode::RemoteWindow {
                window: Duration::from_secs(parse_env::<u64>("DEDUP_WINDOW_HOURS", 24) * 3600),
            },
            _ => DedupMode::InMemory,
        };
        Self {
            dedup_mode,
            config_refresh: Duration::from_secs(parse_env::<u64>("CONFIG_REFRESH_SECS", 300).max(1)),
        }
    }
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            dedup_mode: DedupMode::InMemory,
            config_refresh: Duration::from_secs(300),
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// Non-empty group/channel messages that reached the filter stage.
    pub processed: u64,
    pub saved: u64,
    pub duplicates: u64,
    /// Unmonitored chat or no keyword hit.
    pub skipped: u64,
    pub errors: u64,
    pub dedup_cache_size: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub state: EngineState,
}

impl RunStats {
    fn new() -> Self {
        Self {
            processed: 0,
            saved: 0,
            duplicates: 0,
            skipped: 0,
            errors: 0,
            dedup_cache_size: 0,
            started_at: Utc::now(),
            finished_at: None,
            state: EngineState::Initializing,
        }
    }

    pub fn uptime(&self) -> chrono::Duration {
        self.finished_at
            .unwrap_or_else(Utc::now)
            .signed_duration_since(self.started_at)
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed={}, saved={}, duplicates={}, skipped={}, errors={}, cache_size={}, uptime={}s, state={:?}",
            self.processed,
            self.saved,
            self.duplicates,
            self.skipped,
            self.errors,
            self.dedup_cache_size,
            self.uptime().num_seconds(),
            self.state,
        )
    }
}

/// What happened to a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Private chat, untitled chat, or empty text.  Not counted.
    Ignored,
    NotMonitored,
    Duplicate,
    NoKeywords,
    Saved(SavedTo),
    Failed,
}

pub struct IngestionEngine {
    platform: Box<dyn ChatPlatform>,
    /// `None` skips the dialog listing and leaves the snapshot alone.
    discovery: Option<ChatDirectoryDiscovery>,
    configs: MonitoredChatConfigStore,
    sink: PersistenceSink,
    store: Arc<dyn DocumentStore>,
    cfg: EngineCfg,
    state: EngineState,
    index: MatchIndex,
    dedup: DedupCache,
    stats: RunStats,
}

impl IngestionEngine {
    pub fn new(
        platform: Box<dyn ChatPlatform>,
        discovery: Option<ChatDirectoryDiscovery>,
        configs: MonitoredChatConfigStore,
        sink: PersistenceSink,
        store: Arc<dyn DocumentStore>,
        cfg: EngineCfg,
    ) -> Self {
        Self {
            platform,
            discovery,
            configs,
            sink,
            store,
            cfg,
            state: EngineState::Initializing,
            index: MatchIndex::default(),
            dedup: DedupCache::new(),
            stats: RunStats::new(),
        }
    }

    #[cfg(test)]
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Run until the event stream ends or `shutdown` flips.  Returns the
    /// final statistics; only a failed login or subscription is an error.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<RunStats, IngestError> {
        match self.sink.mode() {
            SinkMode::Remote => info!("Starting ingestion engine (sink=remote, dedup={:?})", self.cfg.dedup_mode),
            SinkMode::Local => info!(
                "Starting ingestion engine (sink=local:{}, dedup={:?})",
                self.sink.local_dir().display(),
                self.cfg.dedup_mode
            ),
        }

        if let Err(e) = self.initialize().await {
            return Err(self.fail(e).await);
        }

        let events = match self.discover().await {
            Ok(events) => events,
            Err(e) => return Err(self.fail(e).await),
        };

        self.transition(EngineState::Monitoring);
        if *shutdown.borrow() {
            info!("Shutdown requested before monitoring started");
        } else {
            self.monitor(events, &mut shutdown).await;
        }

        let stats = self.drain();
        self.platform.disconnect().await;
        self.transition(EngineState::Stopped);
        Ok(RunStats {
            state: EngineState::Stopped,
            ..stats
        })
    }

    fn transition(&mut self, next: EngineState) {
        debug!("Engine state {:?} -> {:?}", self.state, next);
        self.state = next;
        self.stats.state = next;
    }

    async fn fail(&mut self, e: IngestError) -> IngestError {
        error!("Ingestion failed during {:?}: {e}", self.state);
        self.transition(EngineState::Failed);
        self.platform.disconnect().await;
        e
    }

    async fn initialize(&mut self) -> Result<(), IngestError> {
        let me = self.platform.connect().await?;
        match &me.username {
            Some(username) => info!("Connected as {} (@{username})", me.display_name),
            None => info!("Connected as {}", me.display_name),
        }
        self.transition(EngineState::Discovering);
        Ok(())
    }

    async fn discover(&mut self) -> Result<mpsc::Receiver<InboundEvent>, IngestError> {
        match &self.discovery {
            Some(discovery) => {
                discovery.discover(self.platform.as_mut()).await;
            }
            None => debug!("Chat discovery disabled for this run"),
        }
        self.refresh_configs(false).await;
        Ok(self.platform.subscribe()?)
    }

    /// Reload monitored chats and rebuild the matching set.
    async fn refresh_configs(&mut self, force: bool) {
        let chats = self.configs.load(force).await;
        let (index, problems) = MatchIndex::build(&chats);
        if !problems.is_empty() {
            warn!("{} ambiguous monitored chat entries were left out", problems.len());
        }
        if index.is_empty() {
            warn!(
                "No enabled monitored chats (cache: {}); nothing will be saved",
                self.configs.cache_path().display()
            );
        } else if index.len() != self.index.len() {
            info!("Monitoring {} of {} configured chats", index.len(), chats.len());
        }
        self.index = index;
    }

    async fn monitor(
        &mut self,
        mut events: mpsc::Receiver<InboundEvent>,
        shutdown: &mut watch::Receiver<bool>,
    ) {
        let period = self.cfg.config_refresh;
        let mut refresh = tokio::time::interval_at(Instant::now() + period, period);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Monitoring new messages...");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = refresh.tick() => self.refresh_configs(false).await,
                event = events.recv() => match event {
                    Some(event) => {
                        self.handle_event(event).await;
                    }
                    None => {
                        warn!("Event stream ended.");
                        break;
                    }
                },
            }
        }
    }

    /// Run one event through normalize → match → dedup → classify → save.
    pub async fn handle_event(&mut self, event: InboundEvent) -> EventOutcome {
        let Some(title) = event.chat_title.as_deref().filter(|t| !t.trim().is_empty()) else {
            return EventOutcome::Ignored;
        };
        if !event.chat_kind.is_group_like() || event.text.trim().is_empty() {
            return EventOutcome::Ignored;
        }
        self.stats.processed += 1;

        let Some(config) = self.index.lookup(&event.chat_id) else {
            debug!("Chat {title} ({}) is not monitored", event.chat_id);
            self.stats.skipped += 1;
            return EventOutcome::NotMonitored;
        };

        let fp = fingerprint(&event.text, event.sender_id.as_deref(), &event.chat_id);
        if self.dedup.seen(&fp) {
            debug!("Duplicate message {} in {title}", event.message_id);
            self.stats.duplicates += 1;
            return EventOutcome::Duplicate;
        }
        self.dedup.record(&fp);
        self.stats.dedup_cache_size = self.dedup.len();

        let remote_window = match self.cfg.dedup_mode {
            DedupMode::RemoteWindow { window } if self.sink.mode() == SinkMode::Remote => Some(window),
            _ => None,
        };
        if let Some(window) = remote_window {
            if stored_since(self.store.as_ref(), &fp, window).await {
                debug!("Message {} in {title} already stored recently", event.message_id);
                self.stats.duplicates += 1;
                return EventOutcome::Duplicate;
            }
        }

        let (matched, keywords_found) = classify(&event.text, &config.keywords);
        if !matched {
            self.stats.skipped += 1;
            return EventOutcome::NoKeywords;
        }

        let profile = event.sender.clone().unwrap_or_default();
        let message = IngestedMessage {
            text: event.text.clone(),
            source: "telegram".into(),
            source_chat_id: config.chat_id.clone(),
            chat_title: title.to_string(),
            message_id: event.message_id.clone(),
            sender_id: event.sender_id.clone(),
            sender_name: profile.display_name(),
            sender_username: profile.username.unwrap_or_default(),
            timestamp_utc: event.sent_at,
            fingerprint: fp,
            keywords_found,
            has_media: event.has_media,
            created_at: Utc::now(),
            processed: false,
        };

        match self.sink.save(&message).await {
            Ok(saved) => {
                self.stats.saved += 1;
                match &saved {
                    SavedTo::Remote(id) => info!("Saved message {} from {title} as {id}", message.message_id),
                    SavedTo::Local(path) => {
                        info!("Saved message {} from {title} to {}", message.message_id, path.display())
                    }
                }
                EventOutcome::Saved(saved)
            }
            Err(e) => {
                self.stats.errors += 1;
                warn!(
                    "{e} (chat={title}, chat_id={}, message_id={})",
                    event.chat_id, event.message_id
                );
                EventOutcome::Failed
            }
        }
    }

    fn drain(&mut self) -> RunStats {
        self.transition(EngineState::Draining);
        self.stats.dedup_cache_size = self.dedup.len();
        self.stats.finished_at = Some(Utc::now());
        info!("Final statistics: {}", self.stats);
        self.stats.clone()
    }
}

/// Remote half of the duplicate check.  A failed lookup counts as unseen.
async fn stored_since(store: &dyn DocumentStore, fp: &str, window: Duration) -> bool {
    let window = chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::hours(24));
    match store.fingerprint_seen_since(fp, Utc::now() - window).await {
        Ok(seen) => seen,
        Err(e) => {
            warn!("Remote duplicate check failed, treating as new: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChatKind, MonitoredChatConfig, SenderProfile};
    use crate::platform::scripted::ScriptedPlatform;
    use crate::store::memory::MemoryStore;
    use std::path::Path;
    use std::sync::atomic::Ordering;

    fn config(enabled: bool) -> MonitoredChatConfig {
        MonitoredChatConfig {
            chat_id: "100".into(),
            title: "Test".into(),
            keywords: vec!["груз".into()],
            enabled,
        }
    }

    fn event(chat_id: &str, text: &str) -> InboundEvent {
        InboundEvent {
            chat_id: chat_id.into(),
            chat_title: Some("Test".into()),
            chat_kind: ChatKind::Group,
            message_id: "1".into(),
            sender_id: Some("42".into()),
            sender: Some(SenderProfile {
                first_name: Some("Иван".into()),
                last_name: Some("Петров".into()),
                username: Some("ivan_cargo".into()),
                org_title: None,
            }),
            text: text.into(),
            has_media: false,
            sent_at: Utc::now(),
        }
    }

    async fn engine(
        dir: &Path,
        store: Arc<MemoryStore>,
        platform: ScriptedPlatform,
        cfg: EngineCfg,
    ) -> IngestionEngine {
        let configs = MonitoredChatConfigStore::new(
            store.clone(),
            dir.join("cache.json"),
            Duration::from_secs(3600),
        );
        let sink = PersistenceSink::select(store.clone(), dir.join("messages")).await;
        IngestionEngine::new(
            Box::new(platform),
            Some(ChatDirectoryDiscovery::new(dir.join("discovered.json"))),
            configs,
            sink,
            store,
            cfg,
        )
    }

    async fn run_to_end(engine: IngestionEngine) -> RunStats {
        let (_tx, rx) = watch::channel(false);
        engine.run(rx).await.unwrap()
    }

    #[tokio::test]
    async fn matching_event_is_persisted_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_configs(vec![config(true)]));
        let platform = ScriptedPlatform::new(vec![event("-100100", "Груз 5 тонн, нужен транспорт")]);

        let stats = run_to_end(engine(dir.path(), store.clone(), platform, EngineCfg::default()).await).await;

        let saved = store.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].keywords_found, vec!["груз".to_string()]);
        assert_eq!(saved[0].source_chat_id, "100");
        assert_eq!(saved[0].chat_title, "Test");
        assert_eq!(saved[0].sender_name, "Иван Петров");
        assert_eq!(saved[0].sender_username, "ivan_cargo");
        assert!(!saved[0].processed);
        assert_eq!(
            saved[0].fingerprint,
            fingerprint("Груз 5 тонн, нужен транспорт", Some("42"), "-100100")
        );
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.saved, 1);
        assert_eq!(stats.errors, 0);
        assert_eq!(stats.state, EngineState::Stopped);
    }

    #[tokio::test]
    async fn disabled_chat_persists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_configs(vec![config(false)]));
        let platform = ScriptedPlatform::new(vec![event("-100100", "Груз 5 тонн, нужен транспорт")]);

        let stats = run_to_end(engine(dir.path(), store.clone(), platform, EngineCfg::default()).await).await;

        assert!(store.saved().is_empty());
        assert_eq!(stats.saved, 0);
        assert_eq!(stats.skipped, 1);
    }

    #[tokio::test]
    async fn repeated_event_is_dropped_before_the_sink() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_configs(vec![config(true)]));
        let mut second = event("-100100", "Груз 5 тонн, нужен транспорт");
        second.message_id = "2".into();
        let platform = ScriptedPlatform::new(vec![event("-100100", "Груз 5 тонн, нужен транспорт"), second]);

        let stats = run_to_end(engine(dir.path(), store.clone(), platform, EngineCfg::default()).await).await;

        assert_eq!(store.appends(), 1);
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.dedup_cache_size, 1);
    }

    #[tokio::test]
    async fn same_text_from_another_sender_is_not_a_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_configs(vec![config(true)]));
        let mut other = event("-100100", "Груз 5 тонн");
        other.sender_id = Some("43".into());
        let platform = ScriptedPlatform::new(vec![event("-100100", "Груз 5 тонн"), other]);

        let stats = run_to_end(engine(dir.path(), store.clone(), platform, EngineCfg::default()).await).await;

        assert_eq!(stats.saved, 2);
        assert_eq!(stats.duplicates, 0);
    }

    #[tokio::test]
    async fn ignores_private_untitled_empty_and_unmonitored() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_configs(vec![config(true)]));

        let mut private = event("42", "груз");
        private.chat_kind = ChatKind::Private;
        let mut untitled = event("-100100", "груз");
        untitled.chat_title = None;
        let empty = event("-100100", "   ");
        let elsewhere = event("-100999", "груз");
        let no_keywords = event("-100100", "привет, как дела");

        let platform = ScriptedPlatform::new(vec![private, untitled, empty, elsewhere, no_keywords]);
        let stats = run_to_end(engine(dir.path(), store.clone(), platform, EngineCfg::default()).await).await;

        assert!(store.saved().is_empty());
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.errors, 0);
    }

    #[tokio::test]
    async fn unreachable_store_sends_everything_to_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_configs(vec![config(true)]));

        // Warm the config cache while the store is still up.
        MonitoredChatConfigStore::new(store.clone(), dir.path().join("cache.json"), Duration::from_secs(3600))
            .load(true)
            .await;
        store.set_unavailable(true);

        let mut second = event("-100100", "Ещё груз, 20 тонн");
        second.message_id = "2".into();
        let platform = ScriptedPlatform::new(vec![event("-100100", "Груз 5 тонн"), second]);
        let engine = engine(dir.path(), store.clone(), platform, EngineCfg::default()).await;
        let stats = run_to_end(engine).await;

        assert_eq!(stats.saved, 2);
        assert_eq!(store.appends(), 0);
        let files = std::fs::read_dir(dir.path().join("messages")).unwrap().count();
        assert_eq!(files, 2);
    }

    #[tokio::test]
    async fn sink_failure_counts_an_error_and_moves_on() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_configs(vec![config(true)]));
        let mut eng = engine(dir.path(), store.clone(), ScriptedPlatform::new(vec![]), EngineCfg::default()).await;
        eng.refresh_configs(false).await;

        store.fail_appends.store(true, Ordering::SeqCst);
        assert_eq!(eng.handle_event(event("-100100", "груз")).await, EventOutcome::Failed);

        store.fail_appends.store(false, Ordering::SeqCst);
        let outcome = eng.handle_event(event("-100100", "другой груз")).await;
        assert!(matches!(outcome, EventOutcome::Saved(SavedTo::Remote(_))));

        assert_eq!(eng.stats().errors, 1);
        assert_eq!(eng.stats().saved, 1);
        assert_eq!(eng.stats().processed, 2);
    }

    #[tokio::test]
    async fn remote_window_mode_drops_recently_stored_fingerprints() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_configs(vec![config(true)]));
        let cfg = EngineCfg {
            dedup_mode: DedupMode::RemoteWindow {
                window: Duration::from_secs(24 * 3600),
            },
            ..EngineCfg::default()
        };

        // A previous run already stored this message.
        let mut first = engine(dir.path(), store.clone(), ScriptedPlatform::new(vec![]), cfg.clone()).await;
        first.refresh_configs(false).await;
        first.handle_event(event("-100100", "груз")).await;
        assert_eq!(store.appends(), 1);

        let mut restarted = engine(dir.path(), store.clone(), ScriptedPlatform::new(vec![]), cfg).await;
        restarted.refresh_configs(false).await;
        assert_eq!(restarted.handle_event(event("-100100", "груз")).await, EventOutcome::Duplicate);
        assert_eq!(store.appends(), 1);

        // In-memory mode forgets across restarts.
        let mut plain = engine(dir.path(), store.clone(), ScriptedPlatform::new(vec![]), EngineCfg::default()).await;
        plain.refresh_configs(false).await;
        assert!(matches!(plain.handle_event(event("-100100", "груз")).await, EventOutcome::Saved(_)));
    }

    #[tokio::test]
    async fn authentication_challenge_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_configs(vec![config(true)]));
        let platform = ScriptedPlatform::new(vec![event("-100100", "груз")]).requiring_auth("2FA password required");
        let eng = engine(dir.path(), store.clone(), platform, EngineCfg::default()).await;

        let (_tx, rx) = watch::channel(false);
        let err = eng.run(rx).await.unwrap_err();

        assert!(matches!(err, IngestError::AuthenticationRequired(_)));
        assert!(store.saved().is_empty());
        assert_eq!(store.fetches(), 0);
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_waiting_receive() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_configs(vec![config(true)]));
        let platform = ScriptedPlatform::new(vec![]).held_open();
        let disconnected = platform.disconnect_flag();
        let eng = engine(dir.path(), store, platform, EngineCfg::default()).await;

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(eng.run(rx));
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        let stats = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(stats.state, EngineState::Stopped);
        assert!(stats.finished_at.is_some());
        assert!(disconnected.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn run_without_discovery_keeps_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("discovered.json");
        let previous = vec![crate::model::DiscoveredChat {
            id: "100".into(),
            title: "Грузы".into(),
            kind: ChatKind::Group,
            participant_count: None,
            cargo_related: true,
        }];
        crate::atomic_file::replace_json(&snapshot, &previous).unwrap();

        let store = Arc::new(MemoryStore::with_configs(vec![config(true)]));
        let eng = IngestionEngine::new(
            Box::new(ScriptedPlatform::new(vec![event("-100100", "Груз 5 тонн")])),
            None,
            MonitoredChatConfigStore::new(store.clone(), dir.path().join("cache.json"), Duration::from_secs(3600)),
            PersistenceSink::select(store.clone(), dir.path().join("messages")).await,
            store.clone(),
            EngineCfg::default(),
        );
        let stats = run_to_end(eng).await;

        assert_eq!(stats.saved, 1);
        let raw = std::fs::read_to_string(&snapshot).unwrap();
        let after: Vec<crate::model::DiscoveredChat> = serde_json::from_str(&raw).unwrap();
        assert_eq!(after, previous);
    }

    #[tokio::test]
    async fn discovery_runs_before_monitoring() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_configs(vec![config(true)]));
        let platform = ScriptedPlatform::new(vec![]).with_dialogs(vec![crate::model::DialogInfo {
            id: "100".into(),
            title: "Грузы".into(),
            kind: ChatKind::Group,
            participant_count: None,
        }]);

        run_to_end(engine(dir.path(), store.clone(), platform, EngineCfg::default()).await).await;

        assert!(dir.path().join("discovered.json").exists());
        assert_eq!(store.fetches(), 1);
    }
}
