//! One-shot enumeration of the chats visible to the account.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::atomic_file;
use crate::env::env_or;
use crate::error::IngestError;
use crate::filter::is_cargo_title;
use crate::model::{DialogInfo, DiscoveredChat};
use crate::platform::ChatPlatform;

pub struct ChatDirectoryDiscovery {
    snapshot_path: PathBuf,
}

impl ChatDirectoryDiscovery {
    pub fn new(snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
        }
    }

    /// `DISCOVERY_SNAPSHOT_PATH`, default `./config/discovered_chats.json`.
    pub fn from_env() -> Self {
        Self::new(env_or(
            "DISCOVERY_SNAPSHOT_PATH",
            "./config/discovered_chats.json",
        ))
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// List groups and channels, tag freight-looking titles, and replace the
    /// snapshot file.  A listing failure keeps whatever was collected.
    pub async fn discover(&self, platform: &mut dyn ChatPlatform) -> Vec<DiscoveredChat> {
        info!("Discovering available chats and channels...");

        let mut dialogs: Vec<DialogInfo> = Vec::new();
        if let Err(e) = platform.list_dialogs(&mut dialogs).await {
            warn!(
                "{}; keeping {} dialogs listed before the failure",
                IngestError::Discovery(e.to_string()),
                dialogs.len()
            );
        }

        let found: Vec<DiscoveredChat> = dialogs
            .into_iter()
            .filter(|d| d.kind.is_group_like())
            .map(tag_dialog)
            .collect();

        for chat in &found {
            debug!(
                "{} {}: {} (id={}, participants={})",
                if chat.cargo_related { "[cargo]" } else { "[other]" },
                chat.kind,
                chat.title,
                chat.id,
                chat.participant_count
                    .map_or_else(|| "unknown".to_string(), |n| n.to_string()),
            );
        }

        if let Err(e) = atomic_file::replace_json(&self.snapshot_path, &found) {
            warn!("Failed to write discovery snapshot: {e:#}");
        }

        let cargo = found.iter().filter(|c| c.cargo_related).count();
        info!(
            "Found {} chats, {} of them cargo-related (snapshot: {})",
            found.len(),
            cargo,
            self.snapshot_path.display()
        );
        found
    }
}

fn tag_dialog(dialog: DialogInfo) -> DiscoveredChat {
    DiscoveredChat {
        cargo_related: is_cargo_title(&dialog.title),
        id: dialog.id,
        title: dialog.title,
        kind: dialog.kind,
        participant_count: dialog.participant_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChatKind;
    use crate::platform::scripted::ScriptedPlatform;

    fn dialog(id: &str, title: &str, kind: ChatKind) -> DialogInfo {
        DialogInfo {
            id: id.into(),
            title: title.into(),
            kind,
            participant_count: Some(12),
        }
    }

    fn sample() -> Vec<DialogInfo> {
        vec![
            dialog("1", "Мама", ChatKind::Private),
            dialog("-1001", "Грузоперевозки РФ", ChatKind::Group),
            dialog("-1002", "Новости", ChatKind::Channel),
            dialog("-1003", "ФУРЫ и тонны", ChatKind::Channel),
        ]
    }

    #[tokio::test]
    async fn keeps_groups_and_channels_and_tags_cargo() {
        let dir = tempfile::tempdir().unwrap();
        let discovery = ChatDirectoryDiscovery::new(dir.path().join("discovered.json"));
        let mut platform = ScriptedPlatform::new(vec![]).with_dialogs(sample());

        let found = discovery.discover(&mut platform).await;

        let ids: Vec<&str> = found.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["-1001", "-1002", "-1003"]);
        let cargo: Vec<bool> = found.iter().map(|c| c.cargo_related).collect();
        assert_eq!(cargo, vec![true, false, true]);

        let raw = std::fs::read_to_string(discovery.snapshot_path()).unwrap();
        let snapshot: Vec<DiscoveredChat> = serde_json::from_str(&raw).unwrap();
        assert_eq!(snapshot, found);
    }

    #[tokio::test]
    async fn listing_failure_keeps_partial_results() {
        let dir = tempfile::tempdir().unwrap();
        let discovery = ChatDirectoryDiscovery::new(dir.path().join("discovered.json"));
        let mut platform = ScriptedPlatform::new(vec![])
            .with_dialogs(sample())
            .failing_dialogs_after(2);

        let found = discovery.discover(&mut platform).await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "-1001");
    }

    #[tokio::test]
    async fn snapshot_is_fully_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let discovery = ChatDirectoryDiscovery::new(dir.path().join("discovered.json"));

        let mut first = ScriptedPlatform::new(vec![]).with_dialogs(sample());
        discovery.discover(&mut first).await;
        let mut second = ScriptedPlatform::new(vec![])
            .with_dialogs(vec![dialog("-1009", "Логистика", ChatKind::Group)]);
        discovery.discover(&mut second).await;

        let raw = std::fs::read_to_string(discovery.snapshot_path()).unwrap();
        let snapshot: Vec<DiscoveredChat> = serde_json::from_str(&raw).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "-1009");
    }
}
