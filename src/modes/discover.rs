use anyhow::{Result, anyhow};
use tracing::info;

use super::shared::{build_store, event_queue_capacity};
use crate::chat_config::MonitoredChatConfigStore;
use crate::discovery::ChatDirectoryDiscovery;
use crate::filter::chat_id::same_chat;
use crate::platform::ChatPlatform;
use crate::platform::telegram::{TelegramPlatform, load_tg_cfg};

/// Connect, write the discovery snapshot, print which chats are monitored.
pub(super) async fn run() -> Result<()> {
    let tg = load_tg_cfg()?;
    let mut platform = TelegramPlatform::open(tg, event_queue_capacity())?;
    let me = platform.connect().await.map_err(|e| anyhow!(e))?;
    info!("Connected as {}", me.display_name);

    let discovery = ChatDirectoryDiscovery::from_env();
    let chats = discovery.discover(&mut platform).await;

    let store = build_store()?;
    let configs = MonitoredChatConfigStore::from_env(store).force_update().await;

    for chat in &chats {
        let monitored = configs
            .iter()
            .any(|c| c.enabled && same_chat(&c.chat_id, &chat.id));
        println!(
            "{:<9} {:<8} {:>16}  {}{}",
            chat.kind,
            if monitored { "watched" } else { "-" },
            chat.id,
            chat.title,
            if chat.cargo_related { "  [cargo]" } else { "" },
        );
    }

    platform.disconnect().await;
    info!(
        "Discovery snapshot written to {}",
        discovery.snapshot_path().display()
    );
    Ok(())
}
