use anyhow::Result;
use tracing::info;

use super::shared::{event_queue_capacity, run_engine, shutdown_on_ctrl_c};
use crate::discovery::ChatDirectoryDiscovery;
use crate::platform::telegram::{TelegramPlatform, load_tg_cfg};

pub(super) async fn run() -> Result<()> {
    let tg = load_tg_cfg()?;
    let platform = TelegramPlatform::open(tg, event_queue_capacity())?;

    let (_shutdown_tx, shutdown_rx) = shutdown_on_ctrl_c();
    let stats = run_engine(
        Box::new(platform),
        Some(ChatDirectoryDiscovery::from_env()),
        shutdown_rx,
    )
    .await?;

    info!("Live run finished: {stats}");
    Ok(())
}
