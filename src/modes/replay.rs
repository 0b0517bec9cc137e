use anyhow::{Result, anyhow};
use std::path::PathBuf;
use tracing::info;

use super::shared::{run_engine, shutdown_on_ctrl_c};
use crate::env::must_env;
use crate::platform::scripted::ScriptedPlatform;

/// Feed a JSON-lines file of recorded events through the full pipeline.
pub(super) async fn run() -> Result<()> {
    let input_path = PathBuf::from(must_env("REPLAY_INPUT_PATH")?);
    let platform = ScriptedPlatform::from_jsonl(&input_path)?;
    if platform.event_count() == 0 {
        return Err(anyhow!("Replay input is empty: {}", input_path.display()));
    }
    info!(
        "Replay started: {} events from {}",
        platform.event_count(),
        input_path.display()
    );

    let (_shutdown_tx, shutdown_rx) = shutdown_on_ctrl_c();
    // Recorded events carry no dialog list; keep the live snapshot.
    let stats = run_engine(Box::new(platform), None, shutdown_rx).await?;

    println!("{stats}");
    info!(
        "Replay complete: processed={}, saved={}, duplicates={}, skipped={}, errors={}",
        stats.processed, stats.saved, stats.duplicates, stats.skipped, stats.errors
    );
    Ok(())
}
