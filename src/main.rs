mod atomic_file;
mod chat_config;
mod discovery;
mod engine;
mod env;
mod error;
mod filter;
mod model;
mod modes;
mod platform;
mod sink;
mod store;

use anyhow::Result;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    modes::run_from_env().await
}
