mod discover;
mod live;
mod replay;
mod shared;

use anyhow::Result;

use crate::env::env_or;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Live,
    Discover,
    Replay,
}

impl RunMode {
    fn from_env() -> Self {
        Self::parse(&env_or("RUN_MODE", "live"))
    }

    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "discover" | "discovery" => Self::Discover,
            "replay" => Self::Replay,
            _ => Self::Live,
        }
    }
}

pub async fn run_from_env() -> Result<()> {
    match RunMode::from_env() {
        RunMode::Live => live::run().await,
        RunMode::Discover => discover::run().await,
        RunMode::Replay => replay::run().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_modes_fall_back_to_live() {
        assert_eq!(RunMode::parse("Discover"), RunMode::Discover);
        assert_eq!(RunMode::parse(" replay "), RunMode::Replay);
        assert_eq!(RunMode::parse("dump_today"), RunMode::Live);
        assert_eq!(RunMode::parse(""), RunMode::Live);
    }
}
