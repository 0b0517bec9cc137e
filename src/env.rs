//! Environment-variable helpers shared by every `*_from_env` constructor.

use anyhow::{Result, anyhow};
use std::str::FromStr;

pub fn must_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("Missing env var {key}"))
}

/// Trimmed value, `None` when unset or blank.
pub fn opt_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn env_or(key: &str, default: &str) -> String {
    opt_env(key).unwrap_or_else(|| default.into())
}

/// Parsed value, or `default` when unset or unparsable.
pub fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    opt_env(key)
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

pub fn parse_bool_env(key: &str, default: bool) -> bool {
    opt_env(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_fall_back_to_defaults() {
        assert_eq!(parse_env::<u64>("CARGO_INGEST_TEST_UNSET_NUM", 42), 42);
        assert!(parse_bool_env("CARGO_INGEST_TEST_UNSET_BOOL", true));
        assert_eq!(env_or("CARGO_INGEST_TEST_UNSET_STR", "x"), "x");
        assert!(must_env("CARGO_INGEST_TEST_UNSET_STR").is_err());
    }
}
