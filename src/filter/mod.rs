//! Keyword classification, chat-id matching, and per-run deduplication
//! for freight-exchange group chats.
//!
//! Message text in these chats is mostly Russian with the odd Latin
//! abbreviation, so all matching is done on Unicode-lowercased text.
pub mod cargo_keywords;
pub mod chat_id;

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};
use tracing::{debug, error};

use crate::error::IngestError;
use crate::filter::cargo_keywords::CARGO_TITLE_KEYWORDS;
use crate::model::MonitoredChatConfig;

pub use chat_id::normalize;

// ──────────────────────────── Classification ─────────────────────────────

/// Case-insensitive substring match of every keyword against `text`.
///
/// Returns `(matched, found)` where `found` keeps the keyword order of the
/// input and lists every keyword that occurred.  Blank keywords are ignored.
pub fn classify(text: &str, keywords: &[String]) -> (bool, Vec<String>) {
    classify_with(text, keywords.iter().map(String::as_str))
}

/// `true` when a chat title looks freight-related.
pub fn is_cargo_title(title: &str) -> bool {
    classify_with(title, CARGO_TITLE_KEYWORDS.iter().copied()).0
}

fn classify_with<'a>(text: &str, keywords: impl Iterator<Item = &'a str>) -> (bool, Vec<String>) {
    if text.trim().is_empty() {
        return (false, Vec::new());
    }
    let lower = text.to_lowercase();

    let found: Vec<String> = keywords
        .filter(|kw| {
            let kw = kw.trim();
            !kw.is_empty() && lower.contains(&kw.to_lowercase())
        })
        .map(str::to_string)
        .collect();

    (!found.is_empty(), found)
}

// ───────────────────────────── Fingerprint ───────────────────────────────

/// Stable hex digest of `(text, sender_id, chat_id)`.
/// The fields are joined with a unit separator so that they cannot bleed
/// into each other.
pub fn fingerprint(text: &str, sender_id: Option<&str>, chat_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update([0x1f]);
    hasher.update(sender_id.unwrap_or("").as_bytes());
    hasher.update([0x1f]);
    hasher.update(chat_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ──────────────────────────────── Dedup ──────────────────────────────────

/// Fingerprints seen during the current run.  Not persisted.
#[derive(Debug, Default)]
pub struct DedupCache {
    seen: HashSet<String>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self, fingerprint: &str) -> bool {
        self.seen.contains(fingerprint)
    }

    pub fn record(&mut self, fingerprint: &str) {
        self.seen.insert(fingerprint.to_owned());
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}

// ─────────────────────────── Chat matching ───────────────────────────────

/// Lookup table from every normalized chat-id form to its enabled config.
#[derive(Debug, Default)]
pub struct MatchIndex {
    configs: Vec<MonitoredChatConfig>,
    by_form: HashMap<String, usize>,
}

impl MatchIndex {
    /// Index the enabled configs.
    ///
    /// Configs whose forms overlap with another config are left out, both of
    /// them, and each overlapping pair is reported once.
    pub fn build(configs: &[MonitoredChatConfig]) -> (Self, Vec<IngestError>) {
        let enabled: Vec<&MonitoredChatConfig> = configs
            .iter()
            .filter(|c| c.enabled && !c.chat_id.trim().is_empty())
            .collect();

        let mut owner: HashMap<String, usize> = HashMap::new();
        let mut rejected: HashSet<usize> = HashSet::new();
        let mut reported: HashSet<(usize, usize)> = HashSet::new();
        let mut problems = Vec::new();

        for (idx, cfg) in enabled.iter().enumerate() {
            for form in normalize(&cfg.chat_id) {
                match owner.get(&form) {
                    Some(&other) if other != idx => {
                        rejected.insert(other);
                        rejected.insert(idx);
                        if !reported.insert((other, idx)) {
                            continue;
                        }
                        error!(
                            "Ambiguous monitored chats: {} ({}) and {} ({}) both match {form}",
                            enabled[other].chat_id, enabled[other].title, cfg.chat_id, cfg.title,
                        );
                        problems.push(IngestError::ConfigurationAmbiguity {
                            first: enabled[other].chat_id.clone(),
                            second: cfg.chat_id.clone(),
                            shared: form.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        owner.insert(form, idx);
                    }
                }
            }
        }

        let mut index = Self::default();
        for (idx, cfg) in enabled.into_iter().enumerate() {
            if rejected.contains(&idx) {
                continue;
            }
            let slot = index.configs.len();
            for form in normalize(&cfg.chat_id) {
                index.by_form.insert(form, slot);
            }
            index.configs.push(cfg.clone());
        }

        debug!(
            "Match index: {} chats, {} id forms, {} rejected",
            index.configs.len(),
            index.by_form.len(),
            rejected.len()
        );
        (index, problems)
    }

    /// Config matching any form of `raw_chat_id`.  An id whose forms land on
    /// two different configs matches neither.
    pub fn lookup(&self, raw_chat_id: &str) -> Option<&MonitoredChatConfig> {
        let mut hit: Option<usize> = None;
        for form in normalize(raw_chat_id) {
            let Some(&slot) = self.by_form.get(&form) else {
                continue;
            };
            match hit {
                None => hit = Some(slot),
                Some(prev) if prev != slot => {
                    error!(
                        "Chat id {raw_chat_id} matches both {} and {}; ignoring it",
                        self.configs[prev].chat_id, self.configs[slot].chat_id
                    );
                    return None;
                }
                Some(_) => {}
            }
        }
        hit.map(|slot| &self.configs[slot])
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
