//! Records that flow through the ingestion pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A chat the operator asked us to watch, with its own keyword list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredChatConfig {
    pub chat_id: String,
    pub title: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Channel,
}

impl ChatKind {
    /// Groups and channels carry a title; private dialogs are never ingested.
    pub fn is_group_like(self) -> bool {
        matches!(self, Self::Group | Self::Channel)
    }
}

impl fmt::Display for ChatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Private => "private",
            Self::Group => "group",
            Self::Channel => "channel",
        })
    }
}

/// One row of the discovery snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredChat {
    pub id: String,
    pub title: String,
    pub kind: ChatKind,
    /// `None` when the platform did not report a member count.
    pub participant_count: Option<u32>,
    pub cargo_related: bool,
}

/// Dialog as listed by the messaging platform, before tagging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogInfo {
    pub id: String,
    pub title: String,
    pub kind: ChatKind,
    pub participant_count: Option<u32>,
}

/// Optional sender details, filled in by the platform adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderProfile {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    /// Title of a channel or group posting under its own name.
    #[serde(default)]
    pub org_title: Option<String>,
}

impl SenderProfile {
    /// "First Last" for people, the org title otherwise, empty when nothing is known.
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                format!("{first} {last}")
            }
            (Some(first), _) if !first.is_empty() => first.to_string(),
            _ => self.org_title.clone().unwrap_or_default(),
        }
    }
}

/// A new-message event as delivered by the platform adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub chat_id: String,
    #[serde(default)]
    pub chat_title: Option<String>,
    pub chat_kind: ChatKind,
    pub message_id: String,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub sender: Option<SenderProfile>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub has_media: bool,
    pub sent_at: DateTime<Utc>,
}

/// A message that passed every filter and is handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestedMessage {
    pub text: String,
    pub source: String,
    pub source_chat_id: String,
    pub chat_title: String,
    pub message_id: String,
    pub sender_id: Option<String>,
    pub sender_name: String,
    pub sender_username: String,
    pub timestamp_utc: DateTime<Utc>,
    pub fingerprint: String,
    pub keywords_found: Vec<String>,
    pub has_media: bool,
    pub created_at: DateTime<Utc>,
    pub processed: bool,
}

/// Who we are logged in as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountIdentity {
    pub display_name: String,
    pub username: Option<String>,
}
