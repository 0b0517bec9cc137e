//! Platform that replays a fixed list of events.  Backs the `replay` run
//! mode and the engine tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

use super::ChatPlatform;
use crate::error::PlatformError;
use crate::model::{AccountIdentity, DialogInfo, InboundEvent};

pub struct ScriptedPlatform {
    dialogs: Vec<DialogInfo>,
    /// Fail `list_dialogs` after this many dialogs have been listed.
    dialogs_fail_after: Option<usize>,
    events: Vec<InboundEvent>,
    auth_challenge: Option<String>,
    /// Keep the stream open after the last event, until shutdown.
    hold_open: bool,
    held_sender: Option<mpsc::Sender<InboundEvent>>,
    subscribed: bool,
    disconnected: Arc<AtomicBool>,
}

impl ScriptedPlatform {
    pub fn new(events: Vec<InboundEvent>) -> Self {
        Self {
            dialogs: Vec::new(),
            dialogs_fail_after: None,
            events,
            auth_challenge: None,
            hold_open: false,
            held_sender: None,
            subscribed: false,
            disconnected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// One JSON-encoded [`InboundEvent`] per line; blank lines are skipped.
    pub fn from_jsonl(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open replay file {}", path.display()))?;
        let reader = BufReader::new(file);

        let mut events = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
            if line.trim().is_empty() {
                continue;
            }
            let event: InboundEvent = serde_json::from_str(&line)
                .with_context(|| format!("invalid JSON at line {}", idx + 1))?;
            events.push(event);
        }
        Ok(Self::new(events))
    }

    #[cfg(test)]
    pub fn with_dialogs(mut self, dialogs: Vec<DialogInfo>) -> Self {
        self.dialogs = dialogs;
        self
    }

    #[cfg(test)]
    pub fn failing_dialogs_after(mut self, n: usize) -> Self {
        self.dialogs_fail_after = Some(n);
        self
    }

    #[cfg(test)]
    pub fn requiring_auth(mut self, challenge: &str) -> Self {
        self.auth_challenge = Some(challenge.into());
        self
    }

    #[cfg(test)]
    pub fn held_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Flag flipped by [`ChatPlatform::disconnect`].
    #[cfg(test)]
    pub fn disconnect_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.disconnected)
    }
}

#[async_trait]
impl ChatPlatform for ScriptedPlatform {
    async fn connect(&mut self) -> Result<AccountIdentity, PlatformError> {
        if let Some(challenge) = &self.auth_challenge {
            return Err(PlatformError::AuthenticationRequired(challenge.clone()));
        }
        Ok(AccountIdentity {
            display_name: "replay".into(),
            username: None,
        })
    }

    async fn list_dialogs(&mut self, out: &mut Vec<DialogInfo>) -> Result<(), PlatformError> {
        for (idx, dialog) in self.dialogs.iter().enumerate() {
            if self.dialogs_fail_after == Some(idx) {
                return Err(PlatformError::Request("dialog listing interrupted".into()));
            }
            out.push(dialog.clone());
        }
        Ok(())
    }

    fn subscribe(&mut self) -> Result<mpsc::Receiver<InboundEvent>, PlatformError> {
        if self.subscribed {
            return Err(PlatformError::AlreadySubscribed);
        }
        self.subscribed = true;

        let (tx, rx) = mpsc::channel(self.events.len().max(1));
        for event in self.events.drain(..) {
            // Capacity covers every scripted event.
            let _ = tx.try_send(event);
        }
        if self.hold_open {
            self.held_sender = Some(tx);
        }
        Ok(rx)
    }

    async fn disconnect(&mut self) {
        self.held_sender = None;
        self.disconnected.store(true, Ordering::SeqCst);
    }
}
