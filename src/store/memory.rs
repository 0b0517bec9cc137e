//! In-memory store for tests; counts every remote call.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::DocumentStore;
use crate::error::StoreError;
use crate::model::{IngestedMessage, MonitoredChatConfig};

#[derive(Default)]
pub struct MemoryStore {
    pub configs: Mutex<Vec<MonitoredChatConfig>>,
    pub messages: Mutex<Vec<IngestedMessage>>,
    pub unavailable: AtomicBool,
    pub fail_appends: AtomicBool,
    pub probe_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub append_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn with_configs(configs: Vec<MonitoredChatConfig>) -> Self {
        Self {
            configs: Mutex::new(configs),
            ..Default::default()
        }
    }

    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn appends(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> Vec<IngestedMessage> {
        self.messages.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn probe(&self) -> Result<(), StoreError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.check()
    }

    async fn fetch_monitored_chats(&self) -> Result<Vec<MonitoredChatConfig>, StoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.configs.lock().unwrap().clone())
    }

    async fn append_message(&self, message: &IngestedMessage) -> Result<String, StoreError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 503,
                body: "write rejected".into(),
            });
        }
        let mut messages = self.messages.lock().unwrap();
        messages.push(message.clone());
        Ok(format!("doc-{}", messages.len()))
    }

    async fn fingerprint_seen_since(
        &self,
        fingerprint: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.fingerprint == fingerprint && m.created_at >= since))
    }
}
