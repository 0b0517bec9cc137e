//! Firestore REST (v1) client.
//!
//! Documents travel as typed values (`{"stringValue": "..."}`), so both
//! directions go through the small codec at the bottom of this file.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use super::{DocumentStore, MONITORED_CHATS_COLLECTION};
use crate::env::{env_or, opt_env, parse_env};
use crate::error::StoreError;
use crate::model::{IngestedMessage, MonitoredChatConfig};

const API_ROOT: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: u32 = 300;

#[derive(Clone)]
pub struct FirestoreCfg {
    pub project_id: String,
    pub database: String,
    pub token: Option<String>,
    pub api_key: Option<String>,
    pub messages_collection: String,
    pub timeout: Duration,
}

impl FirestoreCfg {
    /// `None` when `FIRESTORE_PROJECT_ID` is not set.
    ///
    /// | Env var                         | Default     |
    /// |---------------------------------|-------------|
    /// | `FIRESTORE_PROJECT_ID`          | —           |
    /// | `FIRESTORE_DATABASE`            | `(default)` |
    /// | `FIRESTORE_TOKEN`               | —           |
    /// | `FIRESTORE_API_KEY`             | —           |
    /// | `FIRESTORE_MESSAGES_COLLECTION` | `messages`  |
    /// | `REMOTE_TIMEOUT_MS`             | `10000`     |
    pub fn from_env() -> Option<Self> {
        Some(Self {
            project_id: opt_env("FIRESTORE_PROJECT_ID")?,
            database: env_or("FIRESTORE_DATABASE", "(default)"),
            token: opt_env("FIRESTORE_TOKEN"),
            api_key: opt_env("FIRESTORE_API_KEY"),
            messages_collection: env_or("FIRESTORE_MESSAGES_COLLECTION", "messages"),
            timeout: Duration::from_millis(parse_env("REMOTE_TIMEOUT_MS", 10_000)),
        })
    }
}

pub struct FirestoreStore {
    http: Client,
    cfg: FirestoreCfg,
    documents_url: String,
}

impl FirestoreStore {
    pub fn new(cfg: FirestoreCfg) -> Result<Self, StoreError> {
        let http = Client::builder().timeout(cfg.timeout).build()?;
        let documents_url = format!(
            "{API_ROOT}/projects/{}/databases/{}/documents",
            cfg.project_id, cfg.database
        );
        Ok(Self {
            http,
            cfg,
            documents_url,
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut req = self.http.request(method, url);
        if let Some(token) = &self.cfg.token {
            req = req.bearer_auth(token);
        }
        if let Some(key) = &self.cfg.api_key {
            req = req.query(&[("key", key)]);
        }
        req
    }

    async fn list_page(
        &self,
        collection: &str,
        page_token: Option<&str>,
    ) -> Result<ListDocumentsResponse, StoreError> {
        let url = format!("{}/{collection}", self.documents_url);
        let mut req = self
            .request(Method::GET, &url)
            .query(&[("pageSize", PAGE_SIZE.to_string())]);
        if let Some(token) = page_token {
            req = req.query(&[("pageToken", token)]);
        }
        let resp = ensure_success(req.send().await?).await?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn name(&self) -> &str {
        "firestore"
    }

    async fn probe(&self) -> Result<(), StoreError> {
        let url = format!("{}/{MONITORED_CHATS_COLLECTION}", self.documents_url);
        let req = self.request(Method::GET, &url).query(&[("pageSize", "1")]);
        ensure_success(req.send().await?).await?;
        Ok(())
    }

    async fn fetch_monitored_chats(&self) -> Result<Vec<MonitoredChatConfig>, StoreError> {
        let mut chats = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_page(MONITORED_CHATS_COLLECTION, page_token.as_deref())
                .await?;
            for doc in page.documents {
                match config_from_document(&doc) {
                    Ok(cfg) => chats.push(cfg),
                    Err(e) => warn!("Skipping monitored chat document: {e}"),
                }
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!("Fetched {} monitored chat documents", chats.len());
        Ok(chats)
    }

    async fn append_message(&self, message: &IngestedMessage) -> Result<String, StoreError> {
        let url = format!("{}/{}", self.documents_url, self.cfg.messages_collection);
        let body = json!({ "fields": message_fields(message) });
        let resp = ensure_success(self.request(Method::POST, &url).json(&body).send().await?).await?;
        let doc: Document = resp.json().await?;
        match document_id(&doc.name) {
            "" => Err(StoreError::Decode("created document has no name".into())),
            id => Ok(id.to_string()),
        }
    }

    async fn fingerprint_seen_since(
        &self,
        fingerprint: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let url = format!("{}:runQuery", self.documents_url);
        let body = fingerprint_query(&self.cfg.messages_collection, fingerprint, since);
        let resp = ensure_success(self.request(Method::POST, &url).json(&body).send().await?).await?;
        let rows: Vec<RunQueryRow> = resp.json().await?;
        Ok(rows.iter().any(|row| row.document.is_some()))
    }
}

impl fmt::Display for FirestoreStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FirestoreStore(project={}, database={}, messages={}, auth={}, timeout={}ms)",
            self.cfg.project_id,
            self.cfg.database,
            self.cfg.messages_collection,
            if self.cfg.token.is_some() { "bearer" } else if self.cfg.api_key.is_some() { "key" } else { "none" },
            self.cfg.timeout.as_millis(),
        )
    }
}

async fn ensure_success(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

// ─────────────────────────── Wire types ──────────────────────────────────

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryRow {
    #[serde(default)]
    document: Option<Document>,
}

// ───────────────────────────── Codec ─────────────────────────────────────

fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

fn timestamp_value(ts: DateTime<Utc>) -> Value {
    json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::Micros, true) })
}

fn optional_string(s: Option<&str>) -> Value {
    match s {
        Some(s) => string_value(s),
        None => json!({ "nullValue": null }),
    }
}

fn message_fields(msg: &IngestedMessage) -> Map<String, Value> {
    let keywords: Vec<Value> = msg.keywords_found.iter().map(|k| string_value(k)).collect();

    let mut fields = Map::new();
    fields.insert("text".into(), string_value(&msg.text));
    fields.insert("source".into(), string_value(&msg.source));
    fields.insert("source_chat_id".into(), string_value(&msg.source_chat_id));
    fields.insert("chat_title".into(), string_value(&msg.chat_title));
    fields.insert("message_id".into(), string_value(&msg.message_id));
    fields.insert("sender_id".into(), optional_string(msg.sender_id.as_deref()));
    fields.insert("sender_name".into(), string_value(&msg.sender_name));
    fields.insert("sender_username".into(), string_value(&msg.sender_username));
    fields.insert("timestamp_utc".into(), timestamp_value(msg.timestamp_utc));
    fields.insert("fingerprint".into(), string_value(&msg.fingerprint));
    fields.insert(
        "keywords_found".into(),
        json!({ "arrayValue": { "values": keywords } }),
    );
    fields.insert("has_media".into(), json!({ "booleanValue": msg.has_media }));
    fields.insert("created_at".into(), timestamp_value(msg.created_at));
    fields.insert("processed".into(), json!({ "booleanValue": msg.processed }));
    fields
}

/// Scalar text of a typed value; ids are stored both as strings and integers.
fn scalar_text(value: &Value) -> Option<String> {
    if let Some(s) = value.get("stringValue").and_then(Value::as_str) {
        return Some(s.to_string());
    }
    match value.get("integerValue")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn config_from_document(doc: &Document) -> Result<MonitoredChatConfig, StoreError> {
    let fields = &doc.fields;

    let chat_id = fields
        .get("chat_id")
        .and_then(scalar_text)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| StoreError::Decode(format!("{}: missing chat_id", doc.name)))?;

    let title = ["title", "name"]
        .iter()
        .find_map(|key| fields.get(*key).and_then(scalar_text))
        .unwrap_or_default();

    let keywords = match fields.get("keywords") {
        None => Vec::new(),
        Some(v) => v
            .pointer("/arrayValue/values")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(scalar_text).collect())
            .unwrap_or_default(),
    };

    let enabled = match fields.get("enabled") {
        None => true,
        Some(v) => v
            .get("booleanValue")
            .and_then(Value::as_bool)
            .ok_or_else(|| StoreError::Decode(format!("{}: enabled is not a boolean", doc.name)))?,
    };

    Ok(MonitoredChatConfig {
        chat_id,
        title,
        keywords,
        enabled,
    })
}

fn fingerprint_query(collection: &str, fingerprint: &str, since: DateTime<Utc>) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "compositeFilter": {
                    "op": "AND",
                    "filters": [
                        {
                            "fieldFilter": {
                                "field": { "fieldPath": "fingerprint" },
                                "op": "EQUAL",
                                "value": string_value(fingerprint),
                            }
                        },
                        {
                            "fieldFilter": {
                                "field": { "fieldPath": "created_at" },
                                "op": "GREATER_THAN_OR_EQUAL",
                                "value": timestamp_value(since),
                            }
                        }
                    ]
                }
            },
            "limit": 1
        }
    })
}
