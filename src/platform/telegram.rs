//! Live Telegram user client (grammers) behind [`ChatPlatform`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use grammers_client::types::Peer;
use grammers_client::{Client, SignInError, Update};
use grammers_mtsender::SenderPool;
use grammers_session::storages::SqliteSession;
use std::io::{IsTerminal, Write};
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::ChatPlatform;
use crate::env::{env_or, must_env, opt_env, parse_bool_env};
use crate::error::PlatformError;
use crate::model::{AccountIdentity, ChatKind, DialogInfo, InboundEvent, SenderProfile};

#[derive(Clone)]
pub struct TgCfg {
    pub api_id: i32,
    pub api_hash: String,
    pub phone: String,
    pub two_fa_password: Option<String>,
    pub session_path: String,
    /// Allow prompting for the login code / 2FA password on stdin.
    pub interactive_login: bool,
}

pub fn load_tg_cfg() -> Result<TgCfg> {
    Ok(TgCfg {
        api_id: must_env("TG_API_ID")?
            .parse()
            .context("TG_API_ID must be i32")?,
        api_hash: must_env("TG_API_HASH")?,
        phone: must_env("TG_PHONE")?,
        two_fa_password: opt_env("TG_2FA_PASSWORD"),
        session_path: env_or("TG_SESSION_PATH", "./telegram.session.sqlite"),
        interactive_login: parse_bool_env("TG_INTERACTIVE_LOGIN", std::io::stdin().is_terminal()),
    })
}

pub struct TelegramPlatform {
    cfg: TgCfg,
    client: Client,
    runner: JoinHandle<()>,
    start_pump: Option<oneshot::Sender<()>>,
    events: Option<mpsc::Receiver<InboundEvent>>,
}

impl TelegramPlatform {
    /// Open the session and start the network runner.  Updates are buffered
    /// by the pool until [`ChatPlatform::subscribe`] starts the pump.
    pub fn open(cfg: TgCfg, queue_capacity: usize) -> Result<Self> {
        let session = Arc::new(
            SqliteSession::open(&cfg.session_path)
                .with_context(|| format!("failed to open session {}", cfg.session_path))?,
        );
        let pool = SenderPool::new(Arc::clone(&session), cfg.api_id);
        let client = Client::new(&pool);

        let runner = pool.runner;
        let runner = tokio::spawn(async move {
            runner.run().await;
        });

        let updates_rx = pool.updates;
        let (start_tx, start_rx) = oneshot::channel::<()>();
        let (events_tx, events_rx) = mpsc::channel(queue_capacity.max(1));
        let pump_client = client.clone();

        tokio::spawn(async move {
            if start_rx.await.is_err() {
                return;
            }

            let mut stream = pump_client.stream_updates(
                updates_rx,
                grammers_client::UpdatesConfiguration {
                    catch_up: false,
                    update_queue_limit: Some(2048),
                },
            );

            loop {
                let Ok(update) = stream.next().await else {
                    warn!("Update stream ended.");
                    break;
                };

                let Update::NewMessage(msg) = update else {
                    continue;
                };
                let Ok(peer) = msg.peer() else {
                    continue;
                };

                let chat_kind = match &peer {
                    Peer::User(_) => ChatKind::Private,
                    Peer::Group(_) => ChatKind::Group,
                    Peer::Channel(_) => ChatKind::Channel,
                };

                let sender = msg.sender();
                let sender_id = sender.as_ref().map(|s| s.id().bare_id().to_string());
                let sender_profile = match &sender {
                    Some(Peer::User(user)) => Some(SenderProfile {
                        first_name: user.first_name().map(str::to_owned),
                        last_name: user.last_name().map(str::to_owned),
                        username: user.username().map(str::to_owned),
                        org_title: None,
                    }),
                    Some(other) => Some(SenderProfile {
                        org_title: other.name().map(str::to_owned),
                        ..Default::default()
                    }),
                    None => None,
                };

                let event = InboundEvent {
                    chat_id: peer.id().bare_id().to_string(),
                    chat_title: peer.name().map(str::to_owned),
                    chat_kind,
                    message_id: msg.id().to_string(),
                    sender_id,
                    sender: sender_profile,
                    text: msg.text().to_string(),
                    has_media: msg.media().is_some(),
                    sent_at: msg.date(),
                };

                if events_tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            cfg,
            client,
            runner,
            start_pump: Some(start_tx),
            events: Some(events_rx),
        })
    }

    async fn ensure_user_login(&self) -> Result<(), PlatformError> {
        if self.client.is_authorized().await.map_err(connection)? {
            return Ok(());
        }
        if !self.cfg.interactive_login {
            return Err(PlatformError::AuthenticationRequired(
                "session is not authorized and interactive login is disabled".into(),
            ));
        }

        info!("Not authorized. Requesting login code...");
        let token = self
            .client
            .request_login_code(&self.cfg.phone, &self.cfg.api_hash)
            .await
            .map_err(|e| PlatformError::Request(format!("request_login_code failed: {e}")))?;

        let code = read_line("Enter the login code you received: ").await?;

        match self.client.sign_in(&token, &code).await {
            Ok(user) => {
                info!(
                    "Signed in as {:?}",
                    user.first_name().unwrap_or("<unknown>")
                );
                Ok(())
            }
            Err(SignInError::PasswordRequired(password_token)) => {
                let pw = match &self.cfg.two_fa_password {
                    Some(pw) => pw.clone(),
                    None => {
                        let hint = password_token.hint().unwrap_or("");
                        read_line(&format!(
                            "2FA password required (hint: {hint}). Enter password: "
                        ))
                        .await?
                    }
                };

                self.client
                    .check_password(password_token, pw.as_bytes())
                    .await
                    .map_err(|e| {
                        PlatformError::AuthenticationRequired(format!("check_password failed: {e}"))
                    })?;

                info!("Signed in with 2FA.");
                Ok(())
            }
            Err(e) => Err(PlatformError::AuthenticationRequired(format!(
                "sign_in failed: {e}"
            ))),
        }
    }
}

#[async_trait]
impl ChatPlatform for TelegramPlatform {
    async fn connect(&mut self) -> Result<AccountIdentity, PlatformError> {
        self.ensure_user_login().await?;

        let me = self.client.get_me().await.map_err(connection)?;
        Ok(AccountIdentity {
            display_name: me.first_name().unwrap_or("<unknown>").to_string(),
            username: me.username().map(str::to_owned),
        })
    }

    async fn list_dialogs(&mut self, out: &mut Vec<DialogInfo>) -> Result<(), PlatformError> {
        let mut dialogs = self.client.iter_dialogs();
        while let Some(dialog) = dialogs
            .next()
            .await
            .map_err(|e| PlatformError::Request(format!("iter_dialogs failed: {e}")))?
        {
            let peer = dialog.peer();
            let kind = match peer {
                Peer::User(_) => ChatKind::Private,
                Peer::Group(_) => ChatKind::Group,
                Peer::Channel(_) => ChatKind::Channel,
            };
            out.push(DialogInfo {
                id: peer.id().bare_id().to_string(),
                title: peer.name().unwrap_or("").to_string(),
                kind,
                participant_count: None,
            });
        }
        Ok(())
    }

    fn subscribe(&mut self) -> Result<mpsc::Receiver<InboundEvent>, PlatformError> {
        let events = self.events.take().ok_or(PlatformError::AlreadySubscribed)?;
        if let Some(start) = self.start_pump.take() {
            let _ = start.send(());
        }
        Ok(events)
    }

    async fn disconnect(&mut self) {
        // Dropping the start signal ends a pump that never started.
        self.start_pump = None;
        self.runner.abort();
        info!("Disconnected from Telegram.");
    }
}

fn connection(e: impl std::fmt::Display) -> PlatformError {
    PlatformError::Connection(e.to_string())
}

async fn read_line(prompt: &str) -> Result<String, PlatformError> {
    print!("{prompt}");
    std::io::stdout().flush().ok();
    let mut line = String::new();
    let mut stdin = io::BufReader::new(io::stdin());
    stdin
        .read_line(&mut line)
        .await
        .map_err(|e| PlatformError::AuthenticationRequired(format!("stdin unavailable: {e}")))?;
    Ok(line.trim().to_string())
}
