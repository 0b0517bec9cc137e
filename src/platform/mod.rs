//! Messaging-platform seam.  The engine only ever sees this trait, so a
//! scripted platform can stand in for the live client.

pub mod scripted;
pub mod telegram;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::PlatformError;
use crate::model::{AccountIdentity, DialogInfo, InboundEvent};

#[async_trait]
pub trait ChatPlatform: Send {
    /// Connect and make sure we are logged in.  Fails with
    /// [`PlatformError::AuthenticationRequired`] when a login challenge
    /// cannot be answered without a human.
    async fn connect(&mut self) -> Result<AccountIdentity, PlatformError>;

    /// Push every visible dialog into `out`.  On error, whatever was pushed
    /// before the failure stays in `out`.
    async fn list_dialogs(&mut self, out: &mut Vec<DialogInfo>) -> Result<(), PlatformError>;

    /// The single ordered stream of new-message events.  Can be taken once.
    fn subscribe(&mut self) -> Result<mpsc::Receiver<InboundEvent>, PlatformError>;

    async fn disconnect(&mut self);
}
