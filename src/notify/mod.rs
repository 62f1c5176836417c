//! Notifier contract and the transports that implement it.
use async_trait::async_trait;

use crate::config::{Notify, Transport};
use crate::error::DeliveryError;

pub mod telegram;
pub mod webhook;

pub use telegram::TelegramNotifier;
pub use webhook::WebhookNotifier;

/// Delivers one formatted message. There is no partial delivery: the call
/// either succeeds or fails as a whole.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, message: &str) -> Result<(), DeliveryError>;
}

/// Build the notifier selected by `notify.transport`.
pub fn build_notifier(cfg: &Notify) -> Result<Box<dyn Notifier>, DeliveryError> {
    match cfg.transport {
        Transport::Telegram => {
            let token = cfg
                .bot_token
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| {
                    DeliveryError::Target("telegram transport needs a bot_token".into())
                })?;
            Ok(Box::new(TelegramNotifier::new(token, &cfg.target)?))
        }
        Transport::Webhook => Ok(Box::new(WebhookNotifier::new(&cfg.target)?)),
    }
}
