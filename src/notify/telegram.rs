use async_trait::async_trait;
use std::fmt;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::{info, instrument};

use super::Notifier;
use crate::error::DeliveryError;

/// Posts the digest to a Telegram chat or channel through the Bot API.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    recipient: Recipient,
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    pub fn new(bot_token: &str, target: &str) -> Result<Self, DeliveryError> {
        Ok(Self {
            bot: Bot::new(bot_token),
            recipient: parse_recipient(target)?,
        })
    }
}

/// Numeric targets are chat ids, `@name` targets are public channels.
pub fn parse_recipient(target: &str) -> Result<Recipient, DeliveryError> {
    let target = target.trim();
    if let Ok(id) = target.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }
    if target.len() > 1 && target.starts_with('@') {
        return Ok(Recipient::ChannelUsername(target.to_string()));
    }
    Err(DeliveryError::Target(format!(
        "expected a chat id or @channel, got {:?}",
        target
    )))
}

#[async_trait]
impl Notifier for TelegramNotifier {
    #[instrument(skip_all)]
    async fn publish(&self, message: &str) -> Result<(), DeliveryError> {
        let sent = self
            .bot
            .send_message(self.recipient.clone(), message)
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;
        info!(message_id = sent.id.0, "digest sent to telegram");
        Ok(())
    }
}
