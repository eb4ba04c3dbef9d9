//! Telegram adapter (teloxide).
//!
//! This crate implements the `herald-core` DeliveryPort over the Telegram
//! Bot API and hosts the command router.

use async_trait::async_trait;

use teloxide::prelude::*;

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use herald_core::{domain::RecipientId, errors::Error, ports::DeliveryPort, Result};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    /// Recipient ids are Telegram chat ids in decimal string form.
    fn tg_chat(recipient: &RecipientId) -> Result<teloxide::types::ChatId> {
        recipient
            .as_str()
            .parse::<i64>()
            .map(teloxide::types::ChatId)
            .map_err(|_| {
                Error::Delivery(format!("recipient {recipient} is not a telegram chat id"))
            })
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Delivery(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl DeliveryPort for TelegramMessenger {
    async fn send_text(&self, recipient: &RecipientId, text: &str) -> Result<()> {
        let chat = Self::tg_chat(recipient)?;
        self.with_retry(|| self.bot.send_message(chat, text.to_string()))
            .await?;
        Ok(())
    }
}
