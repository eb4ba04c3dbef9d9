//! Telegram update handlers.
//!
//! Commands manage the recipient registry; anything else gets the
//! configured fallback reply.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod commands;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if text.starts_with('/') {
        return commands::handle_command(bot, msg, state).await;
    }

    let _ = bot
        .send_message(msg.chat.id, state.cfg.fallback_message.clone())
        .await;
    Ok(())
}
