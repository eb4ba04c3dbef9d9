use std::sync::Arc;

use teloxide::prelude::*;

use herald_core::domain::RecipientId;

use crate::router::AppState;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let (cmd, _args) = parse_command(msg.text().unwrap_or(""));
    let recipient = RecipientId::new(msg.chat.id.0.to_string());

    match cmd.as_str() {
        "start" => match state.registry.add(&recipient).await {
            Ok(()) => {
                tracing::info!(recipient = %recipient, "chat subscribed");
                let _ = bot
                    .send_message(msg.chat.id, state.cfg.welcome_message.clone())
                    .await;
            }
            Err(e) => {
                tracing::error!(recipient = %recipient, error = %e, "could not register chat");
                let _ = bot
                    .send_message(
                        msg.chat.id,
                        "Temporary storage error. Please send /start again.",
                    )
                    .await;
            }
        },
        "bye" => {
            let _ = bot
                .send_message(msg.chat.id, state.cfg.bye_message.clone())
                .await;
            match state.registry.remove(&recipient).await {
                Ok(()) => tracing::info!(recipient = %recipient, "chat unsubscribed"),
                Err(e) => {
                    tracing::error!(recipient = %recipient, error = %e, "could not unregister chat");
                    let _ = bot
                        .send_message(
                            msg.chat.id,
                            "Temporary storage error. Please send /bye again.",
                        )
                        .await;
                }
            }
        }
        "debug" => {
            let reply = match state.registry.count().await {
                Ok(n) => format!("{n} registered recipient(s)."),
                Err(e) => format!("Query error: {e}"),
            };
            let _ = bot.send_message(msg.chat.id, reply).await;
        }
        _ => {
            let _ = bot
                .send_message(msg.chat.id, state.cfg.fallback_message.clone())
                .await;
        }
    }

    Ok(())
}
