use std::sync::Arc;

use teloxide::Bot;

use herald_core::{broadcast::Broadcaster, config::Config, logging, registry::RecipientRegistry};
use herald_http::TriggerState;
use herald_telegram::TelegramMessenger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("herald")?;

    let cfg = Arc::new(Config::load()?);
    let registry = Arc::new(RecipientRegistry::open(&cfg.registry_db_path).await?);

    match registry.count().await {
        Ok(n) => tracing::info!(
            recipients = n,
            path = %cfg.registry_db_path.display(),
            "recipient registry opened"
        ),
        Err(e) => tracing::warn!(error = %e, "could not count registered recipients"),
    }

    let bot = Bot::new(cfg.telegram_bot_token.clone());
    let messenger = Arc::new(TelegramMessenger::new(bot.clone()));
    let broadcaster = Arc::new(Broadcaster::new(registry.clone(), messenger));

    let trigger = TriggerState {
        broadcaster,
        eviction_threshold: cfg.eviction_threshold,
    };

    // The HTTP trigger and the Telegram dispatcher run until one of them
    // exits; a bind failure or a dispatcher crash ends the process.
    tokio::select! {
        res = herald_http::serve(&cfg.http_bind_addr, trigger) => res?,
        res = herald_telegram::router::run_polling(bot, cfg.clone(), registry.clone()) => res?,
    }

    registry.close().await?;
    Ok(())
}
