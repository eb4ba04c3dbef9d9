use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use herald_core::{config::Config, registry::RecipientRegistry};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub registry: Arc<RecipientRegistry>,
}

/// Run the Telegram long-polling dispatcher until it exits.
pub async fn run_polling(
    bot: Bot,
    cfg: Arc<Config>,
    registry: Arc<RecipientRegistry>,
) -> anyhow::Result<()> {
    if let Ok(me) = bot.get_me().await {
        tracing::info!(username = me.username(), "telegram bot connected");
    }

    match registry.count().await {
        Ok(n) => tracing::info!(recipients = n, "registered recipients"),
        Err(e) => tracing::warn!(error = %e, "could not read recipient registry"),
    }

    let state = Arc::new(AppState { cfg, registry });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
