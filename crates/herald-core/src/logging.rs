use crate::Result;

/// Initialize logging/tracing for the bot.
pub fn init(service_name: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    // Default: info for our crates, warn for everything else.
    // Can be overridden with `RUST_LOG`.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,herald=info,herald_core=info,herald_telegram=info,herald_http=info,{service_name}=info"
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .init();

    Ok(())
}
