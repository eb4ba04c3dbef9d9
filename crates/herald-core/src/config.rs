use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

/// Typed configuration for the broadcast bot, loaded from the environment
/// (with optional `.env` file support).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub http_bind_addr: String,
    pub registry_db_path: PathBuf,

    /// Recipients whose failure count exceeds this are evicted after a
    /// broadcast cycle.
    pub eviction_threshold: i64,

    // Canned replies
    pub welcome_message: String,
    pub bye_message: String,
    pub fallback_message: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let http_bind_addr =
            env_str("HTTP_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let registry_db_path =
            env_path("REGISTRY_DB_PATH").unwrap_or_else(|| PathBuf::from("./herald.db"));

        let eviction_threshold = env_i64("EVICTION_THRESHOLD").unwrap_or(3);
        if eviction_threshold < 0 {
            return Err(Error::Config(
                "EVICTION_THRESHOLD must be non-negative".to_string(),
            ));
        }

        let welcome_message = env_str("WELCOME_MESSAGE")
            .and_then(non_empty)
            .unwrap_or_else(|| {
                "Subscribed. You will now receive broadcast messages. Send /bye to unsubscribe."
                    .to_string()
            });
        let bye_message = env_str("BYE_MESSAGE").and_then(non_empty).unwrap_or_else(|| {
            "Unsubscribed. You will no longer receive broadcast messages.".to_string()
        });
        let fallback_message = env_str("FALLBACK_MESSAGE")
            .and_then(non_empty)
            .unwrap_or_else(|| {
                "Send /start to subscribe to broadcasts, or /bye to unsubscribe.".to_string()
            });

        Ok(Self {
            telegram_bot_token,
            http_bind_addr,
            registry_db_path,
            eviction_threshold,
            welcome_message,
            bye_message,
            fallback_message,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_i64(key: &str) -> Option<i64> {
    env_str(key).and_then(|s| s.trim().parse::<i64>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
