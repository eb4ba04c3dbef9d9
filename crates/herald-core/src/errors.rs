use std::path::PathBuf;

/// Core error type for the broadcast bot.
///
/// Adapter crates map their specific errors into this type so the core can
/// handle failures consistently (fatal at startup vs recoverable per
/// recipient vs benign).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage unavailable at {path}: {source}")]
    StorageUnavailable {
        path: PathBuf,
        source: sqlx::Error,
    },

    #[error("registry is not open")]
    NotOpen,

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("recipient {0} not found")]
    NotFound(String),

    #[error("invalid recipient id: {0:?}")]
    InvalidRecipient(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
