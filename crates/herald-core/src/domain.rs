use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Opaque recipient identifier.
///
/// The Telegram adapter stores numeric chat ids in decimal string form; the
/// core never interprets the contents beyond non-emptiness.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipientId(pub String);

impl RecipientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry row for one registered recipient.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    /// Unix epoch milliseconds (UTC) when registered. Immutable thereafter.
    pub created_at: i64,
    /// Consecutive delivery failures since the last successful send.
    pub failure_count: i64,
}
