use async_trait::async_trait;

use crate::{domain::RecipientId, Result};

/// Hexagonal port for message delivery.
///
/// Telegram is the first implementation; the shape is deliberately narrow so
/// other messengers can fit behind it. The core treats any non-success as a
/// generic delivery failure and never interprets transport error codes.
#[async_trait]
pub trait DeliveryPort: Send + Sync {
    async fn send_text(&self, recipient: &RecipientId, text: &str) -> Result<()>;
}
