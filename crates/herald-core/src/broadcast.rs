//! Broadcast orchestration: fan one message out to every registered
//! recipient, track per-recipient delivery failures, and evict recipients
//! that keep failing.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::RecipientId;
use crate::ports::DeliveryPort;
use crate::registry::RecipientRegistry;
use crate::{Error, Result};

/// Outcome of one broadcast cycle.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BroadcastReport {
    /// Number of recipients a delivery was attempted for.
    pub attempted: usize,
    pub failed: Vec<DeliveryFailure>,
    pub evicted: Vec<RecipientId>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DeliveryFailure {
    pub recipient: RecipientId,
    pub reason: String,
}

/// Sends a message to every registered recipient through the injected
/// delivery port, updating failure counters per outcome.
///
/// A single delivery failure never aborts the cycle; only failing to read
/// the recipient list does.
pub struct Broadcaster {
    registry: Arc<RecipientRegistry>,
    transport: Arc<dyn DeliveryPort>,
}

impl Broadcaster {
    pub fn new(registry: Arc<RecipientRegistry>, transport: Arc<dyn DeliveryPort>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Run one broadcast cycle.
    ///
    /// Recipients whose failure count ends up strictly above
    /// `eviction_threshold` are removed before the cycle returns.
    pub async fn broadcast(
        &self,
        message: &str,
        eviction_threshold: i64,
    ) -> Result<BroadcastReport> {
        let recipients = self
            .registry
            .list()
            .await
            .map_err(|e| Error::RegistryUnavailable(e.to_string()))?;

        tracing::info!(recipients = recipients.len(), "broadcasting message");

        let mut report = BroadcastReport {
            attempted: recipients.len(),
            ..Default::default()
        };

        for id in &recipients {
            match self.transport.send_text(id, message).await {
                Ok(()) => {
                    // Forget transient past failures once delivery works again,
                    // so eviction stays tied to consecutive failures.
                    if let Err(e) = self.registry.set_failure_count(id, 0).await {
                        tracing::warn!(recipient = %id, error = %e, "failed to reset failure count");
                    }
                }
                Err(e) => {
                    // A concurrent removal surfaces as NotFound; count from 0.
                    let count = self.registry.failure_count(id).await.unwrap_or(0) + 1;
                    if let Err(se) = self.registry.set_failure_count(id, count).await {
                        tracing::warn!(recipient = %id, error = %se, "failed to record delivery failure");
                    }
                    tracing::warn!(recipient = %id, failures = count, error = %e, "delivery failed");
                    report.failed.push(DeliveryFailure {
                        recipient: id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        match self.registry.list_failing(eviction_threshold).await {
            Ok(failing) => {
                for id in failing {
                    match self.registry.remove(&id).await {
                        Ok(()) => {
                            tracing::info!(recipient = %id, "evicted chronically failing recipient");
                            report.evicted.push(id);
                        }
                        Err(e) => {
                            tracing::warn!(recipient = %id, error = %e, "failed to evict recipient");
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to query failing recipients, skipping eviction");
            }
        }

        Ok(report)
    }
}
