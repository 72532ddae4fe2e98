//! Single-event ingestion for webhook handlers
//!
//! An HTTP layer verifies the webhook and then hands the topic and body to
//! [`WebhookIngestor::ingest`]. Deletion notifications are acknowledged
//! without producing a message.

use chrono::Utc;
use orderbridge_domain::constants::DELETION_TOPICS;
use orderbridge_domain::{Integration, OrderBridgeError, Result};
use tracing::{info, instrument};

use super::publisher::OrderPublisher;
use crate::mapping::MapperRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Published { external_id: String },
    Skipped { topic: String },
}

pub struct WebhookIngestor {
    registry: MapperRegistry,
    publisher: OrderPublisher,
}

impl WebhookIngestor {
    pub fn new(registry: MapperRegistry, publisher: OrderPublisher) -> Self {
        Self { registry, publisher }
    }

    /// Map one vendor event and publish it as a canonical order.
    ///
    /// # Errors
    /// `Config` for an inactive integration or one without a mapper,
    /// `InvalidInput` for an undecodable body, and any publish error.
    #[instrument(skip(self, integration, raw), fields(integration_id = %integration.id))]
    pub async fn ingest(
        &self,
        integration: &Integration,
        topic: &str,
        raw: &[u8],
    ) -> Result<IngestOutcome> {
        if is_deletion_topic(topic) {
            info!(topic, "deletion event acknowledged without publishing");
            return Ok(IngestOutcome::Skipped { topic: topic.to_string() });
        }
        if !integration.active {
            return Err(OrderBridgeError::Config(format!(
                "integration {} is inactive",
                integration.id
            )));
        }

        let order = self.registry.map(integration.integration_type_id, raw)?.enrich(
            &integration.id,
            integration.tenant_id.as_deref(),
            Utc::now(),
        );
        self.publisher.publish(&order).await?;

        info!(
            topic,
            external_id = %order.external_id,
            status = %order.status,
            "webhook order published"
        );
        Ok(IngestOutcome::Published { external_id: order.external_id })
    }
}

fn is_deletion_topic(topic: &str) -> bool {
    let topic = topic.trim();
    DELETION_TOPICS.iter().any(|candidate| candidate.eq_ignore_ascii_case(topic))
}
