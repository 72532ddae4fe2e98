//! Validated publishing of canonical orders

use std::sync::Arc;

use orderbridge_domain::{CanonicalOrder, Result};
use tracing::debug;

use crate::ports::MessageQueuePort;

/// Serialises canonical orders onto the canonical-orders queue.
#[derive(Clone)]
pub struct OrderPublisher {
    queue: Arc<dyn MessageQueuePort>,
    queue_name: String,
}

impl OrderPublisher {
    pub fn new(queue: Arc<dyn MessageQueuePort>, queue_name: impl Into<String>) -> Self {
        Self { queue, queue_name: queue_name.into() }
    }

    #[must_use]
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// # Errors
    /// `InvalidInput` when the order breaks a publish invariant, otherwise
    /// any serialisation or queue error.
    pub async fn publish(&self, order: &CanonicalOrder) -> Result<()> {
        order.validate_for_publish()?;
        let payload = serde_json::to_vec(order)?;
        self.queue.publish(&self.queue_name, &payload).await?;
        debug!(
            integration_id = %order.integration_id,
            external_id = %order.external_id,
            platform = %order.platform,
            queue = %self.queue_name,
            "canonical order published"
        );
        Ok(())
    }
}
