//! Port interfaces for message queue operations

use std::sync::Arc;

use async_trait::async_trait;
use orderbridge_domain::Result;

/// Callback invoked for every delivered message.
///
/// Returning `Err` tells the transport the message was not processed; it is
/// redelivered (or dead-lettered) according to the transport's policy.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, payload: &[u8]) -> Result<()>;
}

/// Broker abstraction. Payloads are JSON documents.
#[async_trait]
pub trait MessageQueuePort: Send + Sync {
    /// Declare `name`. Declaring an existing queue is a no-op.
    async fn declare_queue(&self, name: &str, durable: bool) -> Result<()>;

    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<()>;

    /// Deliver messages from `queue` to `handler` until the transport shuts
    /// down.
    async fn consume(&self, queue: &str, handler: Arc<dyn MessageHandler>) -> Result<()>;
}
