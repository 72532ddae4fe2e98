//! Queue double that records every publish.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use orderbridge_core::{MessageHandler, MessageQueuePort};
use orderbridge_domain::{OrderBridgeError, Result};
use parking_lot::Mutex;

#[derive(Default)]
pub struct RecordingQueue {
    declared: Mutex<Vec<(String, bool)>>,
    published: Mutex<HashMap<String, Vec<Vec<u8>>>>,
    fail_publishes: Mutex<bool>,
    attempts: Mutex<usize>,
    failing_attempts: Mutex<Vec<usize>>,
}

impl RecordingQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn declared(&self) -> Vec<(String, bool)> {
        self.declared.lock().clone()
    }

    pub fn published(&self, queue: &str) -> Vec<Vec<u8>> {
        self.published.lock().get(queue).cloned().unwrap_or_default()
    }

    pub fn published_json(&self, queue: &str) -> Vec<serde_json::Value> {
        self.published(queue)
            .iter()
            .map(|payload| serde_json::from_slice(payload).expect("published payload is JSON"))
            .collect()
    }

    pub fn fail_publishes(&self, fail: bool) {
        *self.fail_publishes.lock() = fail;
    }

    /// Fail only the `n`th publish attempt (1-based).
    pub fn fail_publish_attempt(&self, n: usize) {
        self.failing_attempts.lock().push(n);
    }
}

#[async_trait]
impl MessageQueuePort for RecordingQueue {
    async fn declare_queue(&self, name: &str, durable: bool) -> Result<()> {
        self.declared.lock().push((name.to_string(), durable));
        Ok(())
    }

    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<()> {
        let attempt = {
            let mut attempts = self.attempts.lock();
            *attempts += 1;
            *attempts
        };
        if *self.fail_publishes.lock() || self.failing_attempts.lock().contains(&attempt) {
            return Err(OrderBridgeError::Queue("broker unavailable".into()));
        }
        self.published.lock().entry(queue.to_string()).or_default().push(payload.to_vec());
        Ok(())
    }

    /// Nothing is queued for consumption; returns immediately.
    async fn consume(&self, _queue: &str, _handler: Arc<dyn MessageHandler>) -> Result<()> {
        Ok(())
    }
}
