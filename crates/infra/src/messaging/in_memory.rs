//! In-process message queue
//!
//! Per-queue FIFO with broker-like semantics: a handler error puts the
//! message back at the head of its queue until `max_redeliveries` is
//! exhausted, then the message is dead-lettered. Suitable for development,
//! tests and single-process deployments; nothing survives a restart even for
//! queues declared durable.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use orderbridge_core::ports::{MessageHandler, MessageQueuePort};
use orderbridge_domain::{OrderBridgeError, Result};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_REDELIVERIES: u32 = 3;

#[derive(Debug)]
struct Envelope {
    payload: Vec<u8>,
    deliveries: u32,
}

#[derive(Debug)]
struct QueueState {
    durable: bool,
    pending: VecDeque<Envelope>,
    dead_letters: Vec<Vec<u8>>,
}

impl QueueState {
    const fn new(durable: bool) -> Self {
        Self { durable, pending: VecDeque::new(), dead_letters: Vec::new() }
    }
}

#[derive(Debug)]
pub struct InMemoryMessageQueue {
    queues: Mutex<HashMap<String, QueueState>>,
    available: Notify,
    shutdown: CancellationToken,
    max_redeliveries: u32,
}

impl InMemoryMessageQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_redeliveries(DEFAULT_MAX_REDELIVERIES)
    }

    /// Queue that redelivers a failed message at most `max_redeliveries`
    /// times before dead-lettering it.
    #[must_use]
    pub fn with_max_redeliveries(max_redeliveries: u32) -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            available: Notify::new(),
            shutdown: CancellationToken::new(),
            max_redeliveries,
        }
    }

    /// Stop every running `consume` loop after its current delivery.
    pub fn shutdown(&self) {
        info!("in-memory queue shutting down");
        self.shutdown.cancel();
        self.available.notify_waiters();
    }

    /// Snapshot of the payloads waiting in `queue`, oldest first.
    #[must_use]
    pub fn messages(&self, queue: &str) -> Vec<Vec<u8>> {
        self.queues
            .lock()
            .get(queue)
            .map(|state| state.pending.iter().map(|e| e.payload.clone()).collect())
            .unwrap_or_default()
    }

    /// Payloads that exhausted their redeliveries.
    #[must_use]
    pub fn dead_letters(&self, queue: &str) -> Vec<Vec<u8>> {
        self.queues.lock().get(queue).map(|state| state.dead_letters.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn is_declared(&self, queue: &str) -> bool {
        self.queues.lock().contains_key(queue)
    }

    fn next(&self, queue: &str) -> Option<Envelope> {
        self.queues.lock().get_mut(queue)?.pending.pop_front()
    }

    fn reject(&self, queue: &str, mut envelope: Envelope, error: &OrderBridgeError) {
        let mut queues = self.queues.lock();
        let state = queues.entry(queue.to_string()).or_insert_with(|| QueueState::new(true));
        envelope.deliveries += 1;

        if envelope.deliveries > self.max_redeliveries {
            warn!(queue, deliveries = envelope.deliveries, error = %error, "message dead-lettered");
            state.dead_letters.push(envelope.payload);
        } else {
            debug!(queue, deliveries = envelope.deliveries, error = %error, "message requeued");
            state.pending.push_front(envelope);
        }
    }
}

impl Default for InMemoryMessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageQueuePort for InMemoryMessageQueue {
    async fn declare_queue(&self, name: &str, durable: bool) -> Result<()> {
        let mut queues = self.queues.lock();
        match queues.get(name) {
            Some(existing) if existing.durable != durable => Err(OrderBridgeError::Queue(format!(
                "queue '{name}' already declared with durable={}",
                existing.durable
            ))),
            Some(_) => Ok(()),
            None => {
                debug!(queue = name, durable, "queue declared");
                queues.insert(name.to_string(), QueueState::new(durable));
                Ok(())
            }
        }
    }

    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(OrderBridgeError::Queue("message queue is shut down".into()));
        }
        {
            let mut queues = self.queues.lock();
            let state = queues.entry(queue.to_string()).or_insert_with(|| QueueState::new(true));
            state.pending.push_back(Envelope { payload: payload.to_vec(), deliveries: 0 });
        }
        self.available.notify_waiters();
        Ok(())
    }

    async fn consume(&self, queue: &str, handler: Arc<dyn MessageHandler>) -> Result<()> {
        loop {
            let notified = self.available.notified();
            if self.shutdown.is_cancelled() {
                debug!(queue, "consumer stopped");
                return Ok(());
            }

            let Some(envelope) = self.next(queue) else {
                tokio::select! {
                    () = notified => {}
                    () = self.shutdown.cancelled() => {}
                }
                continue;
            };

            if let Err(err) = handler.handle(&envelope.payload).await {
                self.reject(queue, envelope, &err);
            }
        }
    }
}
