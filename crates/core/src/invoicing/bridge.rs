//! Invoice RPC bridge
//!
//! Consumes [`InvoiceRequestMessage`]s, issues the invoice through the
//! integration's provider and publishes exactly one correlated
//! [`InvoiceResponseMessage`] per request. Business failures travel back as
//! error responses; only a request that cannot be parsed (or a response that
//! cannot be published) is handed back to the transport for redelivery.
//!
//! Cancelling the bridge's token stops new work: requests not yet started go
//! back to the transport, pending vault and provider lookups end in an error
//! response, and the post-create document lookup is skipped. An invoice
//! create already sent always runs to completion.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use orderbridge_domain::{
    Config, InvoiceRequestMessage, InvoiceResponseMessage, OrderBridgeError, Result,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::ports::{CredentialVault, InvoiceProviderFactory, MessageHandler, MessageQueuePort};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceBridgeConfig {
    pub request_queue: String,
    pub response_queue: String,
    pub durable: bool,
    /// Wait before the follow-up document lookup.
    pub consistency_delay: Duration,
    pub lookup_after_create: bool,
}

impl InvoiceBridgeConfig {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_queue: config.queues.invoice_requests.clone(),
            response_queue: config.queues.invoice_responses.clone(),
            durable: config.queues.durable,
            consistency_delay: Duration::from_millis(config.invoicing.consistency_delay_ms),
            lookup_after_create: config.invoicing.lookup_after_create,
        }
    }
}

impl Default for InvoiceBridgeConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct InvoiceRpcBridge {
    vault: Arc<dyn CredentialVault>,
    providers: Arc<dyn InvoiceProviderFactory>,
    queue: Arc<dyn MessageQueuePort>,
    config: InvoiceBridgeConfig,
    cancel: CancellationToken,
}

impl InvoiceRpcBridge {
    pub fn new(
        vault: Arc<dyn CredentialVault>,
        providers: Arc<dyn InvoiceProviderFactory>,
        queue: Arc<dyn MessageQueuePort>,
        config: InvoiceBridgeConfig,
    ) -> Self {
        Self { vault, providers, queue, config, cancel: CancellationToken::new() }
    }

    /// Stop taking new work once `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    async fn unless_cancelled<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            () = self.cancel.cancelled() => {
                Err(OrderBridgeError::Internal("invoice bridge is shutting down".into()))
            }
            result = call => result,
        }
    }

    /// Declare both queues and consume requests until the transport stops.
    ///
    /// # Errors
    /// Queue declaration or consumption errors.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        self.queue.declare_queue(&self.config.request_queue, self.config.durable).await?;
        self.queue.declare_queue(&self.config.response_queue, self.config.durable).await?;
        info!(
            request_queue = %self.config.request_queue,
            response_queue = %self.config.response_queue,
            "invoice bridge consuming"
        );
        let queue = Arc::clone(&self.queue);
        let request_queue = self.config.request_queue.clone();
        queue.consume(&request_queue, self).await
    }

    /// Turn one request into its response. Never fails: every error becomes
    /// an error response.
    pub async fn process(
        &self,
        request: &InvoiceRequestMessage,
        received_at: Instant,
    ) -> InvoiceResponseMessage {
        let response = self.issue(request).await;
        let elapsed_ms = u64::try_from(received_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        response.with_processing_time_ms(elapsed_ms)
    }

    async fn issue(&self, request: &InvoiceRequestMessage) -> InvoiceResponseMessage {
        let integration = match self
            .unless_cancelled(self.vault.get_integration_by_id(&request.integration_id))
            .await
        {
            Ok(integration) if integration.active => integration,
            Ok(integration) => {
                let err =
                    OrderBridgeError::Config(format!("integration {} is inactive", integration.id));
                return InvoiceResponseMessage::failure(request, &err);
            }
            Err(err) => return InvoiceResponseMessage::failure(request, &err),
        };

        let provider = match self
            .unless_cancelled(self.providers.provider_for(
                &integration,
                &request.provider,
                request.payload.provider_config.as_ref(),
            ))
            .await
        {
            Ok(provider) => provider,
            Err(err) => return InvoiceResponseMessage::failure(request, &err),
        };

        let created = match provider.create_invoice(request).await {
            Ok(created) => created,
            Err(call_error) => {
                return InvoiceResponseMessage::failure(request, &call_error.error)
                    .with_audit(call_error.audit);
            }
        };

        let document = if self.config.lookup_after_create {
            let lookup = async {
                tokio::time::sleep(self.config.consistency_delay).await;
                provider.find_by_number(&created.invoice_number).await
            };
            let found = tokio::select! {
                () = self.cancel.cancelled() => {
                    info!(
                        correlation_id = %request.correlation_id,
                        invoice_number = %created.invoice_number,
                        "shutting down; skipping document lookup"
                    );
                    None
                }
                found = lookup => Some(found),
            };
            match found {
                None => None,
                Some(Ok(document)) => Some(document),
                Some(Err(call_error)) => {
                    warn!(
                        correlation_id = %request.correlation_id,
                        invoice_number = %created.invoice_number,
                        error = %call_error,
                        "document lookup after create failed"
                    );
                    None
                }
            }
        } else {
            None
        };

        InvoiceResponseMessage::success(
            request,
            created.invoice_number,
            created.external_id,
            created.issued_at,
        )
        .with_audit(created.audit)
        .with_document(document)
    }

    async fn publish_response(&self, response: &InvoiceResponseMessage) -> Result<()> {
        let payload = serde_json::to_vec(response)?;
        self.queue.publish(&self.config.response_queue, &payload).await
    }
}

#[async_trait]
impl MessageHandler for InvoiceRpcBridge {
    #[instrument(skip_all)]
    async fn handle(&self, payload: &[u8]) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(OrderBridgeError::Internal("invoice bridge is shutting down".into()));
        }
        let received_at = Instant::now();
        let request: InvoiceRequestMessage = serde_json::from_slice(payload).map_err(|err| {
            warn!(error = %err, "unparseable invoice request");
            OrderBridgeError::from(err)
        })?;

        let response = self.process(&request, received_at).await;
        self.publish_response(&response).await?;

        info!(
            correlation_id = %response.correlation_id,
            invoice_id = %response.invoice_id,
            provider = %response.provider,
            operation = %request.operation,
            status = %response.status,
            error_code = response.error_code.as_deref().unwrap_or(""),
            processing_time_ms = response.processing_time_ms,
            "invoice request processed"
        );
        Ok(())
    }
}
