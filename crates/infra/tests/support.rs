#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use orderbridge_domain::integration_types::{MERCADOLIBRE, SIIGO};
use orderbridge_domain::{Integration, InvoiceRequestMessage};
use orderbridge_infra::{HttpClient, InMemoryCredentialVault, InMemoryMessageQueue};
use serde_json::{json, Map, Value};
use wiremock::MockServer;

pub const SIIGO_ID: &str = "int-siigo";
pub const MELI_ID: &str = "int-meli";

/// Single-attempt client with a short timeout so failing tests fail fast.
pub fn http_client() -> HttpClient {
    HttpClient::builder()
        .max_attempts(1)
        .timeout(Duration::from_secs(5))
        .build()
        .expect("http client should build")
}

fn config(pairs: Value) -> Map<String, Value> {
    pairs.as_object().cloned().unwrap_or_default()
}

/// Vault holding a Siigo integration pointed at `server`.
pub fn siigo_vault(server: &MockServer) -> Arc<InMemoryCredentialVault> {
    let vault = Arc::new(InMemoryCredentialVault::new());
    vault.insert_integration(Integration {
        id: SIIGO_ID.into(),
        tenant_id: Some("tenant-1".into()),
        integration_type_id: SIIGO,
        name: "Siigo".into(),
        config: config(json!({
            "base_url": server.uri(),
            "username": "api@store.co",
            "partner_id": "OrderBridge",
            "document_id": 24446,
            "seller_id": 629,
            "payment_type_id": 5636
        })),
        active: true,
    });
    vault.set_credential(SIIGO_ID, "access_key", "siigo-access-key");
    vault
}

/// Vault holding a MercadoLibre integration pointed at `server`.
pub fn mercadolibre_vault(server: &MockServer) -> Arc<InMemoryCredentialVault> {
    let vault = Arc::new(InMemoryCredentialVault::new());
    vault.insert_integration(Integration {
        id: MELI_ID.into(),
        tenant_id: Some("tenant-1".into()),
        integration_type_id: MERCADOLIBRE,
        name: "MercadoLibre".into(),
        config: config(json!({
            "api_base_url": server.uri(),
            "seller_id": "777",
            "client_id": "meli-app",
            "refresh_token": "TG-rt-1"
        })),
        active: true,
    });
    vault.set_credential(MELI_ID, "client_secret", "meli-secret");
    vault
}

pub fn invoice_request(correlation_id: &str) -> InvoiceRequestMessage {
    serde_json::from_value(json!({
        "invoice_id": "inv-1",
        "integration_id": SIIGO_ID,
        "provider": "siigo",
        "operation": "create",
        "payload": {
            "customer": { "identification": "900123456", "identification_type": "31", "name": "Comercial SAS" },
            "items": [
                { "code": "SKU-1", "description": "Camiseta", "quantity": 1, "unit_price": 84033.61, "tax_rate": 19.0 }
            ],
            "subtotal": 84033.61,
            "tax_total": 15966.39,
            "total": 100000.0,
            "currency": "COP",
            "order_id": "o-1"
        },
        "correlation_id": correlation_id,
        "timestamp": "2024-05-01T12:00:00Z"
    }))
    .expect("invoice request fixture should parse")
}

pub fn mercadolibre_order(id: u64) -> Value {
    json!({
        "id": id,
        "status": "paid",
        "date_created": "2024-03-01T10:00:00.000-04:00",
        "total_amount": 50.0,
        "currency_id": "COP",
        "buyer": { "id": 77, "first_name": "Ana" },
        "order_items": [ { "item": { "id": "MCO1", "title": "Libro" }, "quantity": 1, "unit_price": 50.0 } ]
    })
}

/// Poll `queue` until `queue_name` holds at least `count` messages.
pub async fn wait_for_messages(
    queue: &InMemoryMessageQueue,
    queue_name: &str,
    count: usize,
) -> Vec<Value> {
    for _ in 0..200 {
        let messages = queue.messages(queue_name);
        if messages.len() >= count {
            return messages
                .iter()
                .map(|raw| serde_json::from_slice(raw).expect("queued payload should be JSON"))
                .collect();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {count} messages on {queue_name}");
}
