//! Integrations and vendor payloads used across tests.

use orderbridge_domain::integration_types::{MERCADOLIBRE, SIIGO, WOOCOMMERCE};
use orderbridge_domain::Integration;
use serde_json::json;

pub fn integration(id: &str, integration_type_id: u32) -> Integration {
    Integration {
        id: id.to_string(),
        tenant_id: Some("tenant-1".to_string()),
        integration_type_id,
        name: format!("integration {id}"),
        config: serde_json::Map::new(),
        active: true,
    }
}

pub fn woocommerce_integration() -> Integration {
    integration("int-woo", WOOCOMMERCE)
}

pub fn mercadolibre_integration() -> Integration {
    integration("int-meli", MERCADOLIBRE)
}

pub fn siigo_integration() -> Integration {
    integration("int-siigo", SIIGO)
}

pub fn woocommerce_order(id: u64, status: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": id,
        "number": id.to_string(),
        "status": status,
        "currency": "COP",
        "total": "100000.00",
        "total_tax": "15966.39",
        "billing": { "first_name": "Laura", "last_name": "Rios", "email": "laura@example.com" },
        "line_items": [
            { "id": 1, "name": "Cafe", "product_id": 10, "quantity": 2, "subtotal": "84033.61",
              "total": "84033.61", "total_tax": "15966.39", "price": 42016.8 }
        ]
    }))
    .unwrap()
}

pub fn mercadolibre_order(id: u64) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": id,
        "status": "paid",
        "date_created": "2024-03-01T10:00:00.000-04:00",
        "total_amount": 50.0,
        "currency_id": "COP",
        "buyer": { "id": 77, "first_name": "Ana" },
        "order_items": [ { "item": { "id": "MCO1", "title": "Libro" }, "quantity": 1, "unit_price": 50.0 } ]
    }))
    .unwrap()
}

pub fn mercadolibre_orders(count: u64) -> Vec<Vec<u8>> {
    (1..=count).map(mercadolibre_order).collect()
}

pub fn invoice_request(integration_id: &str, correlation_id: &str) -> serde_json::Value {
    json!({
        "invoice_id": "inv-1",
        "integration_id": integration_id,
        "provider": "siigo",
        "operation": "create",
        "payload": {
            "customer": { "identification": "900123456", "name": "ACME SAS" },
            "items": [ { "code": "SKU-1", "description": "Cafe", "quantity": 1, "unit_price": 84033.61, "tax_rate": 19 } ],
            "subtotal": 84033.61,
            "tax_total": 15966.39,
            "total": 100000.0,
            "currency": "COP",
            "order_id": "order-1"
        },
        "correlation_id": correlation_id,
        "timestamp": "2024-05-01T12:00:00Z"
    })
}
