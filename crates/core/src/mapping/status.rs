//! Vendor status lookup tables
//!
//! Lookups are case-insensitive. A vendor status without an entry is passed
//! through verbatim as [`OrderStatus::Other`].

use orderbridge_domain::OrderStatus;

fn normalise(raw: &str, table: fn(&str) -> Option<OrderStatus>) -> OrderStatus {
    table(raw.trim().to_ascii_lowercase().as_str())
        .unwrap_or_else(|| OrderStatus::Other(raw.to_string()))
}

#[must_use]
pub fn woocommerce(raw: &str) -> OrderStatus {
    normalise(raw, |status| {
        Some(match status {
            "pending" | "checkout-draft" => OrderStatus::Pending,
            "processing" => OrderStatus::Paid,
            "on-hold" => OrderStatus::OnHold,
            "completed" => OrderStatus::Fulfilled,
            "cancelled" => OrderStatus::Cancelled,
            "refunded" => OrderStatus::Refunded,
            "failed" => OrderStatus::Failed,
            "trash" => OrderStatus::Deleted,
            _ => return None,
        })
    })
}

#[must_use]
pub fn mercadolibre(raw: &str) -> OrderStatus {
    normalise(raw, |status| {
        Some(match status {
            "confirmed" | "payment_required" | "partially_paid" => OrderStatus::Pending,
            "payment_in_process" => OrderStatus::Processing,
            "paid" => OrderStatus::Paid,
            "partially_refunded" => OrderStatus::Refunded,
            "pending_cancel" => OrderStatus::OnHold,
            "cancelled" => OrderStatus::Cancelled,
            "invalid" => OrderStatus::Failed,
            _ => return None,
        })
    })
}

#[must_use]
pub fn vtex(raw: &str) -> OrderStatus {
    normalise(raw, |status| {
        Some(match status {
            "order-created" | "payment-pending" => OrderStatus::Pending,
            "waiting-for-order-authorization" | "window-to-cancel" | "cancellation-requested" => {
                OrderStatus::OnHold
            }
            "payment-approved" => OrderStatus::Paid,
            "ready-for-handling" | "handling" => OrderStatus::Processing,
            "invoiced" => OrderStatus::Invoiced,
            "canceled" | "cancel" => OrderStatus::Cancelled,
            "order-completed" => OrderStatus::Delivered,
            _ => return None,
        })
    })
}
