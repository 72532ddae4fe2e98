//! Canonical order schema
//!
//! Every vendor payload collapses into [`CanonicalOrder`] before it reaches
//! the queue. Downstream consumers (billing, analytics) only ever see this
//! shape, serialised as snake_case JSON.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::CANONICAL_SCHEMA_VERSION;
use crate::errors::{OrderBridgeError, Result};
use crate::impl_domain_status_conversions;

/// Canonical order status.
///
/// Vendor statuses that have no entry in the vendor's lookup table are kept
/// verbatim in [`OrderStatus::Other`], so nothing is lost in translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Paid,
    Processing,
    OnHold,
    Invoiced,
    Fulfilled,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
    Failed,
    Deleted,
    /// Unmapped vendor status, passed through unchanged.
    Other(String),
}

impl OrderStatus {
    /// Every known canonical status, in lifecycle order.
    pub const KNOWN: [Self; 12] = [
        Self::Pending,
        Self::Paid,
        Self::Processing,
        Self::OnHold,
        Self::Invoiced,
        Self::Fulfilled,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
        Self::Refunded,
        Self::Failed,
        Self::Deleted,
    ];

    /// Wire representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Processing => "processing",
            Self::OnHold => "on_hold",
            Self::Invoiced => "invoiced",
            Self::Fulfilled => "fulfilled",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
            Self::Deleted => "deleted",
            Self::Other(raw) => raw,
        }
    }

    /// True for statuses outside the canonical vocabulary.
    #[must_use]
    pub const fn is_passthrough(&self) -> bool {
        matches!(self, Self::Other(_))
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        Self::KNOWN.into_iter().find(|status| status.as_str() == value).unwrap_or(Self::Other(value))
    }
}

impl From<OrderStatus> for String {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monetary breakdown of an order in a single currency.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MoneyBreakdown {
    pub subtotal: f64,
    pub tax: f64,
    /// Always non-negative.
    pub discount: f64,
    pub shipping: f64,
    pub total: f64,
    pub currency: String,
}

/// Customer identity as reported by the vendor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Customer {
    pub external_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// National id / tax document when the vendor exposes one.
    pub document: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderItem {
    pub external_id: String,
    pub product_id: String,
    pub sku: String,
    pub variant_id: String,
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_price: f64,
    pub tax: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    Billing,
    Shipping,
}

impl_domain_status_conversions!(AddressKind {
    Billing => "billing",
    Shipping => "shipping",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub kind: AddressKind,
    pub name: String,
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Address {
    /// Empty address of the given kind; mappers fill in what the vendor sent.
    #[must_use]
    pub fn empty(kind: AddressKind) -> Self {
        Self {
            kind,
            name: String::new(),
            line1: String::new(),
            line2: String::new(),
            city: String::new(),
            state: String::new(),
            postal_code: String::new(),
            country: String::new(),
            phone: String::new(),
            latitude: None,
            longitude: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Payment {
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub gateway: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Shipment {
    pub carrier: String,
    pub tracking_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    pub cost: f64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Channel bookkeeping attached to an order ingested with its raw payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetadata {
    /// Vendor payload exactly as received, kept for audit and replay.
    pub raw_data: String,
    pub schema_version: String,
    pub sync_status: String,
    pub is_latest: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl ChannelMetadata {
    /// Metadata for a freshly received payload.
    #[must_use]
    pub fn from_raw(raw: &[u8]) -> Self {
        Self {
            raw_data: String::from_utf8_lossy(raw).into_owned(),
            schema_version: CANONICAL_SCHEMA_VERSION.to_string(),
            sync_status: "synced".to_string(),
            is_latest: true,
            synced_at: None,
        }
    }
}

/// The vendor-agnostic order record published to downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalOrder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub integration_id: String,
    pub integration_type_id: u32,
    pub platform: String,
    pub external_id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub original_status: String,
    /// Amounts in the store's settlement currency.
    pub totals: MoneyBreakdown,
    /// Amounts in the currency shown to the buyer.
    pub presentment_totals: MoneyBreakdown,
    pub customer: Customer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItem>,
    pub addresses: Vec<Address>,
    pub payments: Vec<Payment>,
    pub shipments: Vec<Shipment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_metadata: Option<ChannelMetadata>,
}

impl CanonicalOrder {
    /// Attach caller-owned identity and ingestion timestamps.
    ///
    /// Mappers stay pure; everything that depends on who is ingesting or when
    /// is applied here.
    #[must_use]
    pub fn enrich(
        mut self,
        integration_id: &str,
        tenant_id: Option<&str>,
        ingested_at: DateTime<Utc>,
    ) -> Self {
        self.integration_id = integration_id.to_string();
        self.tenant_id = tenant_id.map(ToString::to_string);
        self.imported_at = Some(ingested_at);
        if let Some(metadata) = self.channel_metadata.as_mut() {
            metadata.is_latest = true;
            metadata.synced_at = Some(ingested_at);
        }
        self
    }

    /// Check the invariants that must hold before an order leaves the process.
    ///
    /// # Errors
    /// Returns `OrderBridgeError::InvalidInput` when an identity field is
    /// empty or a payment is recorded in a different settlement currency.
    pub fn validate_for_publish(&self) -> Result<()> {
        if self.external_id.trim().is_empty() {
            return Err(OrderBridgeError::InvalidInput(
                "canonical order has an empty external id".into(),
            ));
        }
        if self.integration_id.trim().is_empty() {
            return Err(OrderBridgeError::InvalidInput(format!(
                "canonical order {} has an empty integration id",
                self.external_id
            )));
        }
        let currency = &self.totals.currency;
        if let Some(payment) = self
            .payments
            .iter()
            .find(|p| !p.currency.is_empty() && !currency.is_empty() && &p.currency != currency)
        {
            return Err(OrderBridgeError::InvalidInput(format!(
                "order {} mixes settlement currencies ({} vs {})",
                self.external_id, currency, payment.currency
            )));
        }
        Ok(())
    }
}
