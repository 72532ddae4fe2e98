//! WooCommerce REST v3 orders
//!
//! Amounts arrive as decimal strings. The store has a single currency, so
//! presentment totals equal settlement totals.

use orderbridge_domain::integration_types::WOOCOMMERCE;
use orderbridge_domain::{
    Address, AddressKind, CanonicalOrder, ChannelMetadata, Customer, MoneyBreakdown, OrderItem,
    OrderStatus, Payment, Shipment,
};
use serde::Deserialize;

use super::fields::{
    lenient_f64, lenient_object, lenient_string, lenient_vec, non_empty, non_zero_id,
    parse_timestamp, value_to_string,
};
use super::money::{discount_magnitude, sum};
use super::{status, OrderMapper};

/// Meta keys checkout plugins commonly use for the buyer's tax document.
const DOCUMENT_META_KEYS: &[&str] = &["_billing_document", "billing_document", "_billing_nit"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WooOrder {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_created_gmt: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_created: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_paid_gmt: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub discount_total: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub shipping_total: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_tax: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_id: String,
    #[serde(default, deserialize_with = "lenient_object")]
    pub billing: Option<WooAddress>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub shipping: Option<WooAddress>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_method: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_method_title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub transaction_id: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub line_items: Vec<WooLineItem>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub shipping_lines: Vec<WooShippingLine>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub meta_data: Vec<WooMeta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WooAddress {
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address_1: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address_2: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub postcode: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WooLineItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub variation_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sku: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub subtotal: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_tax: f64,
    #[serde(default, deserialize_with = "lenient_object")]
    pub image: Option<WooImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WooImage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub src: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WooShippingLine {
    #[serde(default, deserialize_with = "lenient_string")]
    pub method_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub method_title: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WooMeta {
    #[serde(default, deserialize_with = "lenient_string")]
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WooCommerceMapper;

impl OrderMapper for WooCommerceMapper {
    type VendorOrder = WooOrder;

    fn map(&self, order: &WooOrder, raw: Option<&[u8]>) -> CanonicalOrder {
        let status = status::woocommerce(&order.status);
        let totals = MoneyBreakdown {
            subtotal: sum(order.line_items.iter().map(|item| item.subtotal)),
            tax: order.total_tax,
            discount: discount_magnitude(order.discount_total),
            shipping: order.shipping_total,
            total: order.total,
            currency: order.currency.clone(),
        };
        let billing = order.billing.clone().unwrap_or_default();

        CanonicalOrder {
            tenant_id: None,
            integration_id: String::new(),
            integration_type_id: WOOCOMMERCE,
            platform: super::Platform::WooCommerce.as_str().to_string(),
            external_id: order.id.clone(),
            order_number: non_empty(&order.number).unwrap_or_else(|| order.id.clone()),
            original_status: order.status.clone(),
            presentment_totals: totals.clone(),
            totals,
            customer: Customer {
                external_id: non_zero_id(&order.customer_id),
                first_name: billing.first_name.clone(),
                last_name: billing.last_name.clone(),
                email: billing.email.clone(),
                phone: billing.phone.clone(),
                document: document_from_meta(&order.meta_data),
            },
            occurred_at: parse_timestamp(&order.date_created_gmt)
                .or_else(|| parse_timestamp(&order.date_created)),
            imported_at: None,
            items: order.line_items.iter().map(map_item).collect(),
            addresses: addresses(order),
            payments: payment(order).into_iter().collect(),
            shipments: order
                .shipping_lines
                .iter()
                .map(|line| Shipment {
                    carrier: non_empty(&line.method_title)
                        .unwrap_or_else(|| line.method_id.clone()),
                    tracking_number: String::new(),
                    tracking_url: None,
                    cost: line.total,
                    status: shipment_status(&status).to_string(),
                    estimated_delivery: None,
                })
                .collect(),
            channel_metadata: raw.map(ChannelMetadata::from_raw),
            status,
        }
    }
}

fn map_item(item: &WooLineItem) -> OrderItem {
    let unit_price = if item.price > 0.0 || item.quantity <= 0.0 {
        item.price
    } else {
        item.subtotal / item.quantity
    };
    OrderItem {
        external_id: item.id.clone(),
        product_id: non_zero_id(&item.product_id),
        sku: item.sku.clone(),
        variant_id: non_zero_id(&item.variation_id),
        name: item.name.clone(),
        quantity: item.quantity,
        unit_price,
        total_price: item.total,
        tax: item.total_tax,
        image_url: item.image.as_ref().and_then(|image| non_empty(&image.src)),
        product_url: None,
    }
}

fn addresses(order: &WooOrder) -> Vec<Address> {
    [(AddressKind::Billing, &order.billing), (AddressKind::Shipping, &order.shipping)]
        .into_iter()
        .filter_map(|(kind, address)| address.as_ref().map(|a| map_address(kind, a)))
        .collect()
}

fn map_address(kind: AddressKind, address: &WooAddress) -> Address {
    Address {
        name: format!("{} {}", address.first_name, address.last_name).trim().to_string(),
        line1: address.address_1.clone(),
        line2: address.address_2.clone(),
        city: address.city.clone(),
        state: address.state.clone(),
        postal_code: address.postcode.clone(),
        country: address.country.clone(),
        phone: address.phone.clone(),
        ..Address::empty(kind)
    }
}

fn payment(order: &WooOrder) -> Option<Payment> {
    let gateway = non_empty(&order.payment_method_title)
        .or_else(|| non_empty(&order.payment_method))?;
    let paid = !order.date_paid_gmt.trim().is_empty();
    Some(Payment {
        amount: order.total,
        currency: order.currency.clone(),
        status: if paid { "paid" } else { "pending" }.to_string(),
        gateway,
        transaction_id: non_empty(&order.transaction_id),
    })
}

fn document_from_meta(meta: &[WooMeta]) -> String {
    meta.iter()
        .find(|entry| DOCUMENT_META_KEYS.contains(&entry.key.as_str()))
        .map(|entry| value_to_string(&entry.value))
        .unwrap_or_default()
}

fn shipment_status(status: &OrderStatus) -> &'static str {
    match status {
        OrderStatus::Fulfilled | OrderStatus::Shipped => "shipped",
        OrderStatus::Delivered => "delivered",
        OrderStatus::Cancelled | OrderStatus::Deleted | OrderStatus::Failed => "cancelled",
        _ => "pending",
    }
}
