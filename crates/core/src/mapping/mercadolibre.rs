//! MercadoLibre orders (`/orders/{id}` and `/orders/search` results)

use orderbridge_domain::integration_types::MERCADOLIBRE;
use orderbridge_domain::{
    Address, AddressKind, CanonicalOrder, ChannelMetadata, Customer, MoneyBreakdown, OrderItem,
    Payment, Shipment,
};
use serde::Deserialize;

use super::fields::{
    lenient_f64, lenient_object, lenient_opt_f64, lenient_string, lenient_vec, non_empty, parse_timestamp,
};
use super::money::{discount_magnitude, sum};
use super::{status, OrderMapper, Platform};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeliOrder {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pack_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_created: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_amount: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency_id: String,
    #[serde(default, deserialize_with = "lenient_object")]
    pub buyer: Option<MeliBuyer>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub order_items: Vec<MeliOrderItem>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub payments: Vec<MeliPayment>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub shipping: Option<MeliShipping>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub coupon: Option<MeliAmount>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub taxes: Option<MeliAmount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeliBuyer {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nickname: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_object")]
    pub phone: Option<MeliPhone>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub billing_info: Option<MeliBillingInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeliPhone {
    #[serde(default, deserialize_with = "lenient_string")]
    pub area_code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub number: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeliBillingInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub doc_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub doc_number: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeliOrderItem {
    #[serde(default, deserialize_with = "lenient_object")]
    pub item: Option<MeliItem>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub unit_price: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeliItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub seller_sku: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub variation_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeliPayment {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub transaction_amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_paid_amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub shipping_cost: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_method_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeliShipping {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tracking_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tracking_method: String,
    #[serde(default, deserialize_with = "lenient_object")]
    pub shipping_option: Option<MeliShippingOption>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub receiver_address: Option<MeliAddress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeliShippingOption {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cost: f64,
    #[serde(default, deserialize_with = "lenient_object")]
    pub estimated_delivery_time: Option<MeliEstimatedDelivery>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeliEstimatedDelivery {
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeliAddress {
    #[serde(default, deserialize_with = "lenient_string")]
    pub address_line: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub comment: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub zip_code: String,
    #[serde(default, deserialize_with = "lenient_object")]
    pub city: Option<MeliNamed>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub state: Option<MeliNamed>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub country: Option<MeliNamed>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub receiver_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub receiver_phone: String,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeliNamed {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeliAmount {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MercadoLibreMapper;

impl OrderMapper for MercadoLibreMapper {
    type VendorOrder = MeliOrder;

    fn map(&self, order: &MeliOrder, raw: Option<&[u8]>) -> CanonicalOrder {
        let shipping = order.shipping.clone().unwrap_or_default();
        let option = shipping.shipping_option.clone().unwrap_or_default();
        let shipping_cost = if option.cost > 0.0 {
            option.cost
        } else {
            sum(order.payments.iter().map(|p| p.shipping_cost))
        };

        let totals = MoneyBreakdown {
            subtotal: sum(order.order_items.iter().map(|line| line.quantity * line.unit_price)),
            tax: order.taxes.as_ref().map_or(0.0, |t| t.amount),
            discount: discount_magnitude(order.coupon.as_ref().map_or(0.0, |c| c.amount)),
            shipping: shipping_cost,
            total: order.total_amount,
            currency: order.currency_id.clone(),
        };

        CanonicalOrder {
            tenant_id: None,
            integration_id: String::new(),
            integration_type_id: MERCADOLIBRE,
            platform: Platform::MercadoLibre.as_str().to_string(),
            external_id: order.id.clone(),
            order_number: non_empty(&order.pack_id).unwrap_or_else(|| order.id.clone()),
            status: status::mercadolibre(&order.status),
            original_status: order.status.clone(),
            presentment_totals: totals.clone(),
            totals,
            customer: order.buyer.as_ref().map(map_buyer).unwrap_or_default(),
            occurred_at: parse_timestamp(&order.date_created),
            imported_at: None,
            items: order.order_items.iter().map(map_item).collect(),
            addresses: shipping
                .receiver_address
                .as_ref()
                .map(map_address)
                .into_iter()
                .collect(),
            payments: order
                .payments
                .iter()
                .map(|payment| Payment {
                    amount: if payment.total_paid_amount > 0.0 {
                        payment.total_paid_amount
                    } else {
                        payment.transaction_amount
                    },
                    currency: non_empty(&payment.currency_id)
                        .unwrap_or_else(|| order.currency_id.clone()),
                    status: payment.status.clone(),
                    gateway: payment.payment_method_id.clone(),
                    transaction_id: non_empty(&payment.id),
                })
                .collect(),
            shipments: non_empty(&shipping.id)
                .map(|_| Shipment {
                    carrier: non_empty(&shipping.tracking_method)
                        .unwrap_or_else(|| option.name.clone()),
                    tracking_number: shipping.tracking_number.clone(),
                    tracking_url: None,
                    cost: shipping_cost,
                    status: shipping.status.clone(),
                    estimated_delivery: option
                        .estimated_delivery_time
                        .as_ref()
                        .and_then(|eta| parse_timestamp(&eta.date)),
                })
                .into_iter()
                .collect(),
            channel_metadata: raw.map(ChannelMetadata::from_raw),
        }
    }
}

fn map_buyer(buyer: &MeliBuyer) -> Customer {
    let phone = buyer
        .phone
        .as_ref()
        .map(|p| format!("{}{}", p.area_code, p.number).trim().to_string())
        .unwrap_or_default();
    Customer {
        external_id: buyer.id.clone(),
        first_name: non_empty(&buyer.first_name).unwrap_or_else(|| buyer.nickname.clone()),
        last_name: buyer.last_name.clone(),
        email: buyer.email.clone(),
        phone,
        document: buyer.billing_info.as_ref().map(|b| b.doc_number.clone()).unwrap_or_default(),
    }
}

fn map_item(line: &MeliOrderItem) -> OrderItem {
    let item = line.item.clone().unwrap_or_default();
    OrderItem {
        external_id: item.id.clone(),
        product_id: item.id,
        sku: item.seller_sku,
        variant_id: item.variation_id,
        name: item.title,
        quantity: line.quantity,
        unit_price: line.unit_price,
        total_price: line.quantity * line.unit_price,
        tax: 0.0,
        image_url: None,
        product_url: None,
    }
}

fn map_address(address: &MeliAddress) -> Address {
    let name_of = |named: Option<&MeliNamed>| {
        named.map(|n| non_empty(&n.name).unwrap_or_else(|| n.id.clone())).unwrap_or_default()
    };
    Address {
        name: address.receiver_name.clone(),
        line1: address.address_line.clone(),
        line2: address.comment.clone(),
        city: name_of(address.city.as_ref()),
        state: name_of(address.state.as_ref()),
        postal_code: address.zip_code.clone(),
        country: address.country.as_ref().map(|c| c.id.clone()).unwrap_or_default(),
        phone: address.receiver_phone.clone(),
        latitude: address.latitude,
        longitude: address.longitude,
        ..Address::empty(AddressKind::Shipping)
    }
}
