//! VTEX OMS order detail (`/api/oms/pvt/orders/{orderId}`)
//!
//! Every amount is an integer in minor units and is divided by 100 here.

use orderbridge_domain::integration_types::VTEX;
use orderbridge_domain::{
    Address, AddressKind, CanonicalOrder, ChannelMetadata, Customer, MoneyBreakdown, OrderItem,
    OrderStatus, Payment, Shipment,
};
use serde::Deserialize;

use super::fields::{
    lenient_i64, lenient_object, lenient_string, lenient_vec, non_empty, parse_timestamp,
};
use super::money::{discount_magnitude, from_minor_units};
use super::{status, OrderMapper, Platform};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VtexOrder {
    #[serde(default, deserialize_with = "lenient_string")]
    pub order_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sequence: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub value: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub creation_date: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub totals: Vec<VtexTotal>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub items: Vec<VtexItem>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub client_profile_data: Option<VtexClient>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub shipping_data: Option<VtexShippingData>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub payment_data: Option<VtexPaymentData>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub package_attachment: Option<VtexPackageAttachment>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub store_preferences_data: Option<VtexStorePreferences>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VtexTotal {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub value: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VtexItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub unique_id: String,
    /// SKU id.
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ref_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub quantity: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub price: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub selling_price: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub tax: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub detail_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VtexClient {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_profile_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub document: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VtexShippingData {
    #[serde(default, deserialize_with = "lenient_object")]
    pub address: Option<VtexAddress>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub logistics_info: Vec<VtexLogisticsInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VtexAddress {
    #[serde(default, deserialize_with = "lenient_string")]
    pub receiver_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub street: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub complement: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub neighborhood: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub postal_code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: String,
    /// `[longitude, latitude]`.
    #[serde(default, deserialize_with = "lenient_vec")]
    pub geo_coordinates: Vec<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VtexLogisticsInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub selected_sla: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub shipping_estimate_date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VtexPaymentData {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub transactions: Vec<VtexTransaction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VtexTransaction {
    #[serde(default, deserialize_with = "lenient_string")]
    pub transaction_id: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub payments: Vec<VtexPayment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VtexPayment {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_system_name: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub value: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VtexPackageAttachment {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub packages: Vec<VtexPackage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VtexPackage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub courier: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tracking_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tracking_url: String,
    #[serde(default, deserialize_with = "lenient_object")]
    pub courier_status: Option<VtexCourierStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VtexCourierStatus {
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VtexStorePreferences {
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency_code: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VtexMapper;

impl OrderMapper for VtexMapper {
    type VendorOrder = VtexOrder;

    #[allow(clippy::cast_precision_loss)]
    fn map(&self, order: &VtexOrder, raw: Option<&[u8]>) -> CanonicalOrder {
        let status = status::vtex(&order.status);
        let currency = order
            .store_preferences_data
            .as_ref()
            .map(|prefs| prefs.currency_code.clone())
            .unwrap_or_default();
        let total_of = |id: &str| -> i64 {
            order.totals.iter().filter(|t| t.id.eq_ignore_ascii_case(id)).map(|t| t.value).sum()
        };

        let totals = MoneyBreakdown {
            subtotal: from_minor_units(total_of("Items")),
            tax: from_minor_units(total_of("Tax")),
            discount: discount_magnitude(from_minor_units(total_of("Discounts"))),
            shipping: from_minor_units(total_of("Shipping")),
            total: from_minor_units(order.value),
            currency: currency.clone(),
        };
        let shipping_data = order.shipping_data.clone().unwrap_or_default();
        let estimated_delivery = shipping_data
            .logistics_info
            .iter()
            .find_map(|info| parse_timestamp(&info.shipping_estimate_date));
        let packages = order
            .package_attachment
            .as_ref()
            .map(|attachment| attachment.packages.as_slice())
            .unwrap_or_default();
        let cost_per_package = if packages.is_empty() {
            0.0
        } else {
            totals.shipping / packages.len() as f64
        };

        CanonicalOrder {
            tenant_id: None,
            integration_id: String::new(),
            integration_type_id: VTEX,
            platform: Platform::Vtex.as_str().to_string(),
            external_id: order.order_id.clone(),
            order_number: non_empty(&order.sequence).unwrap_or_else(|| order.order_id.clone()),
            original_status: order.status.clone(),
            presentment_totals: totals.clone(),
            customer: order.client_profile_data.as_ref().map(map_client).unwrap_or_default(),
            occurred_at: parse_timestamp(&order.creation_date),
            imported_at: None,
            items: order.items.iter().map(map_item).collect(),
            addresses: shipping_data.address.as_ref().map(map_address).into_iter().collect(),
            payments: order
                .payment_data
                .iter()
                .flat_map(|data| data.transactions.iter())
                .flat_map(|tx| {
                    tx.payments.iter().map(|payment| Payment {
                        amount: from_minor_units(payment.value),
                        currency: currency.clone(),
                        status: payment_status(&status).to_string(),
                        gateway: payment.payment_system_name.clone(),
                        transaction_id: non_empty(&payment.tid)
                            .or_else(|| non_empty(&tx.transaction_id)),
                    })
                })
                .collect(),
            shipments: packages
                .iter()
                .map(|package| Shipment {
                    carrier: package.courier.clone(),
                    tracking_number: package.tracking_number.clone(),
                    tracking_url: non_empty(&package.tracking_url),
                    cost: cost_per_package,
                    status: package
                        .courier_status
                        .as_ref()
                        .map(|s| s.status.clone())
                        .unwrap_or_default(),
                    estimated_delivery,
                })
                .collect(),
            channel_metadata: raw.map(ChannelMetadata::from_raw),
            totals,
            status,
        }
    }
}

fn map_client(client: &VtexClient) -> Customer {
    Customer {
        external_id: client.user_profile_id.clone(),
        first_name: client.first_name.clone(),
        last_name: client.last_name.clone(),
        email: client.email.clone(),
        phone: client.phone.clone(),
        document: client.document.clone(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn map_item(item: &VtexItem) -> OrderItem {
    let unit_minor = if item.selling_price > 0 { item.selling_price } else { item.price };
    OrderItem {
        external_id: non_empty(&item.unique_id).unwrap_or_else(|| item.id.clone()),
        product_id: item.product_id.clone(),
        sku: non_empty(&item.ref_id).unwrap_or_else(|| item.id.clone()),
        variant_id: item.id.clone(),
        name: item.name.clone(),
        quantity: item.quantity as f64,
        unit_price: from_minor_units(unit_minor),
        total_price: from_minor_units(unit_minor.saturating_mul(item.quantity)),
        tax: from_minor_units(item.tax),
        image_url: non_empty(&item.image_url),
        product_url: non_empty(&item.detail_url),
    }
}

fn map_address(address: &VtexAddress) -> Address {
    let line1 = format!("{} {}", address.street, address.number).trim().to_string();
    let (longitude, latitude) = match address.geo_coordinates.as_slice() {
        [lng, lat, ..] => (Some(*lng), Some(*lat)),
        _ => (None, None),
    };
    Address {
        name: address.receiver_name.clone(),
        line1,
        line2: [address.complement.as_str(), address.neighborhood.as_str()]
            .iter()
            .filter(|part| !part.trim().is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", "),
        city: address.city.clone(),
        state: address.state.clone(),
        postal_code: address.postal_code.clone(),
        country: address.country.clone(),
        latitude,
        longitude,
        ..Address::empty(AddressKind::Shipping)
    }
}

fn payment_status(status: &OrderStatus) -> &'static str {
    match status {
        OrderStatus::Paid
        | OrderStatus::Processing
        | OrderStatus::Invoiced
        | OrderStatus::Shipped
        | OrderStatus::Delivered => "approved",
        OrderStatus::Cancelled => "cancelled",
        _ => "pending",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn order_json() -> serde_json::Value {
        json!({
            "orderId": "1172452900788-01",
            "sequence": "502556",
            "status": "invoiced",
            "value": 12990,
            "creationDate": "2024-02-04T20:09:43.8994064+00:00",
            "totals": [
                { "id": "Items", "value": 11990 },
                { "id": "Discounts", "value": -1000 },
                { "id": "Shipping", "value": 2000 },
                { "id": "Tax", "value": 0 }
            ],
            "items": [
                { "uniqueId": "87F0945", "id": "1", "productId": "9", "refId": "BIC-01",
                  "name": "Bicicleta", "quantity": 1, "price": 11990, "sellingPrice": 11990,
                  "tax": 0, "imageUrl": "https://img.example/1.jpg", "detailUrl": "/bicicleta/p" }
            ],
            "clientProfileData": {
                "email": "buyer@example.com", "firstName": "Maria", "lastName": "Silva",
                "document": "12345678900", "phone": "+5511999999999", "userProfileId": "u-1"
            },
            "shippingData": {
                "address": {
                    "receiverName": "Maria Silva", "street": "Rua A", "number": "10",
                    "complement": "Apto 2", "neighborhood": "Centro", "city": "Rio de Janeiro",
                    "state": "RJ", "postalCode": "22250-040", "country": "BRA",
                    "geoCoordinates": [-43.18, -22.94]
                },
                "logisticsInfo": [ { "selectedSla": "Normal", "shippingEstimateDate": "2024-02-10T00:00:00+00:00" } ]
            },
            "paymentData": {
                "transactions": [
                    { "transactionId": "TX1", "payments": [
                        { "id": "P1", "paymentSystemName": "Visa", "value": 12990, "tid": "" }
                    ] }
                ]
            },
            "packageAttachment": {
                "packages": [ { "courier": "Correios", "trackingNumber": "BR123", "trackingUrl": "",
                                "courierStatus": { "status": "in_transit" } } ]
            },
            "storePreferencesData": { "currencyCode": "BRL" }
        })
    }

    fn map(value: serde_json::Value) -> CanonicalOrder {
        let order: VtexOrder = serde_json::from_value(value).unwrap();
        VtexMapper.map(&order, None)
    }

    #[test]
    fn divides_minor_units_by_one_hundred() {
        let order = map(order_json());

        assert_eq!(order.status, OrderStatus::Invoiced);
        assert_eq!(order.order_number, "502556");
        assert!((order.totals.total - 129.90).abs() < 1e-9);
        assert!((order.totals.subtotal - 119.90).abs() < 1e-9);
        assert!((order.totals.discount - 10.0).abs() < 1e-9);
        assert!((order.totals.shipping - 20.0).abs() < 1e-9);
        assert_eq!(order.totals.currency, "BRL");
        assert!((order.items[0].unit_price - 119.90).abs() < 1e-9);
        assert_eq!(order.items[0].product_url.as_deref(), Some("/bicicleta/p"));
    }

    #[test]
    fn geo_coordinates_are_longitude_first() {
        let order = map(order_json());
        let address = &order.addresses[0];

        assert_eq!(address.longitude, Some(-43.18));
        assert_eq!(address.latitude, Some(-22.94));
        assert_eq!(address.line1, "Rua A 10");
        assert_eq!(address.line2, "Apto 2, Centro");
    }

    #[test]
    fn packages_become_shipments_and_transactions_become_payments() {
        let order = map(order_json());

        assert_eq!(order.shipments.len(), 1);
        assert_eq!(order.shipments[0].carrier, "Correios");
        assert!(order.shipments[0].tracking_url.is_none());
        assert!((order.shipments[0].cost - 20.0).abs() < 1e-9);
        assert!(order.shipments[0].estimated_delivery.is_some());

        assert_eq!(order.payments.len(), 1);
        assert!((order.payments[0].amount - 129.90).abs() < 1e-9);
        assert_eq!(order.payments[0].transaction_id.as_deref(), Some("TX1"));
        assert_eq!(order.payments[0].status, "approved");
    }

    #[test]
    fn sparse_order_maps_with_defaults() {
        let order = map(json!({ "orderId": "v1-01", "status": "window-to-cancel" }));

        assert_eq!(order.status, OrderStatus::OnHold);
        assert!(order.totals.total.abs() < f64::EPSILON);
        assert!(order.shipments.is_empty());
        assert!(order.payments.is_empty());
        assert_eq!(order.order_number, "v1-01");
    }
}
