//! Vendor order payloads to [`CanonicalOrder`]
//!
//! Mappers are pure and infallible: once a payload has been decoded, missing
//! or malformed optional data degrades to empty values. The only error is a
//! payload that is not a JSON object at all, reported by
//! [`Platform::map_raw`].

pub mod fields;
pub mod mercadolibre;
pub mod money;
pub mod status;
pub mod vtex;
pub mod woocommerce;

use std::collections::HashMap;

use orderbridge_domain::integration_types::{MERCADOLIBRE, VTEX, WOOCOMMERCE};
use orderbridge_domain::{impl_domain_status_conversions, CanonicalOrder, OrderBridgeError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use mercadolibre::MercadoLibreMapper;
pub use vtex::VtexMapper;
pub use woocommerce::WooCommerceMapper;

/// Pure transform from one vendor's order shape to the canonical schema.
pub trait OrderMapper {
    type VendorOrder: DeserializeOwned;

    /// Map a decoded order. `raw`, when given, is preserved byte-for-byte in
    /// the order's channel metadata.
    fn map(&self, order: &Self::VendorOrder, raw: Option<&[u8]>) -> CanonicalOrder;
}

/// Order platforms with a mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    WooCommerce,
    MercadoLibre,
    Vtex,
}

impl_domain_status_conversions!(Platform {
    WooCommerce => "woocommerce",
    MercadoLibre => "mercadolibre",
    Vtex => "vtex",
});

impl Platform {
    pub const ALL: [Self; 3] = [Self::WooCommerce, Self::MercadoLibre, Self::Vtex];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WooCommerce => "woocommerce",
            Self::MercadoLibre => "mercadolibre",
            Self::Vtex => "vtex",
        }
    }

    #[must_use]
    pub const fn integration_type_id(self) -> u32 {
        match self {
            Self::WooCommerce => WOOCOMMERCE,
            Self::MercadoLibre => MERCADOLIBRE,
            Self::Vtex => VTEX,
        }
    }

    /// Decode `raw` as this platform's order and map it, keeping `raw` as the
    /// channel payload.
    ///
    /// # Errors
    /// `OrderBridgeError::InvalidInput` when `raw` is not a JSON object.
    pub fn map_raw(self, raw: &[u8]) -> Result<CanonicalOrder> {
        match self {
            Self::WooCommerce => decode_and_map(&WooCommerceMapper, self, raw),
            Self::MercadoLibre => decode_and_map(&MercadoLibreMapper, self, raw),
            Self::Vtex => decode_and_map(&VtexMapper, self, raw),
        }
    }
}

fn decode_and_map<M: OrderMapper>(
    mapper: &M,
    platform: Platform,
    raw: &[u8],
) -> Result<CanonicalOrder> {
    // Derived structs also accept positional arrays, so require an object first.
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(raw).map_err(|err| {
            OrderBridgeError::InvalidInput(format!(
                "{platform} order payload is not a JSON object: {err}"
            ))
        })?;
    let order: M::VendorOrder =
        serde_json::from_value(serde_json::Value::Object(object)).map_err(|err| {
            OrderBridgeError::InvalidInput(format!(
                "{platform} order payload is not decodable: {err}"
            ))
        })?;
    Ok(mapper.map(&order, Some(raw)))
}

/// Integration type id to platform lookup.
#[derive(Debug, Clone)]
pub struct MapperRegistry {
    platforms: HashMap<u32, Platform>,
}

impl MapperRegistry {
    /// Registry without any platform.
    #[must_use]
    pub fn empty() -> Self {
        Self { platforms: HashMap::new() }
    }

    /// Route `integration_type_id` to `platform`, replacing any previous route.
    #[must_use]
    pub fn with(mut self, integration_type_id: u32, platform: Platform) -> Self {
        self.platforms.insert(integration_type_id, platform);
        self
    }

    /// # Errors
    /// `OrderBridgeError::Config` when no platform handles the type.
    pub fn resolve(&self, integration_type_id: u32) -> Result<Platform> {
        self.platforms.get(&integration_type_id).copied().ok_or_else(|| {
            OrderBridgeError::Config(format!(
                "no order mapper registered for integration type {integration_type_id}"
            ))
        })
    }

    /// Resolve the platform and map one raw payload.
    ///
    /// # Errors
    /// See [`Self::resolve`] and [`Platform::map_raw`].
    pub fn map(&self, integration_type_id: u32, raw: &[u8]) -> Result<CanonicalOrder> {
        self.resolve(integration_type_id)?.map_raw(raw)
    }
}

impl Default for MapperRegistry {
    fn default() -> Self {
        Platform::ALL
            .into_iter()
            .fold(Self::empty(), |registry, platform| {
                registry.with(platform.integration_type_id(), platform)
            })
    }
}
