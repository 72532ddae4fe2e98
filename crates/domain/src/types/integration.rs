//! Integration records owned by the external CRUD layer
//!
//! The stored `config` map is untyped; adapters convert it once into a typed
//! per-vendor struct through the helpers on [`Integration`].

use serde::{Deserialize, Serialize};

use crate::errors::{OrderBridgeError, Result};

/// Integration type identifiers as stored by the CRUD layer.
pub mod integration_types {
    pub const WOOCOMMERCE: u32 = 1;
    pub const MERCADOLIBRE: u32 = 2;
    pub const VTEX: u32 = 3;
    pub const SIIGO: u32 = 100;
}

/// A tenant's connection to one third-party platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub integration_type_id: u32,
    #[serde(default)]
    pub name: String,
    /// Non-secret settings. Secrets are fetched through the vault.
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl Integration {
    /// Required string setting.
    ///
    /// # Errors
    /// Returns `OrderBridgeError::Config` when the key is absent, empty or not
    /// a string/number.
    pub fn require_str(&self, key: &str) -> Result<String> {
        self.optional_str(key).ok_or_else(|| {
            OrderBridgeError::Config(format!(
                "integration {} is missing required config field '{}'",
                self.id, key
            ))
        })
    }

    /// Optional string setting; numbers are accepted and rendered as text.
    #[must_use]
    pub fn optional_str(&self, key: &str) -> Option<String> {
        match self.config.get(key)? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Optional integer setting; numeric strings are accepted.
    #[must_use]
    pub fn optional_i64(&self, key: &str) -> Option<i64> {
        match self.config.get(key)? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Copy of this integration with `key` set to `value` in its config.
    #[must_use]
    pub fn with_config_value(&self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        let mut updated = self.clone();
        updated.config.insert(key.to_string(), value.into());
        updated
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn integration() -> Integration {
        serde_json::from_value(json!({
            "id": "int-1",
            "integration_type_id": 2,
            "config": { "seller_id": 12345, "client_id": " app ", "blank": "" }
        }))
        .unwrap()
    }

    #[test]
    fn reads_typed_values_from_untyped_map() {
        let integration = integration();
        assert!(integration.active);
        assert_eq!(integration.require_str("client_id").unwrap(), "app");
        assert_eq!(integration.require_str("seller_id").unwrap(), "12345");
        assert_eq!(integration.optional_i64("seller_id"), Some(12345));
    }

    #[test]
    fn blank_required_field_is_a_config_error() {
        let err = integration().require_str("blank").unwrap_err();
        assert!(matches!(err, OrderBridgeError::Config(msg) if msg.contains("'blank'")));
    }

    #[test]
    fn with_config_value_leaves_original_untouched() {
        let original = integration();
        let updated = original.with_config_value("refresh_token", "rt-2");
        assert!(original.optional_str("refresh_token").is_none());
        assert_eq!(updated.optional_str("refresh_token").as_deref(), Some("rt-2"));
    }
}
