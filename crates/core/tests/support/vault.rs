//! Vault double backed by a map.

use std::collections::HashMap;

use async_trait::async_trait;
use orderbridge_core::CredentialVault;
use orderbridge_domain::{Integration, OrderBridgeError, Result};
use parking_lot::Mutex;

#[derive(Default)]
pub struct StaticVault {
    integrations: Mutex<HashMap<String, Integration>>,
    credentials: HashMap<(String, String), String>,
}

impl StaticVault {
    pub fn with_integration(self, integration: Integration) -> Self {
        self.integrations.lock().insert(integration.id.clone(), integration);
        self
    }

    pub fn with_credential(mut self, integration_id: &str, field: &str, value: &str) -> Self {
        self.credentials
            .insert((integration_id.to_string(), field.to_string()), value.to_string());
        self
    }
}

#[async_trait]
impl CredentialVault for StaticVault {
    async fn get_integration_by_id(&self, id: &str) -> Result<Integration> {
        self.integrations
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| OrderBridgeError::NotFound(format!("integration {id}")))
    }

    async fn decrypt_credential(&self, integration_id: &str, field: &str) -> Result<String> {
        self.credentials
            .get(&(integration_id.to_string(), field.to_string()))
            .cloned()
            .ok_or_else(|| OrderBridgeError::Config(format!("missing credential {field}")))
    }

    async fn update_integration_config(
        &self,
        integration_id: &str,
        config: serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        let mut integrations = self.integrations.lock();
        let integration = integrations
            .get_mut(integration_id)
            .ok_or_else(|| OrderBridgeError::NotFound(format!("integration {integration_id}")))?;
        integration.config = config;
        Ok(())
    }
}
