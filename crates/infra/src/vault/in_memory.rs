//! Plaintext credential vault for development and tests
//!
//! Stores integration records and their secrets in memory without any
//! encryption. Production deployments plug a real vault in behind the same
//! port.

use std::collections::HashMap;

use async_trait::async_trait;
use orderbridge_core::ports::CredentialVault;
use orderbridge_domain::{Integration, OrderBridgeError, Result};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Default)]
pub struct InMemoryCredentialVault {
    integrations: RwLock<HashMap<String, Integration>>,
    credentials: RwLock<HashMap<(String, String), String>>,
}

impl InMemoryCredentialVault {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an integration record.
    pub fn insert_integration(&self, integration: Integration) {
        self.integrations.write().insert(integration.id.clone(), integration);
    }

    pub fn set_credential(
        &self,
        integration_id: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.credentials.write().insert((integration_id.into(), field.into()), value.into());
    }

    /// Current record for `id`, if any.
    #[must_use]
    pub fn integration(&self, id: &str) -> Option<Integration> {
        self.integrations.read().get(id).cloned()
    }
}

#[async_trait]
impl CredentialVault for InMemoryCredentialVault {
    async fn get_integration_by_id(&self, id: &str) -> Result<Integration> {
        self.integration(id)
            .ok_or_else(|| OrderBridgeError::NotFound(format!("integration {id} not found")))
    }

    async fn decrypt_credential(&self, integration_id: &str, field: &str) -> Result<String> {
        self.credentials
            .read()
            .get(&(integration_id.to_string(), field.to_string()))
            .cloned()
            .ok_or_else(|| {
                OrderBridgeError::Config(format!(
                    "integration {integration_id} has no stored credential '{field}'"
                ))
            })
    }

    async fn update_integration_config(
        &self,
        integration_id: &str,
        config: Map<String, Value>,
    ) -> Result<()> {
        let mut integrations = self.integrations.write();
        let integration = integrations.get_mut(integration_id).ok_or_else(|| {
            OrderBridgeError::NotFound(format!("integration {integration_id} not found"))
        })?;
        integration.config = config;
        debug!(integration_id, "integration config updated");
        Ok(())
    }
}
