//! Port interface for integration records and their secrets

use async_trait::async_trait;
use orderbridge_domain::{Integration, Result};

/// Read access to integrations plus decryption of their stored secrets.
#[async_trait]
pub trait CredentialVault: Send + Sync {
    /// # Errors
    /// `OrderBridgeError::NotFound` when no integration has this id.
    async fn get_integration_by_id(&self, id: &str) -> Result<Integration>;

    /// Plaintext value of an encrypted credential field.
    ///
    /// # Errors
    /// `OrderBridgeError::Config` when the field is not stored.
    async fn decrypt_credential(&self, integration_id: &str, field: &str) -> Result<String>;

    /// Replace the integration's non-secret config map. Used to persist
    /// rotated refresh tokens.
    async fn update_integration_config(
        &self,
        integration_id: &str,
        config: serde_json::Map<String, serde_json::Value>,
    ) -> Result<()>;
}
