pub mod aes_gcm_key_manager;

use std::sync::OnceLock;

use crate::application_service::registry::KeyManagerRegistry;
use crate::infrastructure::config::{ConfigError, KeyTypeEntry, RegistryConfig};

use aes_gcm_key_manager::{AesGcmKeyManager, AES_GCM_KEY_TYPE};

/// Registers the AEAD key managers.
pub struct AeadConfig;

impl AeadConfig {
    pub const CONFIG_NAME: &'static str = "AEAD";

    pub fn latest() -> &'static RegistryConfig {
        static LATEST: OnceLock<RegistryConfig> = OnceLock::new();
        LATEST.get_or_init(|| {
            RegistryConfig::new(
                Self::CONFIG_NAME,
                vec![KeyTypeEntry::new(
                    "Aead",
                    AES_GCM_KEY_TYPE,
                    AesGcmKeyManager::VERSION,
                    true,
                )],
            )
        })
    }

    pub fn register(registry: &KeyManagerRegistry) -> Result<(), ConfigError> {
        Self::latest().register(registry)
    }
}
