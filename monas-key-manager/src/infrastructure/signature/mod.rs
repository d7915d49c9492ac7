pub mod ecdsa_key_manager;
pub mod ed25519_key_manager;

use std::sync::OnceLock;

use crate::application_service::registry::KeyManagerRegistry;
use crate::infrastructure::config::{ConfigError, KeyTypeEntry, RegistryConfig};

use ecdsa_key_manager::{
    EcdsaSignKeyManager, EcdsaVerifyKeyManager, ECDSA_PRIVATE_KEY_TYPE, ECDSA_PUBLIC_KEY_TYPE,
};
use ed25519_key_manager::{
    Ed25519SignKeyManager, Ed25519VerifyKeyManager, ED25519_PRIVATE_KEY_TYPE,
    ED25519_PUBLIC_KEY_TYPE,
};

/// Registers the signing managers for private keys and the verifying
/// managers for the matching public keys.
pub struct SignatureConfig;

impl SignatureConfig {
    pub const CONFIG_NAME: &'static str = "SIGNATURE";

    pub fn latest() -> &'static RegistryConfig {
        static LATEST: OnceLock<RegistryConfig> = OnceLock::new();
        LATEST.get_or_init(|| {
            RegistryConfig::new(
                Self::CONFIG_NAME,
                vec![
                    KeyTypeEntry::new(
                        "PublicKeySign",
                        ECDSA_PRIVATE_KEY_TYPE,
                        EcdsaSignKeyManager::VERSION,
                        true,
                    ),
                    KeyTypeEntry::new(
                        "PublicKeyVerify",
                        ECDSA_PUBLIC_KEY_TYPE,
                        EcdsaVerifyKeyManager::VERSION,
                        true,
                    ),
                    KeyTypeEntry::new(
                        "PublicKeySign",
                        ED25519_PRIVATE_KEY_TYPE,
                        Ed25519SignKeyManager::VERSION,
                        true,
                    ),
                    KeyTypeEntry::new(
                        "PublicKeyVerify",
                        ED25519_PUBLIC_KEY_TYPE,
                        Ed25519VerifyKeyManager::VERSION,
                        true,
                    ),
                ],
            )
        })
    }

    pub fn register(registry: &KeyManagerRegistry) -> Result<(), ConfigError> {
        Self::latest().register(registry)
    }
}
