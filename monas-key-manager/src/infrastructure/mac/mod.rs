pub mod hmac_key_manager;

use std::sync::OnceLock;

use crate::application_service::registry::KeyManagerRegistry;
use crate::infrastructure::config::{ConfigError, KeyTypeEntry, RegistryConfig};

use hmac_key_manager::{HmacKeyManager, HMAC_KEY_TYPE};

/// Registers HMAC for both the `Mac` and the `Prf` primitive.
pub struct MacConfig;

impl MacConfig {
    pub const CONFIG_NAME: &'static str = "MAC";

    pub fn latest() -> &'static RegistryConfig {
        static LATEST: OnceLock<RegistryConfig> = OnceLock::new();
        LATEST.get_or_init(|| {
            RegistryConfig::new(
                Self::CONFIG_NAME,
                vec![
                    KeyTypeEntry::new("Mac", HMAC_KEY_TYPE, HmacKeyManager::VERSION, true),
                    KeyTypeEntry::new("Prf", HMAC_KEY_TYPE, HmacKeyManager::VERSION, true),
                ],
            )
        })
    }

    pub fn register(registry: &KeyManagerRegistry) -> Result<(), ConfigError> {
        Self::latest().register(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::primitive::{Mac, Prf};

    #[test]
    fn registers_hmac_for_mac_and_prf() {
        let registry = KeyManagerRegistry::new();
        MacConfig::register(&registry).unwrap();

        assert!(registry.get_key_manager::<Box<dyn Mac>>(HMAC_KEY_TYPE).is_ok());
        assert!(registry.get_key_manager::<Box<dyn Prf>>(HMAC_KEY_TYPE).is_ok());
        assert_eq!(registry.key_types(), vec![HMAC_KEY_TYPE.to_string()]);
    }
}
