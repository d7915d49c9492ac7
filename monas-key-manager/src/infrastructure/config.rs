//! Registry configuration: which built-in key managers to register, at which
//! version, and whether the registry may mint new keys with them.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application_service::registry::KeyManagerRegistry;
use crate::domain::error::KeyManagerError;
use crate::domain::key_type_manager::{KeyManagerImpl, PrimitiveBuilder};
use crate::domain::primitive::{Aead, Mac, Prf, Primitive, PublicKeySign, PublicKeyVerify};
use crate::infrastructure::aead::aes_gcm_key_manager::{AesGcmKeyManager, AES_GCM_KEY_TYPE};
use crate::infrastructure::mac::hmac_key_manager::{HmacKeyManager, HMAC_KEY_TYPE};
use crate::infrastructure::signature::ecdsa_key_manager::{
    EcdsaSignKeyManager, EcdsaVerifyKeyManager, ECDSA_PRIVATE_KEY_TYPE, ECDSA_PUBLIC_KEY_TYPE,
};
use crate::infrastructure::signature::ed25519_key_manager::{
    Ed25519SignKeyManager, Ed25519VerifyKeyManager, ED25519_PRIVATE_KEY_TYPE,
    ED25519_PUBLIC_KEY_TYPE,
};

/// A named list of registry entries.
///
/// ```toml
/// config_name = "AEAD"
///
/// [[entries]]
/// primitive_name = "Aead"
/// type_url = "type.monas.network/monas.crypto.AesGcmKey"
/// key_manager_version = 0
/// new_key_allowed = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub config_name: String,

    #[serde(default)]
    pub entries: Vec<KeyTypeEntry>,
}

/// One (key type, primitive) pair to register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTypeEntry {
    /// `Primitive::NAME` of the primitive to register, e.g. "Aead".
    pub primitive_name: String,

    pub type_url: String,

    /// Minimum manager version the entry needs.
    #[serde(default)]
    pub key_manager_version: u32,

    #[serde(default = "default_new_key_allowed")]
    pub new_key_allowed: bool,
}

fn default_new_key_allowed() -> bool {
    true
}

impl KeyTypeEntry {
    pub fn new(
        primitive_name: impl Into<String>,
        type_url: impl Into<String>,
        key_manager_version: u32,
        new_key_allowed: bool,
    ) -> Self {
        Self {
            primitive_name: primitive_name.into(),
            type_url: type_url.into(),
            key_manager_version,
            new_key_allowed,
        }
    }
}

impl RegistryConfig {
    pub fn new(config_name: impl Into<String>, entries: Vec<KeyTypeEntry>) -> Self {
        Self {
            config_name: config_name.into(),
            entries,
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;

        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self.to_toml_string()?;

        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Registers the built-in manager of every entry, in order.
    ///
    /// Stops at the first failing entry; entries before it stay registered.
    pub fn register(&self, registry: &KeyManagerRegistry) -> Result<(), ConfigError> {
        for entry in &self.entries {
            register_entry(registry, entry)?;
        }
        tracing::debug!(
            config = %self.config_name,
            entries = self.entries.len(),
            "registered key managers from config"
        );
        Ok(())
    }
}

fn is<P: Primitive>(primitive_name: &str) -> bool {
    primitive_name == P::NAME
}

fn register_entry(registry: &KeyManagerRegistry, entry: &KeyTypeEntry) -> Result<(), ConfigError> {
    let primitive = entry.primitive_name.as_str();
    match entry.type_url.as_str() {
        AES_GCM_KEY_TYPE if is::<Box<dyn Aead>>(primitive) => {
            register_built_in::<_, Box<dyn Aead>>(registry, entry, AesGcmKeyManager)
        }
        HMAC_KEY_TYPE if is::<Box<dyn Mac>>(primitive) => {
            register_built_in::<_, Box<dyn Mac>>(registry, entry, HmacKeyManager)
        }
        HMAC_KEY_TYPE if is::<Box<dyn Prf>>(primitive) => {
            register_built_in::<_, Box<dyn Prf>>(registry, entry, HmacKeyManager)
        }
        ECDSA_PRIVATE_KEY_TYPE if is::<Box<dyn PublicKeySign>>(primitive) => {
            register_built_in::<_, Box<dyn PublicKeySign>>(registry, entry, EcdsaSignKeyManager)
        }
        ECDSA_PUBLIC_KEY_TYPE if is::<Box<dyn PublicKeyVerify>>(primitive) => {
            register_built_in::<_, Box<dyn PublicKeyVerify>>(registry, entry, EcdsaVerifyKeyManager)
        }
        ED25519_PRIVATE_KEY_TYPE if is::<Box<dyn PublicKeySign>>(primitive) => {
            register_built_in::<_, Box<dyn PublicKeySign>>(registry, entry, Ed25519SignKeyManager)
        }
        ED25519_PUBLIC_KEY_TYPE if is::<Box<dyn PublicKeyVerify>>(primitive) => {
            register_built_in::<_, Box<dyn PublicKeyVerify>>(
                registry,
                entry,
                Ed25519VerifyKeyManager,
            )
        }
        _ => Err(ConfigError::UnknownKeyType {
            type_url: entry.type_url.clone(),
            primitive_name: entry.primitive_name.clone(),
        }),
    }
}

fn register_built_in<M, P>(
    registry: &KeyManagerRegistry,
    entry: &KeyTypeEntry,
    manager: M,
) -> Result<(), ConfigError>
where
    M: PrimitiveBuilder<P>,
    P: Primitive,
{
    if entry.key_manager_version > manager.version() {
        return Err(ConfigError::UnsupportedVersion {
            type_url: entry.type_url.clone(),
            requested: entry.key_manager_version,
            available: manager.version(),
        });
    }
    registry.register_key_manager(KeyManagerImpl::<M, P>::new(manager), entry.new_key_allowed)?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("no built-in {primitive_name} manager for {type_url}")]
    UnknownKeyType {
        type_url: String,
        primitive_name: String,
    },

    #[error("{type_url} needs manager version {requested}, built-in is version {available}")]
    UnsupportedVersion {
        type_url: String,
        requested: u32,
        available: u32,
    },

    #[error(transparent)]
    Registration(#[from] KeyManagerError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::key_manager::UntypedKeyManager;
    use crate::domain::message::MessageRef;
    use crate::infrastructure::aead::aes_gcm_key_manager::AesGcmKeyFormat;

    const AEAD_CONFIG: &str = r#"
config_name = "AEAD"

[[entries]]
primitive_name = "Aead"
type_url = "type.monas.network/monas.crypto.AesGcmKey"
key_manager_version = 0
"#;

    #[test]
    fn parses_entries_with_defaults() {
        let config = RegistryConfig::from_toml_str(AEAD_CONFIG).unwrap();
        assert_eq!(config.config_name, "AEAD");
        assert_eq!(
            config.entries,
            vec![KeyTypeEntry::new("Aead", AES_GCM_KEY_TYPE, 0, true)]
        );
    }

    #[test]
    fn written_config_parses_back() {
        let config = RegistryConfig::new(
            "custom",
            vec![
                KeyTypeEntry::new("Mac", HMAC_KEY_TYPE, 0, false),
                KeyTypeEntry::new("Prf", HMAC_KEY_TYPE, 0, true),
            ],
        );
        let toml = config.to_toml_string().unwrap();
        assert!(toml.contains("[[entries]]"));
        assert_eq!(RegistryConfig::from_toml_str(&toml).unwrap(), config);
    }

    #[test]
    fn saved_file_loads_back() {
        let config = RegistryConfig::new(
            "saved",
            vec![KeyTypeEntry::new("Aead", AES_GCM_KEY_TYPE, 0, false)],
        );
        let file = tempfile::NamedTempFile::new().unwrap();
        config.to_file(file.path()).unwrap();
        assert_eq!(RegistryConfig::from_file(file.path()).unwrap(), config);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = RegistryConfig::from_toml_str("config_name = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = RegistryConfig::from_file("/nonexistent/monas/registry.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn registers_entries_into_the_registry() {
        let registry = KeyManagerRegistry::new();
        RegistryConfig::from_toml_str(AEAD_CONFIG)
            .unwrap()
            .register(&registry)
            .unwrap();

        let manager = registry.get_key_manager::<Box<dyn Aead>>(AES_GCM_KEY_TYPE).unwrap();
        assert!(manager.does_support(AES_GCM_KEY_TYPE));
        assert!(registry.is_new_key_allowed(AES_GCM_KEY_TYPE));
    }

    #[test]
    fn pinned_entry_closes_the_generation_gate() {
        let registry = KeyManagerRegistry::new();
        RegistryConfig::new("pinned", vec![KeyTypeEntry::new("Aead", AES_GCM_KEY_TYPE, 0, false)])
            .register(&registry)
            .unwrap();

        let format = AesGcmKeyFormat { key_size: 32 };
        let result = registry.new_key_data(AES_GCM_KEY_TYPE, MessageRef::typed(&format));
        assert!(matches!(result, Err(KeyManagerError::GenerationDisabled(_))));
    }

    #[test]
    fn unknown_pair_is_rejected() {
        let registry = KeyManagerRegistry::new();
        let config = RegistryConfig::new(
            "bad",
            vec![KeyTypeEntry::new("Mac", AES_GCM_KEY_TYPE, 0, true)],
        );
        assert!(matches!(
            config.register(&registry),
            Err(ConfigError::UnknownKeyType { .. })
        ));
        assert!(registry.key_types().is_empty());
    }

    #[test]
    fn newer_version_than_built_in_is_rejected() {
        let registry = KeyManagerRegistry::new();
        let config = RegistryConfig::new(
            "future",
            vec![KeyTypeEntry::new("Aead", AES_GCM_KEY_TYPE, 1, true)],
        );
        assert_eq!(
            config.register(&registry),
            Err(ConfigError::UnsupportedVersion {
                type_url: AES_GCM_KEY_TYPE.to_string(),
                requested: 1,
                available: 0,
            })
        );
    }

    #[test]
    fn registration_stops_at_first_failure() {
        let registry = KeyManagerRegistry::new();
        let config = RegistryConfig::new(
            "partial",
            vec![
                KeyTypeEntry::new("Aead", AES_GCM_KEY_TYPE, 0, false),
                KeyTypeEntry::new("Aead", AES_GCM_KEY_TYPE, 0, true),
                KeyTypeEntry::new("Mac", HMAC_KEY_TYPE, 0, true),
            ],
        );

        assert!(matches!(
            config.register(&registry),
            Err(ConfigError::Registration(KeyManagerError::Registration(_)))
        ));
        assert_eq!(registry.key_types(), vec![AES_GCM_KEY_TYPE.to_string()]);
    }
}
