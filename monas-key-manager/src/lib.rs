pub mod application_service;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod test_utils;

pub use application_service::registry::{KeyManagerRegistry, PrimitiveKind};
pub use domain::error::{KeyManagerError, KeyManagerResult};
pub use domain::key_data::{KeyData, KeyMaterialType};
pub use domain::key_manager::{KeyFactory, KeyManager, UntypedKeyManager};
pub use domain::key_type_manager::{
    validate_version, KeyFactoryImpl, KeyManagerImpl, KeyTypeManager, PrimitiveBuilder,
};
pub use domain::message::{KeyMessage, KeyRef, MessageRef};
pub use domain::primitive::{Aead, CryptoError, Mac, Prf, Primitive, PublicKeySign, PublicKeyVerify};
pub use infrastructure::aead::AeadConfig;
pub use infrastructure::config::{ConfigError, KeyTypeEntry, RegistryConfig};
pub use infrastructure::mac::MacConfig;
pub use infrastructure::signature::SignatureConfig;

/// Builds a registry populated from a TOML registry config file.
pub fn init_registry_from_file<P: AsRef<std::path::Path>>(
    config_path: P,
) -> Result<KeyManagerRegistry, ConfigError> {
    let config = RegistryConfig::from_file(config_path)?;
    let registry = KeyManagerRegistry::new();
    config.register(&registry)?;
    Ok(registry)
}

/// Builds a registry populated from a TOML registry config string.
pub fn init_registry_from_str(config_str: &str) -> Result<KeyManagerRegistry, ConfigError> {
    let config = RegistryConfig::from_toml_str(config_str)?;
    let registry = KeyManagerRegistry::new();
    config.register(&registry)?;
    Ok(registry)
}

/// Builds a registry with every built-in key type at its latest version.
pub fn init_registry_default() -> Result<KeyManagerRegistry, ConfigError> {
    let registry = KeyManagerRegistry::new();
    AeadConfig::register(&registry)?;
    MacConfig::register(&registry)?;
    SignatureConfig::register(&registry)?;
    Ok(registry)
}
