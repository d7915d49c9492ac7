use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::domain::error::{KeyManagerError, KeyManagerResult};
use crate::domain::key_data::{KeyData, KeyMaterialType};
use crate::domain::key_type_manager::{validate_version, KeyTypeManager, PrimitiveBuilder};
use crate::domain::primitive::{CryptoError, PublicKeySign, PublicKeyVerify};
use crate::infrastructure::codec;
use crate::infrastructure::random::random_bytes;

pub const ED25519_PRIVATE_KEY_TYPE: &str = "type.monas.network/monas.crypto.Ed25519PrivateKey";
pub const ED25519_PUBLIC_KEY_TYPE: &str = "type.monas.network/monas.crypto.Ed25519PublicKey";

const KEY_SIZE: usize = 32;

/// Ed25519 has no parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ed25519KeyFormat {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ed25519PublicKey {
    pub version: u32,
    pub key_value: Vec<u8>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ed25519PrivateKey {
    pub version: u32,
    pub public_key: Ed25519PublicKey,
    /// 32-byte seed.
    pub key_value: Vec<u8>,
}

impl fmt::Debug for Ed25519PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519PrivateKey")
            .field("version", &self.version)
            .field("public_key", &self.public_key)
            .field("key_value", &format_args!("<{} bytes redacted>", self.key_value.len()))
            .finish()
    }
}

impl Drop for Ed25519PrivateKey {
    fn drop(&mut self) {
        self.key_value.zeroize();
    }
}

fn signing_key(seed: &[u8]) -> Result<SigningKey, String> {
    let seed: Zeroizing<[u8; KEY_SIZE]> = Zeroizing::new(
        seed.try_into()
            .map_err(|_| format!("Ed25519 seed must be {KEY_SIZE} bytes"))?,
    );
    Ok(SigningKey::from_bytes(&seed))
}

fn verifying_key(key_value: &[u8]) -> Result<VerifyingKey, String> {
    let bytes: [u8; KEY_SIZE] = key_value
        .try_into()
        .map_err(|_| format!("Ed25519 public key must be {KEY_SIZE} bytes"))?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| "invalid Ed25519 public key".to_string())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519SignKeyManager;

impl Ed25519SignKeyManager {
    pub const VERSION: u32 = 0;
}

impl KeyTypeManager for Ed25519SignKeyManager {
    type Key = Ed25519PrivateKey;
    type KeyFormat = Ed25519KeyFormat;

    fn key_type(&self) -> &'static str {
        ED25519_PRIVATE_KEY_TYPE
    }

    fn version(&self) -> u32 {
        Self::VERSION
    }

    fn key_material_type(&self) -> KeyMaterialType {
        KeyMaterialType::AsymmetricPrivate
    }

    fn validate_key(&self, key: &Ed25519PrivateKey) -> KeyManagerResult<()> {
        validate_version(key.version, Self::VERSION)?;
        Ed25519VerifyKeyManager.validate_key(&key.public_key)?;

        let signing_key = signing_key(&key.key_value).map_err(KeyManagerError::CorruptedKey)?;
        if signing_key.verifying_key().as_bytes() != key.public_key.key_value.as_slice() {
            return Err(KeyManagerError::CorruptedKey(
                "public key does not match the private key".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_key_format(&self, _key_format: &Ed25519KeyFormat) -> KeyManagerResult<()> {
        Ok(())
    }

    fn create_key(&self, _key_format: &Ed25519KeyFormat) -> KeyManagerResult<Ed25519PrivateKey> {
        let seed = random_bytes(KEY_SIZE)?;
        let signing_key = signing_key(&seed).map_err(KeyManagerError::Generation)?;

        Ok(Ed25519PrivateKey {
            version: Self::VERSION,
            public_key: Ed25519PublicKey {
                version: Ed25519VerifyKeyManager::VERSION,
                key_value: signing_key.verifying_key().to_bytes().to_vec(),
            },
            key_value: seed.to_vec(),
        })
    }

    fn public_key_data(&self, key: &Ed25519PrivateKey) -> KeyManagerResult<KeyData> {
        let value = codec::encode(&key.public_key)
            .map_err(|e| KeyManagerError::CorruptedKey(format!("cannot encode public key: {e}")))?;
        Ok(KeyData::new(
            ED25519_PUBLIC_KEY_TYPE,
            value,
            KeyMaterialType::AsymmetricPublic,
        ))
    }
}

impl PrimitiveBuilder<Box<dyn PublicKeySign>> for Ed25519SignKeyManager {
    fn build_primitive(&self, key: &Ed25519PrivateKey) -> KeyManagerResult<Box<dyn PublicKeySign>> {
        let signing_key = signing_key(&key.key_value).map_err(KeyManagerError::Primitive)?;
        Ok(Box::new(Ed25519Signer { signing_key }))
    }
}

/// Public Ed25519 keys come only from private keys; the factory never generates.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519VerifyKeyManager;

impl Ed25519VerifyKeyManager {
    pub const VERSION: u32 = 0;
}

impl KeyTypeManager for Ed25519VerifyKeyManager {
    type Key = Ed25519PublicKey;
    type KeyFormat = Ed25519KeyFormat;

    fn key_type(&self) -> &'static str {
        ED25519_PUBLIC_KEY_TYPE
    }

    fn version(&self) -> u32 {
        Self::VERSION
    }

    fn key_material_type(&self) -> KeyMaterialType {
        KeyMaterialType::AsymmetricPublic
    }

    fn validate_key(&self, key: &Ed25519PublicKey) -> KeyManagerResult<()> {
        validate_version(key.version, Self::VERSION)?;
        verifying_key(&key.key_value)
            .map(|_| ())
            .map_err(KeyManagerError::CorruptedKey)
    }

    fn validate_key_format(&self, _key_format: &Ed25519KeyFormat) -> KeyManagerResult<()> {
        Err(KeyManagerError::Generation(
            "Ed25519 public keys are derived from private keys".to_string(),
        ))
    }

    fn create_key(&self, key_format: &Ed25519KeyFormat) -> KeyManagerResult<Ed25519PublicKey> {
        self.validate_key_format(key_format)?;
        Err(KeyManagerError::Generation(
            "Ed25519 public keys are derived from private keys".to_string(),
        ))
    }
}

impl PrimitiveBuilder<Box<dyn PublicKeyVerify>> for Ed25519VerifyKeyManager {
    fn build_primitive(&self, key: &Ed25519PublicKey) -> KeyManagerResult<Box<dyn PublicKeyVerify>> {
        let verifying_key = verifying_key(&key.key_value).map_err(KeyManagerError::Primitive)?;
        Ok(Box::new(Ed25519Verifier { verifying_key }))
    }
}

pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl PublicKeySign for Ed25519Signer {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let signature = self
            .signing_key
            .try_sign(data)
            .map_err(|_| CryptoError::Signing)?;
        Ok(signature.to_bytes().to_vec())
    }
}

pub struct Ed25519Verifier {
    verifying_key: VerifyingKey,
}

impl PublicKeyVerify for Ed25519Verifier {
    fn verify(&self, signature: &[u8], data: &[u8]) -> Result<(), CryptoError> {
        let signature = Signature::from_slice(signature).map_err(|_| CryptoError::Verification)?;
        self.verifying_key
            .verify_strict(data, &signature)
            .map_err(|_| CryptoError::Verification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::key_manager::{KeyManager, UntypedKeyManager};
    use crate::domain::key_type_manager::KeyManagerImpl;
    use crate::domain::message::{KeyRef, MessageRef};

    fn sign_manager() -> KeyManagerImpl<Ed25519SignKeyManager, Box<dyn PublicKeySign>> {
        KeyManagerImpl::new(Ed25519SignKeyManager)
    }

    fn verify_manager() -> KeyManagerImpl<Ed25519VerifyKeyManager, Box<dyn PublicKeyVerify>> {
        KeyManagerImpl::new(Ed25519VerifyKeyManager)
    }

    fn new_private_key_data() -> KeyData {
        let format = codec::encode(&Ed25519KeyFormat::default()).unwrap();
        sign_manager().key_factory().new_key_data(&format).unwrap()
    }

    #[test]
    fn sign_and_verify() {
        let private = new_private_key_data();
        let public = sign_manager().public_key_data(&private).unwrap();

        let signer = sign_manager().primitive(KeyRef::from(&private)).unwrap();
        let verifier = verify_manager().primitive(KeyRef::from(&public)).unwrap();

        let signature = signer.sign(b"hello").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verifier.verify(&signature, b"hello").is_ok());
        assert_eq!(verifier.verify(&signature, b"tampered"), Err(CryptoError::Verification));
        assert_eq!(verifier.verify(&signature[..63], b"hello"), Err(CryptoError::Verification));
    }

    #[test]
    fn signatures_are_deterministic() {
        let signer = sign_manager()
            .primitive(KeyRef::from(&new_private_key_data()))
            .unwrap();
        assert_eq!(signer.sign(b"same").unwrap(), signer.sign(b"same").unwrap());
    }

    #[test]
    fn generated_seeds_differ() {
        let a: Ed25519PrivateKey = codec::decode_key(new_private_key_data().value()).unwrap();
        let b: Ed25519PrivateKey = codec::decode_key(new_private_key_data().value()).unwrap();
        assert_ne!(a.public_key, b.public_key);
    }

    #[test]
    fn short_seed_is_corrupted() {
        let mut key: Ed25519PrivateKey =
            codec::decode_key(new_private_key_data().value()).unwrap();
        key.key_value.truncate(16);
        assert!(matches!(
            sign_manager().primitive(KeyRef::typed(&key)),
            Err(KeyManagerError::CorruptedKey(_))
        ));
    }

    #[test]
    fn public_key_factory_refuses_to_generate() {
        let format = Ed25519KeyFormat::default();
        assert!(matches!(
            verify_manager().key_factory().new_key(MessageRef::typed(&format)),
            Err(KeyManagerError::Generation(_))
        ));
    }

    #[test]
    fn debug_output_hides_the_seed() {
        let key: Ed25519PrivateKey = codec::decode_key(new_private_key_data().value()).unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains("32 bytes redacted"));
    }
}
