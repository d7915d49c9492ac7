use std::fmt;

use aes_gcm::aead::{Aead as _, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::domain::error::{KeyManagerError, KeyManagerResult};
use crate::domain::key_data::KeyMaterialType;
use crate::domain::key_type_manager::{validate_version, KeyTypeManager, PrimitiveBuilder};
use crate::domain::primitive::{Aead, CryptoError};
use crate::infrastructure::random::{fill_random, random_bytes};

pub const AES_GCM_KEY_TYPE: &str = "type.monas.network/monas.crypto.AesGcmKey";

const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AesGcmKeyFormat {
    /// Key length in bytes: 16 or 32.
    pub key_size: u32,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AesGcmKey {
    pub version: u32,
    pub key_value: Vec<u8>,
}

impl fmt::Debug for AesGcmKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcmKey")
            .field("version", &self.version)
            .field("key_value", &format_args!("<{} bytes redacted>", self.key_value.len()))
            .finish()
    }
}

impl Drop for AesGcmKey {
    fn drop(&mut self) {
        self.key_value.zeroize();
    }
}

fn is_supported_key_size(size: usize) -> bool {
    size == 16 || size == 32
}

/// AES-GCM keys backing the [`Aead`] primitive.
#[derive(Debug, Default, Clone, Copy)]
pub struct AesGcmKeyManager;

impl AesGcmKeyManager {
    pub const VERSION: u32 = 0;
}

impl KeyTypeManager for AesGcmKeyManager {
    type Key = AesGcmKey;
    type KeyFormat = AesGcmKeyFormat;

    fn key_type(&self) -> &'static str {
        AES_GCM_KEY_TYPE
    }

    fn version(&self) -> u32 {
        Self::VERSION
    }

    fn key_material_type(&self) -> KeyMaterialType {
        KeyMaterialType::Symmetric
    }

    fn validate_key(&self, key: &AesGcmKey) -> KeyManagerResult<()> {
        validate_version(key.version, Self::VERSION)?;
        if !is_supported_key_size(key.key_value.len()) {
            return Err(KeyManagerError::CorruptedKey(format!(
                "AES-GCM key must be 16 or 32 bytes, got {}",
                key.key_value.len()
            )));
        }
        Ok(())
    }

    fn validate_key_format(&self, key_format: &AesGcmKeyFormat) -> KeyManagerResult<()> {
        if !is_supported_key_size(key_format.key_size as usize) {
            return Err(KeyManagerError::Generation(format!(
                "unsupported AES-GCM key size {}",
                key_format.key_size
            )));
        }
        Ok(())
    }

    fn create_key(&self, key_format: &AesGcmKeyFormat) -> KeyManagerResult<AesGcmKey> {
        let key_value = random_bytes(key_format.key_size as usize)?;
        Ok(AesGcmKey {
            version: Self::VERSION,
            key_value: key_value.to_vec(),
        })
    }
}

impl PrimitiveBuilder<Box<dyn Aead>> for AesGcmKeyManager {
    fn build_primitive(&self, key: &AesGcmKey) -> KeyManagerResult<Box<dyn Aead>> {
        let cipher = AesGcmCipher::new(&key.key_value)
            .map_err(|e| KeyManagerError::Primitive(e.to_string()))?;
        Ok(Box::new(cipher))
    }
}

enum GcmCipher {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

/// AES-GCM with a random 96-bit nonce.
///
/// Ciphertexts are laid out as `nonce || ciphertext || tag`.
pub struct AesGcmCipher {
    cipher: GcmCipher,
}

impl AesGcmCipher {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let invalid = |_| CryptoError::InvalidParameter(format!("AES key of {} bytes", key.len()));
        let cipher = match key.len() {
            16 => GcmCipher::Aes128(Aes128Gcm::new_from_slice(key).map_err(invalid)?),
            32 => GcmCipher::Aes256(Aes256Gcm::new_from_slice(key).map_err(invalid)?),
            len => {
                return Err(CryptoError::InvalidParameter(format!(
                    "AES key of {len} bytes"
                )))
            }
        };
        Ok(Self { cipher })
    }
}

impl Aead for AesGcmCipher {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        fill_random(&mut nonce_bytes).map_err(|_| CryptoError::Encrypting)?;
        let nonce = Nonce::from_slice(&nonce_bytes);
        let payload = Payload {
            msg: plaintext,
            aad: associated_data,
        };

        let sealed = match &self.cipher {
            GcmCipher::Aes128(cipher) => cipher.encrypt(nonce, payload),
            GcmCipher::Aes256(cipher) => cipher.encrypt(nonce, payload),
        }
        .map_err(|_| CryptoError::Encrypting)?;

        let mut result = Vec::with_capacity(NONCE_SIZE + sealed.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&sealed);
        Ok(result)
    }

    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::InvalidFormat);
        }
        let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);
        let payload = Payload {
            msg: sealed,
            aad: associated_data,
        };

        match &self.cipher {
            GcmCipher::Aes128(cipher) => cipher.decrypt(nonce, payload),
            GcmCipher::Aes256(cipher) => cipher.decrypt(nonce, payload),
        }
        .map_err(|_| CryptoError::Decrypting)
    }
}
