use std::fmt;

use hmac::digest::KeyInit;
use hmac::Hmac;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha512};
use zeroize::{Zeroize, Zeroizing};

use crate::domain::error::{KeyManagerError, KeyManagerResult};
use crate::domain::key_data::KeyMaterialType;
use crate::domain::key_type_manager::{validate_version, KeyTypeManager, PrimitiveBuilder};
use crate::domain::primitive::{CryptoError, Mac, Prf};
use crate::infrastructure::random::random_bytes;

pub const HMAC_KEY_TYPE: &str = "type.monas.network/monas.crypto.HmacKey";

const MIN_KEY_SIZE: usize = 16;
const MAX_KEY_SIZE: usize = 64;
const MIN_TAG_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashType {
    Sha256,
    Sha512,
}

impl HashType {
    pub fn digest_size(self) -> usize {
        match self {
            HashType::Sha256 => 32,
            HashType::Sha512 => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HmacParams {
    pub hash: HashType,
    /// Length in bytes of the tags produced by the `Mac` primitive.
    pub tag_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HmacKeyFormat {
    pub params: HmacParams,
    pub key_size: u32,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HmacKey {
    pub version: u32,
    pub params: HmacParams,
    pub key_value: Vec<u8>,
}

impl fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacKey")
            .field("version", &self.version)
            .field("params", &self.params)
            .field("key_value", &format_args!("<{} bytes redacted>", self.key_value.len()))
            .finish()
    }
}

impl Drop for HmacKey {
    fn drop(&mut self) {
        self.key_value.zeroize();
    }
}

fn check_params(params: &HmacParams) -> Result<(), String> {
    let max = params.hash.digest_size() as u32;
    if params.tag_size < MIN_TAG_SIZE || params.tag_size > max {
        return Err(format!(
            "tag size {} outside {MIN_TAG_SIZE}..={max} for {:?}",
            params.tag_size, params.hash
        ));
    }
    Ok(())
}

/// HMAC keys backing both the [`Mac`] and the [`Prf`] primitive.
#[derive(Debug, Default, Clone, Copy)]
pub struct HmacKeyManager;

impl HmacKeyManager {
    pub const VERSION: u32 = 0;
}

impl KeyTypeManager for HmacKeyManager {
    type Key = HmacKey;
    type KeyFormat = HmacKeyFormat;

    fn key_type(&self) -> &'static str {
        HMAC_KEY_TYPE
    }

    fn version(&self) -> u32 {
        Self::VERSION
    }

    fn key_material_type(&self) -> KeyMaterialType {
        KeyMaterialType::Symmetric
    }

    fn validate_key(&self, key: &HmacKey) -> KeyManagerResult<()> {
        validate_version(key.version, Self::VERSION)?;
        if key.key_value.len() < MIN_KEY_SIZE {
            return Err(KeyManagerError::CorruptedKey(format!(
                "HMAC key must be at least {MIN_KEY_SIZE} bytes"
            )));
        }
        check_params(&key.params).map_err(KeyManagerError::CorruptedKey)
    }

    fn validate_key_format(&self, key_format: &HmacKeyFormat) -> KeyManagerResult<()> {
        let key_size = key_format.key_size as usize;
        if !(MIN_KEY_SIZE..=MAX_KEY_SIZE).contains(&key_size) {
            return Err(KeyManagerError::Generation(format!(
                "HMAC key size {key_size} outside {MIN_KEY_SIZE}..={MAX_KEY_SIZE}"
            )));
        }
        check_params(&key_format.params).map_err(KeyManagerError::Generation)
    }

    fn create_key(&self, key_format: &HmacKeyFormat) -> KeyManagerResult<HmacKey> {
        let key_value = random_bytes(key_format.key_size as usize)?;
        Ok(HmacKey {
            version: Self::VERSION,
            params: key_format.params,
            key_value: key_value.to_vec(),
        })
    }
}

impl PrimitiveBuilder<Box<dyn Mac>> for HmacKeyManager {
    fn build_primitive(&self, key: &HmacKey) -> KeyManagerResult<Box<dyn Mac>> {
        Ok(Box::new(HmacMac {
            key: Zeroizing::new(key.key_value.clone()),
            hash: key.params.hash,
            tag_size: key.params.tag_size as usize,
        }))
    }
}

impl PrimitiveBuilder<Box<dyn Prf>> for HmacKeyManager {
    fn build_primitive(&self, key: &HmacKey) -> KeyManagerResult<Box<dyn Prf>> {
        Ok(Box::new(HmacPrf {
            key: Zeroizing::new(key.key_value.clone()),
            hash: key.params.hash,
        }))
    }
}

fn full_tag<M>(key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    M: hmac::Mac + KeyInit,
{
    let mut mac = <M as KeyInit>::new_from_slice(key)
        .map_err(|_| CryptoError::InvalidParameter("HMAC key".to_string()))?;
    hmac::Mac::update(&mut mac, data);
    Ok(hmac::Mac::finalize(mac).into_bytes().to_vec())
}

fn verify_prefix<M>(key: &[u8], tag: &[u8], data: &[u8]) -> Result<(), CryptoError>
where
    M: hmac::Mac + KeyInit,
{
    let mut mac = <M as KeyInit>::new_from_slice(key).map_err(|_| CryptoError::Verification)?;
    hmac::Mac::update(&mut mac, data);
    hmac::Mac::verify_truncated_left(mac, tag).map_err(|_| CryptoError::Verification)
}

fn compute_full(hash: HashType, key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    match hash {
        HashType::Sha256 => full_tag::<Hmac<Sha256>>(key, data),
        HashType::Sha512 => full_tag::<Hmac<Sha512>>(key, data),
    }
}

/// Truncated HMAC.
pub struct HmacMac {
    key: Zeroizing<Vec<u8>>,
    hash: HashType,
    tag_size: usize,
}

impl Mac for HmacMac {
    fn compute_mac(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut tag = compute_full(self.hash, &self.key, data)?;
        tag.truncate(self.tag_size);
        Ok(tag)
    }

    fn verify_mac(&self, mac: &[u8], data: &[u8]) -> Result<(), CryptoError> {
        if mac.len() != self.tag_size {
            return Err(CryptoError::Verification);
        }
        // constant-time comparison of the leading tag_size bytes
        match self.hash {
            HashType::Sha256 => verify_prefix::<Hmac<Sha256>>(&self.key, mac, data),
            HashType::Sha512 => verify_prefix::<Hmac<Sha512>>(&self.key, mac, data),
        }
    }
}

/// HMAC as a PRF; outputs are prefixes of the full HMAC.
pub struct HmacPrf {
    key: Zeroizing<Vec<u8>>,
    hash: HashType,
}

impl Prf for HmacPrf {
    fn compute(&self, input: &[u8], output_length: usize) -> Result<Vec<u8>, CryptoError> {
        if output_length > self.hash.digest_size() {
            return Err(CryptoError::InvalidParameter(format!(
                "PRF output of {output_length} bytes exceeds {} for {:?}",
                self.hash.digest_size(),
                self.hash
            )));
        }
        let mut output = compute_full(self.hash, &self.key, input)?;
        output.truncate(output_length);
        Ok(output)
    }
}
