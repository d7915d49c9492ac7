//! ECDSA over NIST P-256 and secp256k1, both with SHA-256.
//!
//! Private keys hold the 32-byte secret scalar together with their public
//! key; public keys hold the SEC1 uncompressed point.

use std::fmt;

use p256::ecdsa::signature::{Signer, Verifier};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::domain::error::{KeyManagerError, KeyManagerResult};
use crate::domain::key_data::{KeyData, KeyMaterialType};
use crate::domain::key_type_manager::{validate_version, KeyTypeManager, PrimitiveBuilder};
use crate::domain::primitive::{CryptoError, PublicKeySign, PublicKeyVerify};
use crate::infrastructure::codec;

pub const ECDSA_PRIVATE_KEY_TYPE: &str = "type.monas.network/monas.crypto.EcdsaPrivateKey";
pub const ECDSA_PUBLIC_KEY_TYPE: &str = "type.monas.network/monas.crypto.EcdsaPublicKey";

const SECRET_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EllipticCurve {
    NistP256,
    Secp256k1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureEncoding {
    Der,
    /// Fixed-width `r || s`.
    IeeeP1363,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EcdsaParams {
    pub curve: EllipticCurve,
    pub encoding: SignatureEncoding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EcdsaKeyFormat {
    pub params: EcdsaParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EcdsaPublicKey {
    pub version: u32,
    pub params: EcdsaParams,
    /// SEC1 uncompressed point.
    pub point: Vec<u8>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EcdsaPrivateKey {
    pub version: u32,
    pub public_key: EcdsaPublicKey,
    pub key_value: Vec<u8>,
}

impl fmt::Debug for EcdsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdsaPrivateKey")
            .field("version", &self.version)
            .field("public_key", &self.public_key)
            .field("key_value", &format_args!("<{} bytes redacted>", self.key_value.len()))
            .finish()
    }
}

impl Drop for EcdsaPrivateKey {
    fn drop(&mut self) {
        self.key_value.zeroize();
    }
}

enum EcdsaSigningKey {
    NistP256(p256::ecdsa::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

impl EcdsaSigningKey {
    fn from_slice(curve: EllipticCurve, secret: &[u8]) -> Result<Self, String> {
        match curve {
            EllipticCurve::NistP256 => p256::ecdsa::SigningKey::from_slice(secret)
                .map(EcdsaSigningKey::NistP256)
                .map_err(|_| "invalid P-256 secret scalar".to_string()),
            EllipticCurve::Secp256k1 => k256::ecdsa::SigningKey::from_slice(secret)
                .map(EcdsaSigningKey::Secp256k1)
                .map_err(|_| "invalid secp256k1 secret scalar".to_string()),
        }
    }

    fn random(curve: EllipticCurve) -> Self {
        match curve {
            EllipticCurve::NistP256 => {
                EcdsaSigningKey::NistP256(p256::ecdsa::SigningKey::random(&mut OsRng))
            }
            EllipticCurve::Secp256k1 => {
                EcdsaSigningKey::Secp256k1(k256::ecdsa::SigningKey::random(&mut OsRng))
            }
        }
    }

    fn secret_bytes(&self) -> Zeroizing<Vec<u8>> {
        match self {
            EcdsaSigningKey::NistP256(key) => take_secret(&mut key.to_bytes()),
            EcdsaSigningKey::Secp256k1(key) => take_secret(&mut key.to_bytes()),
        }
    }

    fn public_point(&self) -> Vec<u8> {
        match self {
            EcdsaSigningKey::NistP256(key) => {
                key.verifying_key().to_encoded_point(false).as_bytes().to_vec()
            }
            EcdsaSigningKey::Secp256k1(key) => {
                key.verifying_key().to_encoded_point(false).as_bytes().to_vec()
            }
        }
    }
}

fn take_secret(bytes: &mut [u8]) -> Zeroizing<Vec<u8>> {
    let secret = Zeroizing::new(bytes.to_vec());
    bytes.zeroize();
    secret
}

enum EcdsaVerifyingKey {
    NistP256(p256::ecdsa::VerifyingKey),
    Secp256k1(k256::ecdsa::VerifyingKey),
}

impl EcdsaVerifyingKey {
    fn from_sec1_bytes(curve: EllipticCurve, point: &[u8]) -> Result<Self, String> {
        match curve {
            EllipticCurve::NistP256 => p256::ecdsa::VerifyingKey::from_sec1_bytes(point)
                .map(EcdsaVerifyingKey::NistP256)
                .map_err(|_| "invalid P-256 public point".to_string()),
            EllipticCurve::Secp256k1 => k256::ecdsa::VerifyingKey::from_sec1_bytes(point)
                .map(EcdsaVerifyingKey::Secp256k1)
                .map_err(|_| "invalid secp256k1 public point".to_string()),
        }
    }
}

fn validate_public_key(key: &EcdsaPublicKey) -> KeyManagerResult<()> {
    validate_version(key.version, EcdsaVerifyKeyManager::VERSION)?;
    EcdsaVerifyingKey::from_sec1_bytes(key.params.curve, &key.point)
        .map(|_| ())
        .map_err(KeyManagerError::CorruptedKey)
}

/// Signs with ECDSA private keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct EcdsaSignKeyManager;

impl EcdsaSignKeyManager {
    pub const VERSION: u32 = 0;
}

impl KeyTypeManager for EcdsaSignKeyManager {
    type Key = EcdsaPrivateKey;
    type KeyFormat = EcdsaKeyFormat;

    fn key_type(&self) -> &'static str {
        ECDSA_PRIVATE_KEY_TYPE
    }

    fn version(&self) -> u32 {
        Self::VERSION
    }

    fn key_material_type(&self) -> KeyMaterialType {
        KeyMaterialType::AsymmetricPrivate
    }

    fn validate_key(&self, key: &EcdsaPrivateKey) -> KeyManagerResult<()> {
        validate_version(key.version, Self::VERSION)?;
        if key.key_value.len() != SECRET_SIZE {
            return Err(KeyManagerError::CorruptedKey(format!(
                "ECDSA secret must be {SECRET_SIZE} bytes"
            )));
        }
        validate_public_key(&key.public_key)?;

        let signing_key = EcdsaSigningKey::from_slice(key.public_key.params.curve, &key.key_value)
            .map_err(KeyManagerError::CorruptedKey)?;
        if signing_key.public_point() != key.public_key.point {
            return Err(KeyManagerError::CorruptedKey(
                "public key does not match the private key".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_key_format(&self, _key_format: &EcdsaKeyFormat) -> KeyManagerResult<()> {
        // every curve and encoding combination is supported
        Ok(())
    }

    fn create_key(&self, key_format: &EcdsaKeyFormat) -> KeyManagerResult<EcdsaPrivateKey> {
        let signing_key = EcdsaSigningKey::random(key_format.params.curve);
        let secret = signing_key.secret_bytes();

        Ok(EcdsaPrivateKey {
            version: Self::VERSION,
            public_key: EcdsaPublicKey {
                version: EcdsaVerifyKeyManager::VERSION,
                params: key_format.params,
                point: signing_key.public_point(),
            },
            key_value: secret.to_vec(),
        })
    }

    fn public_key_data(&self, key: &EcdsaPrivateKey) -> KeyManagerResult<KeyData> {
        let value = codec::encode(&key.public_key)
            .map_err(|e| KeyManagerError::CorruptedKey(format!("cannot encode public key: {e}")))?;
        Ok(KeyData::new(
            ECDSA_PUBLIC_KEY_TYPE,
            value,
            KeyMaterialType::AsymmetricPublic,
        ))
    }
}

impl PrimitiveBuilder<Box<dyn PublicKeySign>> for EcdsaSignKeyManager {
    fn build_primitive(&self, key: &EcdsaPrivateKey) -> KeyManagerResult<Box<dyn PublicKeySign>> {
        let signing_key = EcdsaSigningKey::from_slice(key.public_key.params.curve, &key.key_value)
            .map_err(KeyManagerError::Primitive)?;
        Ok(Box::new(EcdsaSigner {
            key: signing_key,
            encoding: key.public_key.params.encoding,
        }))
    }
}

/// Verifies with ECDSA public keys. Public keys are only ever derived from
/// private keys, so its factory rejects every format.
#[derive(Debug, Default, Clone, Copy)]
pub struct EcdsaVerifyKeyManager;

impl EcdsaVerifyKeyManager {
    pub const VERSION: u32 = 0;
}

impl KeyTypeManager for EcdsaVerifyKeyManager {
    type Key = EcdsaPublicKey;
    type KeyFormat = EcdsaKeyFormat;

    fn key_type(&self) -> &'static str {
        ECDSA_PUBLIC_KEY_TYPE
    }

    fn version(&self) -> u32 {
        Self::VERSION
    }

    fn key_material_type(&self) -> KeyMaterialType {
        KeyMaterialType::AsymmetricPublic
    }

    fn validate_key(&self, key: &EcdsaPublicKey) -> KeyManagerResult<()> {
        validate_public_key(key)
    }

    fn validate_key_format(&self, _key_format: &EcdsaKeyFormat) -> KeyManagerResult<()> {
        Err(KeyManagerError::Generation(
            "ECDSA public keys are derived from private keys".to_string(),
        ))
    }

    fn create_key(&self, key_format: &EcdsaKeyFormat) -> KeyManagerResult<EcdsaPublicKey> {
        self.validate_key_format(key_format)?;
        Err(KeyManagerError::Generation(
            "ECDSA public keys are derived from private keys".to_string(),
        ))
    }
}

impl PrimitiveBuilder<Box<dyn PublicKeyVerify>> for EcdsaVerifyKeyManager {
    fn build_primitive(&self, key: &EcdsaPublicKey) -> KeyManagerResult<Box<dyn PublicKeyVerify>> {
        let verifying_key = EcdsaVerifyingKey::from_sec1_bytes(key.params.curve, &key.point)
            .map_err(KeyManagerError::Primitive)?;
        Ok(Box::new(EcdsaVerifier {
            key: verifying_key,
            encoding: key.params.encoding,
        }))
    }
}

pub struct EcdsaSigner {
    key: EcdsaSigningKey,
    encoding: SignatureEncoding,
}

impl PublicKeySign for EcdsaSigner {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let encoded = match &self.key {
            EcdsaSigningKey::NistP256(key) => {
                let signature: p256::ecdsa::Signature =
                    key.try_sign(data).map_err(|_| CryptoError::Signing)?;
                match self.encoding {
                    SignatureEncoding::Der => signature.to_der().as_bytes().to_vec(),
                    SignatureEncoding::IeeeP1363 => signature.to_bytes().to_vec(),
                }
            }
            EcdsaSigningKey::Secp256k1(key) => {
                let signature: k256::ecdsa::Signature =
                    key.try_sign(data).map_err(|_| CryptoError::Signing)?;
                match self.encoding {
                    SignatureEncoding::Der => signature.to_der().as_bytes().to_vec(),
                    SignatureEncoding::IeeeP1363 => signature.to_bytes().to_vec(),
                }
            }
        };
        Ok(encoded)
    }
}

pub struct EcdsaVerifier {
    key: EcdsaVerifyingKey,
    encoding: SignatureEncoding,
}

impl PublicKeyVerify for EcdsaVerifier {
    fn verify(&self, signature: &[u8], data: &[u8]) -> Result<(), CryptoError> {
        match &self.key {
            EcdsaVerifyingKey::NistP256(key) => {
                let signature = match self.encoding {
                    SignatureEncoding::Der => p256::ecdsa::Signature::from_der(signature),
                    SignatureEncoding::IeeeP1363 => p256::ecdsa::Signature::from_slice(signature),
                }
                .map_err(|_| CryptoError::Verification)?;
                key.verify(data, &signature)
            }
            EcdsaVerifyingKey::Secp256k1(key) => {
                let signature = match self.encoding {
                    SignatureEncoding::Der => k256::ecdsa::Signature::from_der(signature),
                    SignatureEncoding::IeeeP1363 => k256::ecdsa::Signature::from_slice(signature),
                }
                .map_err(|_| CryptoError::Verification)?;
                key.verify(data, &signature)
            }
        }
        .map_err(|_| CryptoError::Verification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::key_manager::{KeyManager, UntypedKeyManager};
    use crate::domain::key_type_manager::KeyManagerImpl;
    use crate::domain::message::{KeyRef, MessageRef};

    fn sign_manager() -> KeyManagerImpl<EcdsaSignKeyManager, Box<dyn PublicKeySign>> {
        KeyManagerImpl::new(EcdsaSignKeyManager)
    }

    fn verify_manager() -> KeyManagerImpl<EcdsaVerifyKeyManager, Box<dyn PublicKeyVerify>> {
        KeyManagerImpl::new(EcdsaVerifyKeyManager)
    }

    fn new_private_key_data(curve: EllipticCurve, encoding: SignatureEncoding) -> KeyData {
        let format = codec::encode(&EcdsaKeyFormat {
            params: EcdsaParams { curve, encoding },
        })
        .unwrap();
        sign_manager().key_factory().new_key_data(&format).unwrap()
    }

    #[test]
    fn sign_and_verify_for_every_curve_and_encoding() {
        for curve in [EllipticCurve::NistP256, EllipticCurve::Secp256k1] {
            for encoding in [SignatureEncoding::Der, SignatureEncoding::IeeeP1363] {
                let private = new_private_key_data(curve, encoding);
                assert_eq!(private.key_material_type(), KeyMaterialType::AsymmetricPrivate);
                let public = sign_manager().public_key_data(&private).unwrap();
                assert_eq!(public.type_url(), ECDSA_PUBLIC_KEY_TYPE);
                assert_eq!(public.key_material_type(), KeyMaterialType::AsymmetricPublic);

                let signer = sign_manager().primitive(KeyRef::from(&private)).unwrap();
                let verifier = verify_manager().primitive(KeyRef::from(&public)).unwrap();

                let signature = signer.sign(b"test message").unwrap();
                if encoding == SignatureEncoding::IeeeP1363 {
                    assert_eq!(signature.len(), 64);
                }
                assert!(verifier.verify(&signature, b"test message").is_ok());
                assert_eq!(
                    verifier.verify(&signature, b"other message"),
                    Err(CryptoError::Verification)
                );
            }
        }
    }

    #[test]
    fn generated_secret_rebuilds_the_public_point() {
        for curve in [EllipticCurve::NistP256, EllipticCurve::Secp256k1] {
            for _ in 0..16 {
                let private = new_private_key_data(curve, SignatureEncoding::Der);
                let key: EcdsaPrivateKey = codec::decode_key(private.value()).unwrap();
                assert_eq!(key.key_value.len(), SECRET_SIZE);

                let rebuilt = EcdsaSigningKey::from_slice(curve, &key.key_value).unwrap();
                assert_eq!(rebuilt.public_point(), key.public_key.point);
            }
        }
    }

    #[test]
    fn signature_in_the_other_encoding_is_rejected() {
        let der = new_private_key_data(EllipticCurve::NistP256, SignatureEncoding::Der);
        let signer = sign_manager().primitive(KeyRef::from(&der)).unwrap();
        let signature = signer.sign(b"data").unwrap();

        let mut public: EcdsaPublicKey =
            codec::decode_key(sign_manager().public_key_data(&der).unwrap().value()).unwrap();
        public.params.encoding = SignatureEncoding::IeeeP1363;
        let verifier = verify_manager().primitive(KeyRef::typed(&public)).unwrap();
        assert_eq!(verifier.verify(&signature, b"data"), Err(CryptoError::Verification));
    }

    #[test]
    fn public_key_factory_refuses_to_generate() {
        let format = EcdsaKeyFormat {
            params: EcdsaParams {
                curve: EllipticCurve::NistP256,
                encoding: SignatureEncoding::Der,
            },
        };
        assert!(matches!(
            verify_manager().key_factory().new_key(MessageRef::typed(&format)),
            Err(KeyManagerError::Generation(_))
        ));
    }

    #[test]
    fn mismatched_public_key_is_corrupted() {
        let a = new_private_key_data(EllipticCurve::Secp256k1, SignatureEncoding::Der);
        let b = new_private_key_data(EllipticCurve::Secp256k1, SignatureEncoding::Der);
        let mut key: EcdsaPrivateKey = codec::decode_key(a.value()).unwrap();
        let other: EcdsaPrivateKey = codec::decode_key(b.value()).unwrap();
        key.public_key = other.public_key.clone();

        assert!(matches!(
            sign_manager().primitive(KeyRef::typed(&key)),
            Err(KeyManagerError::CorruptedKey(_))
        ));
    }

    #[test]
    fn invalid_point_is_corrupted() {
        let key = EcdsaPublicKey {
            version: 0,
            params: EcdsaParams {
                curve: EllipticCurve::NistP256,
                encoding: SignatureEncoding::Der,
            },
            point: vec![0x04; 65],
        };
        assert!(matches!(
            verify_manager().primitive(KeyRef::typed(&key)),
            Err(KeyManagerError::CorruptedKey(_))
        ));
    }

    #[test]
    fn public_key_passed_to_the_private_manager_is_unsupported() {
        let private = new_private_key_data(EllipticCurve::NistP256, SignatureEncoding::Der);
        let public = sign_manager().public_key_data(&private).unwrap();
        assert!(matches!(
            sign_manager().primitive(KeyRef::from(&public)),
            Err(KeyManagerError::UnsupportedKey(_))
        ));
    }
}
