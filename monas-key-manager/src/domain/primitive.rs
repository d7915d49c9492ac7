use thiserror::Error;

/// A primitive kind that key managers can produce.
///
/// Implemented for the boxed primitive traits below; `NAME` is the name used
/// in registry configs and error messages.
pub trait Primitive: 'static {
    const NAME: &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("encryption failed")]
    Encrypting,
    // No detail: callers must not learn why authentication failed.
    #[error("decryption failed")]
    Decrypting,
    #[error("invalid ciphertext format")]
    InvalidFormat,
    #[error("signing failed")]
    Signing,
    #[error("verification failed")]
    Verification,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Authenticated encryption with associated data.
pub trait Aead: Send + Sync {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, CryptoError>;

    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// Message authentication code.
pub trait Mac: Send + Sync {
    fn compute_mac(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError>;

    fn verify_mac(&self, mac: &[u8], data: &[u8]) -> Result<(), CryptoError>;
}

/// Pseudo-random function with caller-chosen output length.
pub trait Prf: Send + Sync {
    fn compute(&self, input: &[u8], output_length: usize) -> Result<Vec<u8>, CryptoError>;
}

pub trait PublicKeySign: Send + Sync {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

pub trait PublicKeyVerify: Send + Sync {
    fn verify(&self, signature: &[u8], data: &[u8]) -> Result<(), CryptoError>;
}

impl Primitive for Box<dyn Aead> {
    const NAME: &'static str = "Aead";
}

impl Primitive for Box<dyn Mac> {
    const NAME: &'static str = "Mac";
}

impl Primitive for Box<dyn Prf> {
    const NAME: &'static str = "Prf";
}

impl Primitive for Box<dyn PublicKeySign> {
    const NAME: &'static str = "PublicKeySign";
}

impl Primitive for Box<dyn PublicKeyVerify> {
    const NAME: &'static str = "PublicKeyVerify";
}
