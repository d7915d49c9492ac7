pub mod aead;
pub mod codec;
pub mod config;
pub mod mac;
pub mod random;
pub mod signature;
