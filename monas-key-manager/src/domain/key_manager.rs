use crate::domain::error::{KeyManagerError, KeyManagerResult};
use crate::domain::key_data::KeyData;
use crate::domain::message::{KeyMessage, KeyRef, MessageRef};
use crate::domain::primitive::Primitive;

/// Generates fresh key material for one key type.
///
/// Factories hold no mutable state. The only shared resource they touch is
/// the process-wide secure random source, so calls may run concurrently.
pub trait KeyFactory: Send + Sync {
    /// Key type of the keys this factory creates.
    fn key_type(&self) -> &str;

    /// Generates a new key according to `key_format`.
    ///
    /// Fails with `UnsupportedFormat` if the format is not this type's key
    /// format, or `Generation` if its parameters are rejected.
    fn new_key(&self, key_format: MessageRef<'_>) -> KeyManagerResult<Box<dyn KeyMessage>>;

    /// Generates a new key and wraps it into a [`KeyData`] stamped with this
    /// factory's key type. Fails like [`new_key`](Self::new_key).
    fn new_key_data_from(&self, key_format: MessageRef<'_>) -> KeyManagerResult<KeyData>;

    /// [`new_key_data_from`](Self::new_key_data_from) for a serialized format.
    fn new_key_data(&self, serialized_key_format: &[u8]) -> KeyManagerResult<KeyData> {
        self.new_key_data_from(MessageRef::Encoded(serialized_key_format))
    }
}

/// The primitive-independent part of a key manager.
///
/// The registry hands this out for operations that need no primitive, such
/// as validation or public key extraction.
pub trait UntypedKeyManager: Send + Sync {
    /// Identifier of the keys managed here. Constant for the manager's lifetime.
    fn key_type(&self) -> &str;

    /// Implementation revision, used only to gate registry overwrites.
    fn version(&self) -> u32;

    fn does_support(&self, key_type: &str) -> bool {
        key_type == self.key_type()
    }

    fn key_factory(&self) -> &dyn KeyFactory;

    /// Checks that `key` is a structurally valid key of this type.
    fn validate_key(&self, key: &KeyData) -> KeyManagerResult<()>;

    /// Derives the public key of a private key. Only private key types
    /// support this.
    fn public_key_data(&self, key: &KeyData) -> KeyManagerResult<KeyData> {
        Err(KeyManagerError::UnsupportedKey(format!(
            "{} is not a private key type (got {})",
            self.key_type(),
            key.type_url()
        )))
    }
}

/// Builds primitives of one kind for keys of one type.
///
/// One key type backing several primitives has one manager per primitive.
pub trait KeyManager: UntypedKeyManager {
    type Primitive: Primitive;

    /// Constructs a primitive bound to `key`.
    ///
    /// Fails with `UnsupportedKey` if the key is not of this manager's type,
    /// `CorruptedKey` if its material is invalid, or `Primitive` if the
    /// primitive cannot be built. The key is never modified or retained.
    fn primitive(&self, key: KeyRef<'_>) -> KeyManagerResult<Self::Primitive>;
}
