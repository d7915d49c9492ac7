//! Typed key-type managers and their adapters to the dyn-level contracts.
//!
//! A [`KeyTypeManager`] knows one key type: how to validate its keys and
//! formats and how to create new keys. Each [`PrimitiveBuilder`] impl adds
//! one primitive that can be built from those keys. [`KeyManagerImpl`] pairs
//! the two into a [`KeyManager`], so all primitives of a key type share the
//! same validation.

use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::domain::error::{KeyManagerError, KeyManagerResult};
use crate::domain::key_data::{KeyData, KeyMaterialType};
use crate::domain::key_manager::{KeyFactory, KeyManager, UntypedKeyManager};
use crate::domain::message::{KeyMessage, KeyRef, MessageRef};
use crate::domain::primitive::Primitive;
use crate::infrastructure::codec;

pub trait KeyTypeManager: Send + Sync + 'static {
    type Key: KeyMessage + DeserializeOwned + Clone;
    type KeyFormat: KeyMessage + DeserializeOwned + Clone;

    fn key_type(&self) -> &'static str;

    fn version(&self) -> u32;

    fn key_material_type(&self) -> KeyMaterialType;

    fn validate_key(&self, key: &Self::Key) -> KeyManagerResult<()>;

    fn validate_key_format(&self, key_format: &Self::KeyFormat) -> KeyManagerResult<()>;

    /// Creates a new key from an already validated format.
    fn create_key(&self, key_format: &Self::KeyFormat) -> KeyManagerResult<Self::Key>;

    /// Public half of an already validated private key.
    fn public_key_data(&self, _key: &Self::Key) -> KeyManagerResult<KeyData> {
        Err(KeyManagerError::UnsupportedKey(format!(
            "{} is not a private key type",
            self.key_type()
        )))
    }
}

/// Builds primitive `P` from an already validated key.
pub trait PrimitiveBuilder<P: Primitive>: KeyTypeManager {
    fn build_primitive(&self, key: &Self::Key) -> KeyManagerResult<P>;
}

/// Rejects keys written by a newer manager revision.
pub fn validate_version(key_version: u32, max_expected: u32) -> KeyManagerResult<()> {
    if key_version > max_expected {
        return Err(KeyManagerError::UnsupportedKey(format!(
            "key version {key_version} is newer than supported version {max_expected}"
        )));
    }
    Ok(())
}

/// [`KeyFactory`] over a typed key-type manager.
pub struct KeyFactoryImpl<M> {
    inner: Arc<M>,
}

impl<M: KeyTypeManager> KeyFactoryImpl<M> {
    pub fn new(inner: Arc<M>) -> Self {
        Self { inner }
    }

    /// Typed key generation: validates the format, creates the key and
    /// checks the created key before handing it out.
    pub fn generate(&self, key_format: &M::KeyFormat) -> KeyManagerResult<M::Key> {
        self.inner.validate_key_format(key_format)?;
        let key = self.inner.create_key(key_format)?;
        self.inner.validate_key(&key).map_err(|e| {
            KeyManagerError::Generation(format!(
                "{} produced an invalid key: {e}",
                self.inner.key_type()
            ))
        })?;
        Ok(key)
    }
}

impl<M: KeyTypeManager> KeyFactory for KeyFactoryImpl<M> {
    fn key_type(&self) -> &str {
        self.inner.key_type()
    }

    fn new_key(&self, key_format: MessageRef<'_>) -> KeyManagerResult<Box<dyn KeyMessage>> {
        let key_format = key_format.resolve::<M::KeyFormat>()?;
        let key = self.generate(&key_format)?;
        Ok(Box::new(key))
    }

    fn new_key_data_from(&self, key_format: MessageRef<'_>) -> KeyManagerResult<KeyData> {
        let key_format = key_format.resolve::<M::KeyFormat>()?;
        let key = self.generate(&key_format)?;
        let value = key.encode().map_err(|e| {
            KeyManagerError::Generation(format!(
                "cannot encode {} key: {e}",
                self.inner.key_type()
            ))
        })?;

        tracing::debug!(key_type = self.inner.key_type(), "generated new key data");
        Ok(KeyData::new(
            self.inner.key_type(),
            value,
            self.inner.key_material_type(),
        ))
    }
}

/// [`KeyManager`] for primitive `P` over a typed key-type manager.
pub struct KeyManagerImpl<M, P> {
    inner: Arc<M>,
    factory: KeyFactoryImpl<M>,
    _primitive: PhantomData<fn() -> P>,
}

impl<M, P> KeyManagerImpl<M, P>
where
    M: PrimitiveBuilder<P>,
    P: Primitive,
{
    pub fn new(manager: M) -> Self {
        Self::from_shared(Arc::new(manager))
    }

    /// Builds a manager that shares `manager` with managers for other
    /// primitives of the same key type.
    pub fn from_shared(manager: Arc<M>) -> Self {
        Self {
            factory: KeyFactoryImpl::new(Arc::clone(&manager)),
            inner: manager,
            _primitive: PhantomData,
        }
    }

    pub fn key_type_manager(&self) -> &M {
        &self.inner
    }

    pub fn factory(&self) -> &KeyFactoryImpl<M> {
        &self.factory
    }

    /// Typed counterpart of [`KeyManager::primitive`].
    pub fn primitive_from_key(&self, key: &M::Key) -> KeyManagerResult<P> {
        self.inner.validate_key(key)?;
        self.inner.build_primitive(key)
    }
}

impl<M: KeyTypeManager, P> KeyManagerImpl<M, P> {
    fn resolve_key<'a>(&self, key: KeyRef<'a>) -> KeyManagerResult<Cow<'a, M::Key>> {
        match key {
            KeyRef::Data(data) => {
                if data.type_url() != self.inner.key_type() {
                    return Err(KeyManagerError::UnsupportedKey(format!(
                        "{} cannot handle keys of type {}",
                        self.inner.key_type(),
                        data.type_url()
                    )));
                }
                codec::decode_key::<M::Key>(data.value()).map(Cow::Owned)
            }
            KeyRef::Typed(message) => message
                .downcast_ref::<M::Key>()
                .map(Cow::Borrowed)
                .ok_or_else(|| {
                    KeyManagerError::UnsupportedKey(format!(
                        "{} cannot handle key message {}",
                        self.inner.key_type(),
                        message.message_name()
                    ))
                }),
        }
    }
}

impl<M, P> UntypedKeyManager for KeyManagerImpl<M, P>
where
    M: KeyTypeManager,
    P: 'static,
{
    fn key_type(&self) -> &str {
        self.inner.key_type()
    }

    fn version(&self) -> u32 {
        self.inner.version()
    }

    fn key_factory(&self) -> &dyn KeyFactory {
        &self.factory
    }

    fn validate_key(&self, key: &KeyData) -> KeyManagerResult<()> {
        let key = self.resolve_key(KeyRef::Data(key))?;
        self.inner.validate_key(&key)
    }

    fn public_key_data(&self, key: &KeyData) -> KeyManagerResult<KeyData> {
        let key = self.resolve_key(KeyRef::Data(key))?;
        self.inner.validate_key(&key)?;
        self.inner.public_key_data(&key)
    }
}

impl<M, P> KeyManager for KeyManagerImpl<M, P>
where
    M: PrimitiveBuilder<P>,
    P: Primitive,
{
    type Primitive = P;

    fn primitive(&self, key: KeyRef<'_>) -> KeyManagerResult<P> {
        let key = self.resolve_key(key)?;
        self.inner.validate_key(&key)?;
        self.inner.build_primitive(&key)
    }
}
