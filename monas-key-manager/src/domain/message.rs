use std::any::{type_name, Any};
use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::error::{KeyManagerError, KeyManagerResult};
use crate::domain::key_data::KeyData;
use crate::infrastructure::codec;

/// A key or key-format message that can cross the dyn-level contracts.
///
/// Implemented for every serde message type; concrete managers recover their
/// own type through [`downcast_ref`](trait.KeyMessage.html#method.downcast_ref).
pub trait KeyMessage: Any + Send + Sync + 'static {
    /// Canonical serialized form.
    fn encode(&self) -> Result<Vec<u8>, serde_json::Error>;

    fn message_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T> KeyMessage for T
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        codec::encode(self)
    }

    fn message_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

impl dyn KeyMessage {
    pub fn downcast_ref<M: KeyMessage>(&self) -> Option<&M> {
        self.as_any().downcast_ref::<M>()
    }

    pub fn downcast<M: KeyMessage>(self: Box<Self>) -> Option<Box<M>> {
        self.into_any().downcast::<M>().ok()
    }
}

/// A key format given either as a typed message or as its serialized form.
#[derive(Clone, Copy)]
pub enum MessageRef<'a> {
    Typed(&'a dyn KeyMessage),
    Encoded(&'a [u8]),
}

impl<'a> MessageRef<'a> {
    pub fn typed(message: &'a dyn KeyMessage) -> Self {
        MessageRef::Typed(message)
    }

    pub fn encoded(bytes: &'a [u8]) -> Self {
        MessageRef::Encoded(bytes)
    }

    /// Resolves to the format type `F`, decoding when needed.
    pub fn resolve<F>(self) -> KeyManagerResult<Cow<'a, F>>
    where
        F: KeyMessage + DeserializeOwned + Clone,
    {
        match self {
            MessageRef::Typed(message) => message
                .downcast_ref::<F>()
                .map(Cow::Borrowed)
                .ok_or_else(|| {
                    KeyManagerError::UnsupportedFormat(format!(
                        "expected {}, got {}",
                        type_name::<F>(),
                        message.message_name()
                    ))
                }),
            MessageRef::Encoded(bytes) => codec::decode_key_format::<F>(bytes).map(Cow::Owned),
        }
    }
}

impl<'a> From<&'a [u8]> for MessageRef<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        MessageRef::Encoded(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for MessageRef<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        MessageRef::Encoded(bytes.as_slice())
    }
}

/// A key given either as a type-tagged container or as a typed key message.
#[derive(Clone, Copy)]
pub enum KeyRef<'a> {
    Data(&'a KeyData),
    Typed(&'a dyn KeyMessage),
}

impl<'a> KeyRef<'a> {
    pub fn typed(message: &'a dyn KeyMessage) -> Self {
        KeyRef::Typed(message)
    }
}

impl<'a> From<&'a KeyData> for KeyRef<'a> {
    fn from(data: &'a KeyData) -> Self {
        KeyRef::Data(data)
    }
}
