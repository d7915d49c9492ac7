use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// How sensitive the key material inside a [`KeyData`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMaterialType {
    Symmetric,
    AsymmetricPrivate,
    AsymmetricPublic,
    /// The material only references a key held elsewhere (e.g. a KMS).
    Remote,
}

impl KeyMaterialType {
    pub fn is_secret(&self) -> bool {
        matches!(
            self,
            KeyMaterialType::Symmetric | KeyMaterialType::AsymmetricPrivate
        )
    }
}

/// Type-tagged container for serialized key material.
///
/// Immutable once built. The serialized value is wiped when the container is
/// dropped and never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyData {
    type_url: String,
    value: Vec<u8>,
    key_material_type: KeyMaterialType,
}

impl KeyData {
    pub fn new(
        type_url: impl Into<String>,
        value: Vec<u8>,
        key_material_type: KeyMaterialType,
    ) -> Self {
        Self {
            type_url: type_url.into(),
            value,
            key_material_type,
        }
    }

    pub fn type_url(&self) -> &str {
        &self.type_url
    }

    /// Serialized key message.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn key_material_type(&self) -> KeyMaterialType {
        self.key_material_type
    }
}

impl fmt::Debug for KeyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyData")
            .field("type_url", &self.type_url)
            .field("value", &format_args!("<{} bytes redacted>", self.value.len()))
            .field("key_material_type", &self.key_material_type)
            .finish()
    }
}

impl Drop for KeyData {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}
