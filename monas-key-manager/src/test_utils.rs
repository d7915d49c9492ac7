//! Test utilities: a tiny non-cryptographic key type for exercising the
//! manager adapters and the registry without real key material.

use serde::{Deserialize, Serialize};

use crate::domain::error::{KeyManagerError, KeyManagerResult};
use crate::domain::key_data::{KeyData, KeyMaterialType};
use crate::domain::key_type_manager::{validate_version, KeyTypeManager, PrimitiveBuilder};
use crate::domain::primitive::Primitive;
use crate::infrastructure::codec;

pub const COUNTER_KEY_TYPE: &str = "type.monas.network/test.CounterKey";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterFormat {
    pub start: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterKey {
    pub version: u32,
    pub start: u64,
}

impl CounterKey {
    pub fn new(version: u32, start: u64) -> Self {
        Self { version, start }
    }
}

/// Primitive built from a [`CounterKey`].
#[derive(Debug)]
pub struct CounterPrimitive {
    pub start: u64,
    pub built_by: &'static str,
}

impl Primitive for CounterPrimitive {
    const NAME: &'static str = "Counter";
}

/// A second primitive kind for the same key type.
#[derive(Debug)]
pub struct CounterLabel(pub String);

impl Primitive for CounterLabel {
    const NAME: &'static str = "CounterLabel";
}

pub fn test_key_data(key: &CounterKey) -> KeyData {
    KeyData::new(
        COUNTER_KEY_TYPE,
        codec::encode(key).unwrap(),
        KeyMaterialType::Symmetric,
    )
}

pub fn encoded_format(start: u64) -> Vec<u8> {
    codec::encode(&CounterFormat { start }).unwrap()
}

fn validate_counter_key(key: &CounterKey, version: u32) -> KeyManagerResult<()> {
    validate_version(key.version, version)?;
    if key.start == 0 {
        return Err(KeyManagerError::CorruptedKey("start must be positive".into()));
    }
    Ok(())
}

/// The "main" manager family for [`COUNTER_KEY_TYPE`].
pub struct CounterKeyTypeManager {
    version: u32,
}

impl CounterKeyTypeManager {
    pub fn new(version: u32) -> Self {
        Self { version }
    }
}

impl KeyTypeManager for CounterKeyTypeManager {
    type Key = CounterKey;
    type KeyFormat = CounterFormat;

    fn key_type(&self) -> &'static str {
        COUNTER_KEY_TYPE
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn key_material_type(&self) -> KeyMaterialType {
        KeyMaterialType::Symmetric
    }

    fn validate_key(&self, key: &CounterKey) -> KeyManagerResult<()> {
        validate_counter_key(key, self.version)
    }

    fn validate_key_format(&self, key_format: &CounterFormat) -> KeyManagerResult<()> {
        if key_format.start == 0 {
            return Err(KeyManagerError::Generation("start must be positive".into()));
        }
        Ok(())
    }

    fn create_key(&self, key_format: &CounterFormat) -> KeyManagerResult<CounterKey> {
        Ok(CounterKey::new(self.version, key_format.start))
    }
}

impl PrimitiveBuilder<CounterPrimitive> for CounterKeyTypeManager {
    fn build_primitive(&self, key: &CounterKey) -> KeyManagerResult<CounterPrimitive> {
        Ok(CounterPrimitive {
            start: key.start,
            built_by: "counter",
        })
    }
}

impl PrimitiveBuilder<CounterLabel> for CounterKeyTypeManager {
    fn build_primitive(&self, key: &CounterKey) -> KeyManagerResult<CounterLabel> {
        Ok(CounterLabel(format!("counter-{}", key.start)))
    }
}

/// A different implementation family for the same key type.
pub struct ForeignCounterKeyTypeManager {
    version: u32,
}

impl ForeignCounterKeyTypeManager {
    pub fn new(version: u32) -> Self {
        Self { version }
    }
}

impl KeyTypeManager for ForeignCounterKeyTypeManager {
    type Key = CounterKey;
    type KeyFormat = CounterFormat;

    fn key_type(&self) -> &'static str {
        COUNTER_KEY_TYPE
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn key_material_type(&self) -> KeyMaterialType {
        KeyMaterialType::Symmetric
    }

    fn validate_key(&self, key: &CounterKey) -> KeyManagerResult<()> {
        validate_counter_key(key, self.version)
    }

    fn validate_key_format(&self, _key_format: &CounterFormat) -> KeyManagerResult<()> {
        Ok(())
    }

    fn create_key(&self, key_format: &CounterFormat) -> KeyManagerResult<CounterKey> {
        Ok(CounterKey::new(self.version, key_format.start.max(1)))
    }
}

impl PrimitiveBuilder<CounterPrimitive> for ForeignCounterKeyTypeManager {
    fn build_primitive(&self, key: &CounterKey) -> KeyManagerResult<CounterPrimitive> {
        Ok(CounterPrimitive {
            start: key.start,
            built_by: "foreign",
        })
    }
}
