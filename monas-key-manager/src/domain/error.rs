use thiserror::Error;

/// Failure kinds reported by key factories, key managers and the registry.
///
/// Every variant carries a human-readable reason. Reasons name key types,
/// primitives and versions, never key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyManagerError {
    /// The key format could not be parsed as the expected message.
    #[error("unsupported key format: {0}")]
    UnsupportedFormat(String),

    /// The key is of a type this manager does not handle.
    #[error("unsupported key: {0}")]
    UnsupportedKey(String),

    /// The key material is structurally invalid.
    #[error("corrupted key: {0}")]
    CorruptedKey(String),

    /// Randomness or parameter validation failed while creating a key.
    #[error("key generation failed: {0}")]
    Generation(String),

    /// A registry mutation conflicted with an existing entry.
    #[error("registration failed: {0}")]
    Registration(String),

    /// The registry's `new_key_allowed` gate is closed for this key type.
    #[error("key generation disabled: {0}")]
    GenerationDisabled(String),

    /// No manager is registered for the requested key type and primitive.
    #[error("not found: {0}")]
    NotFound(String),

    /// The primitive could not be built from an otherwise valid key.
    #[error("primitive construction failed: {0}")]
    Primitive(String),
}

pub type KeyManagerResult<T> = Result<T, KeyManagerError>;
