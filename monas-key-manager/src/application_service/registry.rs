use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::error::{KeyManagerError, KeyManagerResult};
use crate::domain::key_data::KeyData;
use crate::domain::key_manager::{KeyManager, UntypedKeyManager};
use crate::domain::message::{KeyMessage, KeyRef, MessageRef};
use crate::domain::primitive::Primitive;

/// Identifies the primitive a registry entry produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrimitiveKind {
    name: &'static str,
    id: TypeId,
}

impl PrimitiveKind {
    pub fn of<P: Primitive>() -> Self {
        Self {
            name: P::NAME,
            id: TypeId::of::<P>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

struct RegistryEntry {
    /// `Arc<dyn KeyManager<Primitive = P>>` for the entry's primitive kind.
    manager: Box<dyn Any + Send + Sync>,
    untyped: Arc<dyn UntypedKeyManager>,
    implementation: TypeId,
    implementation_name: &'static str,
    version: u32,
    new_key_allowed: bool,
}

/// Maps (key type, primitive kind) pairs to key managers.
///
/// An entry can be replaced only by the same implementation at an equal or
/// newer version, or by a different implementation at a strictly newer
/// version. Entries registered with `new_key_allowed = false` are pinned:
/// they can never be replaced and the registry refuses to generate keys of
/// their type.
///
/// Entries are built completely before the write lock is taken, so readers
/// only ever see whole entries.
#[derive(Default)]
pub struct KeyManagerRegistry {
    entries: RwLock<HashMap<String, BTreeMap<PrimitiveKind, RegistryEntry>>>,
}

impl KeyManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_key_manager<K>(&self, manager: K, new_key_allowed: bool) -> KeyManagerResult<()>
    where
        K: KeyManager + 'static,
    {
        let key_type = manager.key_type().to_string();
        if key_type.is_empty() {
            return Err(KeyManagerError::Registration(
                "key manager reports an empty key type".to_string(),
            ));
        }

        let kind = PrimitiveKind::of::<K::Primitive>();
        let manager = Arc::new(manager);
        let typed: Arc<dyn KeyManager<Primitive = K::Primitive>> = manager.clone();
        let incoming = RegistryEntry {
            manager: Box::new(typed),
            version: manager.version(),
            untyped: manager,
            implementation: TypeId::of::<K>(),
            implementation_name: type_name::<K>(),
            new_key_allowed,
        };

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let existing = entries.get(&key_type).and_then(|by_kind| by_kind.get(&kind));
        if let Some(existing) = existing {
            if let Err(e) = admit(&key_type, kind, existing, &incoming) {
                tracing::warn!(
                    key_type = %key_type,
                    primitive = %kind,
                    existing_version = existing.version,
                    incoming_version = incoming.version,
                    "rejected key manager registration"
                );
                return Err(e);
            }
            tracing::info!(
                key_type = %key_type,
                primitive = %kind,
                from_version = existing.version,
                to_version = incoming.version,
                manager = incoming.implementation_name,
                "replacing registered key manager"
            );
        } else {
            tracing::debug!(
                key_type = %key_type,
                primitive = %kind,
                version = incoming.version,
                new_key_allowed,
                "registered key manager"
            );
        }

        entries.entry(key_type).or_default().insert(kind, incoming);
        Ok(())
    }

    /// Manager producing primitive `P` for `key_type`.
    pub fn get_key_manager<P: Primitive>(
        &self,
        key_type: &str,
    ) -> KeyManagerResult<Arc<dyn KeyManager<Primitive = P>>> {
        let not_found =
            || KeyManagerError::NotFound(format!("no {} manager registered for {key_type}", P::NAME));

        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key_type)
            .and_then(|by_kind| by_kind.get(&PrimitiveKind::of::<P>()))
            .and_then(|entry| {
                entry
                    .manager
                    .downcast_ref::<Arc<dyn KeyManager<Primitive = P>>>()
                    .cloned()
            })
            .ok_or_else(not_found)
    }

    /// Any manager registered for `key_type`, regardless of primitive.
    ///
    /// When several primitives are registered the one with the
    /// alphabetically first primitive name is returned.
    pub fn get_untyped_key_manager(
        &self,
        key_type: &str,
    ) -> KeyManagerResult<Arc<dyn UntypedKeyManager>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key_type)
            .and_then(|by_kind| by_kind.values().next())
            .map(|entry| Arc::clone(&entry.untyped))
            .ok_or_else(|| KeyManagerError::NotFound(format!("no manager registered for {key_type}")))
    }

    /// Resolves the primitive `P` for a type-tagged key.
    pub fn get_primitive<P: Primitive>(&self, key_data: &KeyData) -> KeyManagerResult<P> {
        self.get_key_manager::<P>(key_data.type_url())?
            .primitive(KeyRef::Data(key_data))
    }

    /// Generates a new key of `key_type` wrapped into a [`KeyData`].
    ///
    /// Fails with `GenerationDisabled` when the type is pinned, even though
    /// the manager's own factory could still generate keys.
    pub fn new_key_data(
        &self,
        key_type: &str,
        key_format: MessageRef<'_>,
    ) -> KeyManagerResult<KeyData> {
        self.generation_manager(key_type)?
            .key_factory()
            .new_key_data_from(key_format)
    }

    /// Typed counterpart of [`new_key_data`](Self::new_key_data), behind the same gate.
    pub fn new_key(
        &self,
        key_type: &str,
        key_format: MessageRef<'_>,
    ) -> KeyManagerResult<Box<dyn KeyMessage>> {
        self.generation_manager(key_type)?
            .key_factory()
            .new_key(key_format)
    }

    /// Public key matching a private key, derived by the private key's manager.
    pub fn public_key_data(&self, private_key_data: &KeyData) -> KeyManagerResult<KeyData> {
        self.get_untyped_key_manager(private_key_data.type_url())?
            .public_key_data(private_key_data)
    }

    /// Registered key types, sorted.
    pub fn key_types(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut key_types: Vec<String> = entries.keys().cloned().collect();
        key_types.sort();
        key_types
    }

    /// Whether the registry would generate new keys of `key_type`.
    pub fn is_new_key_allowed(&self, key_type: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key_type).is_some_and(|by_kind| {
            !by_kind.is_empty() && by_kind.values().all(|entry| entry.new_key_allowed)
        })
    }

    /// Manager to generate keys with. A pin on any primitive of the key type
    /// freezes generation for the whole type.
    fn generation_manager(&self, key_type: &str) -> KeyManagerResult<Arc<dyn UntypedKeyManager>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let by_kind = entries
            .get(key_type)
            .filter(|by_kind| !by_kind.is_empty())
            .ok_or_else(|| KeyManagerError::NotFound(format!("no manager registered for {key_type}")))?;

        if let Some((kind, _)) = by_kind.iter().find(|(_, entry)| !entry.new_key_allowed) {
            tracing::warn!(key_type, primitive = %kind, "key generation blocked by registry gate");
            return Err(KeyManagerError::GenerationDisabled(format!(
                "{key_type} is registered with new_key_allowed = false for {kind}"
            )));
        }

        by_kind
            .values()
            .next()
            .map(|entry| Arc::clone(&entry.untyped))
            .ok_or_else(|| KeyManagerError::NotFound(format!("no manager registered for {key_type}")))
    }
}

/// Decides whether `incoming` may replace `existing` for the same
/// (key type, primitive) pair.
fn admit(
    key_type: &str,
    kind: PrimitiveKind,
    existing: &RegistryEntry,
    incoming: &RegistryEntry,
) -> KeyManagerResult<()> {
    if !existing.new_key_allowed {
        return Err(KeyManagerError::Registration(format!(
            "{key_type} ({kind}) is pinned with new_key_allowed = false and cannot be re-registered"
        )));
    }

    if existing.implementation == incoming.implementation {
        if incoming.version < existing.version {
            return Err(KeyManagerError::Registration(format!(
                "{key_type} ({kind}) is registered at version {}; refusing downgrade to {}",
                existing.version, incoming.version
            )));
        }
        return Ok(());
    }

    if incoming.version <= existing.version {
        return Err(KeyManagerError::Registration(format!(
            "{key_type} ({kind}) already registered by a different manager ({} version {}); \
             {} version {} is not newer",
            existing.implementation_name,
            existing.version,
            incoming.implementation_name,
            incoming.version
        )));
    }
    Ok(())
}
