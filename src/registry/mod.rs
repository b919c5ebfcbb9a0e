//! Type registry
//!
//! Entity and value configurations keyed by nominal type name. An entry is
//! created on first reference, seeded with a snapshot of its parent's
//! accumulated transforms, and then only ever extended. Alongside the entries
//! the registry keeps the by-class table of composite mappers used by the
//! orchestrator and by nested fields, plus per-element caches of container
//! mappers.

mod entry;
mod field_type;

pub use entry::{EntityEntry, ValueEntry};
pub use field_type::FieldType;

use lazy_static::lazy_static;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::compose::{
    ChainableMapper, EntityConfig, Mapper, SequenceKind, ValueConfig, any_mapper, assoc,
    boolean_mapper, entity_mapper, field, number_mapper, ordered, string_mapper, value_mapper,
};
use crate::core::{Class, ClassId, MapperError, Result};

pub(crate) type EntityTable = RwLock<HashMap<String, Arc<EntityEntry>>>;

pub const DEFAULT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Container {
    List,
    Set,
    Dictionary,
}

lazy_static! {
    static ref GLOBAL_REGISTRY: Arc<TypeRegistry> = Arc::new(TypeRegistry::new());
}

pub struct TypeRegistry {
    entities: Arc<EntityTable>,
    values: RwLock<HashMap<String, Arc<ValueEntry>>>,
    mappers: RwLock<HashMap<ClassId, Mapper>>,
    containers: RwLock<HashMap<(Container, FieldType), Mapper>>,
    default_version: u32,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::with_default_version(DEFAULT_VERSION)
    }

    /// Registry whose entities start at `version` unless configured otherwise.
    pub fn with_default_version(version: u32) -> Self {
        Self {
            entities: Arc::new(RwLock::new(HashMap::new())),
            values: RwLock::new(HashMap::new()),
            mappers: RwLock::new(HashMap::new()),
            containers: RwLock::new(HashMap::new()),
            default_version: version,
        }
    }

    /// Process-wide registry shared by [`DataMapper::global`](crate::DataMapper::global).
    pub fn global() -> &'static Arc<TypeRegistry> {
        &GLOBAL_REGISTRY
    }

    pub fn default_version(&self) -> u32 {
        self.default_version
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn find_entity(&self, name: &str) -> Result<Option<Arc<EntityEntry>>> {
        Ok(self.entities.read()?.get(name).cloned())
    }

    pub fn find_value(&self, name: &str) -> Result<Option<Arc<ValueEntry>>> {
        Ok(self.values.read()?.get(name).cloned())
    }

    /// Composite mapper registered for exactly `class`.
    pub fn find_mapper(&self, class: &Class) -> Result<Option<Mapper>> {
        Ok(self.mappers.read()?.get(&class.id()).cloned())
    }

    /// Element mapper for a declared field type.
    pub fn mapper_for(&self, field_type: &FieldType) -> Result<Mapper> {
        match field_type {
            FieldType::String => Ok(string_mapper()),
            FieldType::Number => Ok(number_mapper()),
            FieldType::Boolean => Ok(boolean_mapper()),
            FieldType::Any => Ok(any_mapper()),
            FieldType::Class(class) => self
                .find_mapper(class)?
                .ok_or_else(|| MapperError::MissingMapper(class.name().to_string())),
        }
    }

    pub fn is_entity(&self, class: &Class) -> Result<bool> {
        Ok(self
            .find_entity(class.name())?
            .is_some_and(|e| e.class() == class))
    }

    pub fn is_value(&self, class: &Class) -> Result<bool> {
        Ok(self
            .find_value(class.name())?
            .is_some_and(|e| e.class() == class))
    }

    /// `"<Name>@<version>"` of a configured entity class.
    pub fn type_mark(&self, class: &Class) -> Result<String> {
        if class.name().is_empty() {
            return Err(MapperError::EmptyTypeName);
        }
        let entry = self
            .find_entity(class.name())?
            .ok_or_else(|| MapperError::EntityNotConfigured(class.name().to_string()))?;
        if entry.class() != class {
            return Err(MapperError::NameCollision(class.name().to_string()));
        }
        Ok(entry.type_mark())
    }

    // ------------------------------------------------------------------
    // Entries
    // ------------------------------------------------------------------

    /// Entity entry of `class`, created (with its ancestors) on first use.
    pub fn entity_entry(&self, class: &Class) -> Result<Arc<EntityEntry>> {
        let name = valid_type_name(class)?;
        if let Some(entry) = self.find_entity(name)? {
            return owned_by(entry, class);
        }
        if self.find_value(name)?.is_some() {
            return Err(MapperError::KindConflict {
                name: name.to_string(),
                existing: "a value",
            });
        }

        let parent = match class.parent() {
            Some(parent) => Some(self.entity_entry(parent)?),
            None => None,
        };
        let created = Arc::new(EntityEntry::new(
            class.clone(),
            parent.as_deref(),
            self.default_version,
        )?);

        // lock order: mappers, entities, values
        let entry = {
            let mut mappers = self.mappers.write()?;
            let mut entities = self.entities.write()?;
            if let Some(existing) = entities.get(name) {
                return owned_by(existing.clone(), class);
            }
            if self.values.read()?.contains_key(name) {
                return Err(MapperError::KindConflict {
                    name: name.to_string(),
                    existing: "a value",
                });
            }
            mappers
                .entry(class.id())
                .or_insert_with(|| entity_mapper(created.clone(), Arc::downgrade(&self.entities)));
            entities.insert(name.to_string(), created.clone());
            created
        };

        match &parent {
            Some(parent) => debug!(
                "Registered entity {} seeded from {} ({})",
                name,
                parent.name(),
                entry.type_mark()
            ),
            None => debug!("Registered entity {} ({})", name, entry.type_mark()),
        }
        Ok(entry)
    }

    /// Value entry of `class`, created (with its ancestors) on first use.
    pub fn value_entry(&self, class: &Class) -> Result<Arc<ValueEntry>> {
        let name = valid_type_name(class)?;
        if let Some(entry) = self.find_value(name)? {
            return owned_by(entry, class);
        }
        if self.find_entity(name)?.is_some() {
            return Err(MapperError::KindConflict {
                name: name.to_string(),
                existing: "an entity",
            });
        }

        let parent = match class.parent() {
            Some(parent) => Some(self.value_entry(parent)?),
            None => None,
        };
        let created = Arc::new(ValueEntry::new(class.clone(), parent.as_deref())?);

        let entry = {
            let mut mappers = self.mappers.write()?;
            let entities = self.entities.read()?;
            let mut values = self.values.write()?;
            if let Some(existing) = values.get(name) {
                return owned_by(existing.clone(), class);
            }
            if entities.contains_key(name) {
                return Err(MapperError::KindConflict {
                    name: name.to_string(),
                    existing: "an entity",
                });
            }
            mappers
                .entry(class.id())
                .or_insert_with(|| value_mapper(created.clone()));
            values.insert(name.to_string(), created.clone());
            created
        };

        debug!("Registered value {}", name);
        Ok(entry)
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Chains an entity-level step and applies the optional version.
    pub fn configure_entity(&self, class: &Class, config: EntityConfig) -> Result<()> {
        let entry = self.entity_entry(class)?;
        if let Some(version) = config.version() {
            entry.set_version(version);
        }
        if !config.mapper().is_empty() {
            entry.chain_step(config.mapper())?;
        }
        Ok(())
    }

    /// Replaces the inherited transform for each direction `config` provides.
    pub fn configure_value(&self, class: &Class, config: ValueConfig) -> Result<()> {
        let entry = self.value_entry(class)?;
        if !config.is_empty() {
            entry.override_with(&config)?;
        }
        Ok(())
    }

    pub fn configure_attribute(
        &self,
        class: &Class,
        property: &str,
        wire_name: &str,
        field_type: impl Into<FieldType>,
    ) -> Result<()> {
        validate_names(class, property, wire_name)?;
        // the entry must exist before the element lookup so a type can hold itself
        let entry = self.entity_entry(class)?;
        let element = self.mapper_for(&field_type.into())?;
        entry.chain_step(&field(property, wire_name, element))
    }

    /// Chains a fully custom step onto the entity.
    pub fn configure_attribute_with_custom_mapper(
        &self,
        class: &Class,
        mapper: ChainableMapper,
    ) -> Result<()> {
        let entry = self.entity_entry(class)?;
        if !mapper.is_empty() {
            entry.chain_step(&mapper)?;
        }
        Ok(())
    }

    pub fn configure_list_attribute(
        &self,
        class: &Class,
        property: &str,
        wire_name: &str,
        element: impl Into<FieldType>,
    ) -> Result<()> {
        self.configure_container(Container::List, class, property, wire_name, element.into())
    }

    pub fn configure_set_attribute(
        &self,
        class: &Class,
        property: &str,
        wire_name: &str,
        element: impl Into<FieldType>,
    ) -> Result<()> {
        self.configure_container(Container::Set, class, property, wire_name, element.into())
    }

    pub fn configure_dictionary_attribute(
        &self,
        class: &Class,
        property: &str,
        wire_name: &str,
        element: impl Into<FieldType>,
    ) -> Result<()> {
        self.configure_container(Container::Dictionary, class, property, wire_name, element.into())
    }

    fn configure_container(
        &self,
        container: Container,
        class: &Class,
        property: &str,
        wire_name: &str,
        element: FieldType,
    ) -> Result<()> {
        validate_names(class, property, wire_name)?;
        let entry = self.entity_entry(class)?;
        let mapper = self.container_mapper(container, element)?;
        entry.chain_step(&field(property, wire_name, mapper))
    }

    fn container_mapper(&self, container: Container, element: FieldType) -> Result<Mapper> {
        let key = (container, element);
        if let Some(mapper) = self.containers.read()?.get(&key) {
            return Ok(mapper.clone());
        }
        let element_mapper = self.mapper_for(&key.1)?;
        let mapper = match container {
            Container::List => ordered(element_mapper, SequenceKind::List),
            Container::Set => ordered(element_mapper, SequenceKind::Set),
            Container::Dictionary => assoc(element_mapper),
        };
        debug!("Cached {:?} mapper for {}", container, key.1);
        Ok(self.containers.write()?.entry(key).or_insert(mapper).clone())
    }

    /// Drops every entry, composite mapper and container cache.
    pub fn clear(&self) -> Result<()> {
        {
            let mut mappers = self.mappers.write()?;
            let mut entities = self.entities.write()?;
            let mut values = self.values.write()?;
            mappers.clear();
            entities.clear();
            values.clear();
        }
        self.containers.write()?.clear();
        debug!("Type registry cleared");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn replace_mapper(&self, class: &Class, mapper: Mapper) -> Result<()> {
        self.mappers.write()?.insert(class.id(), mapper);
        Ok(())
    }

    pub fn entity_count(&self) -> Result<usize> {
        Ok(self.entities.read()?.len())
    }

    pub fn value_count(&self) -> Result<usize> {
        Ok(self.values.read()?.len())
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("default_version", &self.default_version)
            .finish_non_exhaustive()
    }
}

fn valid_type_name(class: &Class) -> Result<&str> {
    let name = class.name();
    if name.is_empty() {
        return Err(MapperError::InvalidName {
            what: "type name",
            owner: format!("{:?}", class),
        });
    }
    Ok(name)
}

fn validate_names(class: &Class, property: &str, wire_name: &str) -> Result<()> {
    if property.is_empty() {
        return Err(MapperError::InvalidName {
            what: "property name",
            owner: class.name().to_string(),
        });
    }
    if wire_name.is_empty() {
        return Err(MapperError::InvalidName {
            what: "wire name",
            owner: format!("{}.{}", class.name(), property),
        });
    }
    Ok(())
}

/// The entry if it belongs to `class`; another class with the same name is a
/// collision.
fn owned_by<E: Owned>(entry: Arc<E>, class: &Class) -> Result<Arc<E>> {
    if entry.owner() == class {
        Ok(entry)
    } else {
        Err(MapperError::NameCollision(class.name().to_string()))
    }
}

trait Owned {
    fn owner(&self) -> &Class;
}

impl Owned for EntityEntry {
    fn owner(&self) -> &Class {
        self.class()
    }
}

impl Owned for ValueEntry {
    fn owner(&self) -> &Class {
        self.class()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_entry_is_memoised() {
        let registry = TypeRegistry::new();
        let point = Class::new("Point");
        let a = registry.entity_entry(&point).unwrap();
        let b = registry.entity_entry(&point).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(registry.find_mapper(&point).unwrap().is_some());
        assert!(registry.is_entity(&point).unwrap());
    }

    #[test]
    fn test_name_collision() {
        let registry = TypeRegistry::new();
        registry.entity_entry(&Class::new("Point")).unwrap();
        let err = registry.entity_entry(&Class::new("Point")).unwrap_err();
        assert!(matches!(err, MapperError::NameCollision(ref n) if n == "Point"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_kind_conflict() {
        let registry = TypeRegistry::new();
        let id = Class::new("Id");
        registry.value_entry(&id).unwrap();
        assert!(matches!(
            registry.entity_entry(&id),
            Err(MapperError::KindConflict { existing: "a value", .. })
        ));
    }

    #[test]
    fn test_entry_is_never_visible_without_its_mapper() {
        for _ in 0..200 {
            let registry = TypeRegistry::new();
            let target = Class::new("Target");
            std::thread::scope(|s| {
                for i in 0..4 {
                    let (registry, target) = (&registry, &target);
                    s.spawn(move || {
                        let entry = registry.entity_entry(target).unwrap();
                        assert!(registry.find_mapper(entry.class()).unwrap().is_some());
                        let holder = Class::new(format!("Holder{}", i));
                        registry.configure_attribute(&holder, "t", "t", target).unwrap();
                    });
                }
            });
        }
    }

    #[test]
    fn test_racing_kinds_register_once() {
        for _ in 0..200 {
            let registry = TypeRegistry::new();
            let shared = Class::new("Shared");
            let (as_entity, as_value) = std::thread::scope(|s| {
                let entity = s.spawn(|| registry.entity_entry(&shared).map(|_| ()));
                let value = s.spawn(|| registry.value_entry(&shared).map(|_| ()));
                (entity.join().unwrap(), value.join().unwrap())
            });
            assert!(as_entity.is_ok() != as_value.is_ok());
            for err in [as_entity, as_value].into_iter().filter_map(|r| r.err()) {
                assert!(matches!(err, MapperError::KindConflict { .. }));
            }
            assert_eq!(registry.entity_count().unwrap() + registry.value_count().unwrap(), 1);
        }
    }

    #[test]
    fn test_ancestors_are_registered() {
        let registry = TypeRegistry::with_default_version(2);
        let base = Class::new("Base");
        let leaf = Class::with_parent("Leaf", &Class::with_parent("Mid", &base));
        registry.entity_entry(&leaf).unwrap();
        assert_eq!(registry.entity_count().unwrap(), 3);
        assert_eq!(registry.type_mark(&base).unwrap(), "Base@2");
    }

    #[test]
    fn test_missing_mapper_for_unconfigured_type() {
        let registry = TypeRegistry::new();
        let owner = Class::new("Owner");
        let err = registry
            .configure_attribute(&owner, "tag", "tag", Class::new("Unknown"))
            .unwrap_err();
        assert!(matches!(err, MapperError::MissingMapper(ref n) if n == "Unknown"));
    }

    #[test]
    fn test_invalid_names() {
        let registry = TypeRegistry::new();
        let owner = Class::new("Owner");
        assert!(matches!(
            registry.configure_attribute(&owner, "", "x", FieldType::String),
            Err(MapperError::InvalidName { what: "property name", .. })
        ));
        assert!(matches!(
            registry.configure_list_attribute(&owner, "x", "", FieldType::String),
            Err(MapperError::InvalidName { what: "wire name", .. })
        ));
        assert!(matches!(
            registry.entity_entry(&Class::new("")),
            Err(MapperError::InvalidName { what: "type name", .. })
        ));
    }

    #[test]
    fn test_container_mappers_are_cached() {
        let registry = TypeRegistry::new();
        registry.container_mapper(Container::List, FieldType::Number).unwrap();
        registry.container_mapper(Container::List, FieldType::Number).unwrap();
        assert_eq!(registry.containers.read().unwrap().len(), 1);
        registry.container_mapper(Container::Set, FieldType::Number).unwrap();
        assert_eq!(registry.containers.read().unwrap().len(), 2);
    }

    #[test]
    fn test_clear() {
        let registry = TypeRegistry::new();
        let point = Class::new("Point");
        registry.configure_attribute(&point, "x", "x", FieldType::Number).unwrap();
        registry.clear().unwrap();
        assert_eq!(registry.entity_count().unwrap(), 0);
        assert!(registry.find_mapper(&point).unwrap().is_none());
        assert!(matches!(
            registry.type_mark(&point),
            Err(MapperError::EntityNotConfigured(_))
        ));
    }
}
