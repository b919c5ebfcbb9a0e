use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::Value;

static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Class`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

struct ClassInfo {
    id: ClassId,
    name: String,
    parent: Option<Class>,
}

/// Nominal type of an [`Object`].
///
/// Two classes are equal only if they are the same class; sharing a name is
/// not enough. The parent is fixed at construction, so an ancestor chain can
/// never loop back on itself.
#[derive(Clone)]
pub struct Class(Arc<ClassInfo>);

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self::build(name.into(), None)
    }

    pub fn with_parent(name: impl Into<String>, parent: &Class) -> Self {
        Self::build(name.into(), Some(parent.clone()))
    }

    fn build(name: String, parent: Option<Class>) -> Self {
        let id = ClassId(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed));
        Self(Arc::new(ClassInfo { id, name, parent }))
    }

    pub fn id(&self) -> ClassId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn parent(&self) -> Option<&Class> {
        self.0.parent.as_ref()
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &Class> {
        std::iter::successors(self.parent(), |c| c.parent())
    }

    /// True for the class itself and every descendant of `other`.
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        self == other || self.ancestors().any(|a| a == other)
    }

    /// A bare instance: right class, no fields, nothing initialised.
    pub fn allocate(&self) -> Object {
        Object::new(self.clone())
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Class {}

impl std::hash::Hash for Class {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({}#{})", self.0.name, self.0.id.0)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Instance of a [`Class`] with named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    class: Class,
    fields: BTreeMap<String, Value>,
}

impl Object {
    pub fn new(class: Class) -> Self {
        Self {
            class,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn is_instance_of(&self, class: &Class) -> bool {
        self.class.is_subclass_of(class)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Moves every field into a bare instance of `class`.
    pub fn rehome(self, class: &Class) -> Object {
        Object {
            class: class.clone(),
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_identity_is_not_name() {
        let a = Class::new("Point");
        let b = Class::new("Point");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_ancestors_and_subclassing() {
        let base = Class::new("Base");
        let mid = Class::with_parent("Mid", &base);
        let leaf = Class::with_parent("Leaf", &mid);

        let names: Vec<&str> = leaf.ancestors().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Mid", "Base"]);
        assert!(leaf.is_subclass_of(&base));
        assert!(!base.is_subclass_of(&leaf));
        assert!(leaf.allocate().is_instance_of(&mid));
    }

    #[test]
    fn test_object_distinguishes_missing_from_null() {
        let obj = Class::new("A").allocate().with("x", Value::Null);
        assert!(obj.contains("x"));
        assert_eq!(obj.get("x"), Some(&Value::Null));
        assert_eq!(obj.get("y"), None);
    }
}
