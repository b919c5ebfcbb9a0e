use std::fmt;

use crate::core::Class;

/// Declared type of an attribute or of a container's elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    /// Any single scalar, kept as the kind it was.
    Any,
    /// A configured entity or value type.
    Class(Class),
}

impl FieldType {
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Class(_))
    }
}

impl From<Class> for FieldType {
    fn from(class: Class) -> Self {
        Self::Class(class)
    }
}

impl From<&Class> for FieldType {
    fn from(class: &Class) -> Self {
        Self::Class(class.clone())
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "String"),
            Self::Number => write!(f, "Number"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Any => write!(f, "Any"),
            Self::Class(class) => write!(f, "{}", class),
        }
    }
}
