use thiserror::Error;

use crate::context::Direction;
use crate::wire::Format;

#[derive(Error, Debug)]
pub enum MapperError {
    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------
    #[error("Two different types are registered under the same name '{0}'")]
    NameCollision(String),

    #[error("Type '{name}' is already registered as {existing}")]
    KindConflict { name: String, existing: &'static str },

    #[error("No mapper is found for '{0}'. If it is an entity or a value, please configure it first")]
    MissingMapper(String),

    #[error("Invalid {what} for '{owner}': names must not be empty")]
    InvalidName { what: &'static str, owner: String },

    #[error("No entity configuration was found for type '{0}'. Please make sure the type is configured")]
    EntityNotConfigured(String),

    #[error("No mapper was found for '{0}', though the entity configuration was found")]
    MapperNotRegistered(String),

    // ------------------------------------------------------------------
    // Malformed input
    // ------------------------------------------------------------------
    #[error("Cannot map an empty entity")]
    EmptyEntity,

    #[error("Cannot map a {0} value as an entity")]
    NotAnEntity(&'static str),

    #[error("Cannot map an entity with an empty type name")]
    EmptyTypeName,

    #[error("Cannot rehydrate an empty value")]
    EmptyValue,

    #[error("No type mark ($type) property was found on the value")]
    MissingTypeMark,

    #[error("Invalid type mark '{0}', expected '<TypeName>@<version>'")]
    InvalidTypeMark(String),

    #[error("Entity version mismatch for '{name}': value has version {found}, registered version is {registered}")]
    VersionMismatch {
        name: String,
        found: u32,
        registered: u32,
    },

    // ------------------------------------------------------------------
    // Mapper execution
    // ------------------------------------------------------------------
    #[error("Malformed {format} input: {message}")]
    MalformedInput { format: Format, message: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Cannot encode non-finite number {0}")]
    NonFiniteNumber(f64),

    #[error("Value type '{name}' has no '{direction}' transform configured")]
    MissingTransform { name: String, direction: Direction },

    #[error("{0}")]
    Custom(String),

    #[error("Mapper has thrown an error. Cannot map {path} {direction} {format}, reason: {source}")]
    MappingFailed {
        path: String,
        direction: Direction,
        format: Format,
        #[source]
        source: Box<MapperError>,
    },

    #[error("Lock error: {0}")]
    LockError(String),
}

impl MapperError {
    /// Error raised from a user supplied transform.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    pub(crate) fn malformed(format: Format, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            format,
            message: message.into(),
        }
    }

    /// The innermost error of a `MappingFailed` chain.
    pub fn root_cause(&self) -> &MapperError {
        match self {
            Self::MappingFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Configuration errors are raised while types are being configured,
    /// never while a value is being mapped.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NameCollision(_)
                | Self::KindConflict { .. }
                | Self::MissingMapper(_)
                | Self::InvalidName { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MapperError>;

impl<T> From<std::sync::PoisonError<T>> for MapperError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_chain() {
        let err = MapperError::MappingFailed {
            path: "Point.x".to_string(),
            direction: Direction::To,
            format: Format::Db,
            source: Box::new(MapperError::NonFiniteNumber(f64::INFINITY)),
        };

        assert!(matches!(err.root_cause(), MapperError::NonFiniteNumber(_)));
        assert_eq!(
            err.to_string(),
            "Mapper has thrown an error. Cannot map Point.x to DB, reason: Cannot encode non-finite number inf"
        );
    }

    #[test]
    fn test_configuration_errors() {
        assert!(MapperError::NameCollision("A".into()).is_configuration());
        assert!(!MapperError::MissingTypeMark.is_configuration());
    }
}
