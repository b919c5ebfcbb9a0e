// ============================================================================
// DataMapper Library
// ============================================================================

//! Typed object mapper between in-memory object graphs and two wire
//! formats: a tagged, DynamoDB-item-like `DB` format and plain JSON `DTO`.
//!
//! Every entity record carries a `$type` mark (`"<Name>@<version>"`) so the
//! concrete class can be rebuilt without outside schema hints.
//!
//! ```
//! use std::sync::Arc;
//! use data_mapper::{Class, DataMapper, FieldType, TypeRegistry, Value};
//! use serde_json::json;
//!
//! # fn main() -> data_mapper::Result<()> {
//! let registry = Arc::new(TypeRegistry::new());
//! let point = Class::new("Point");
//! registry.configure_attribute(&point, "x", "x", FieldType::Number)?;
//! registry.configure_attribute(&point, "y", "y", FieldType::Number)?;
//!
//! let mapper = DataMapper::new(registry);
//! let p = Value::from(point.allocate().with("x", 1).with("y", 2));
//!
//! let dto = mapper.to_dto(&p)?;
//! assert_eq!(dto, json!({"x": 1, "y": 2, "$type": "Point@1"}));
//! assert_eq!(Value::from(mapper.from_dto(&dto)?), p);
//! # Ok(())
//! # }
//! ```

pub mod compose;
pub mod context;
pub mod core;
pub mod mapper;
pub mod prelude;
pub mod registry;
pub mod wire;

// Re-export main types for convenience
pub use core::{Class, ClassId, MapperError, Object, Result, Scalar, Value};
pub use context::{Context, Direction, PathSegment};
pub use compose::{ChainableMapper, EntityConfig, Mapper, SequenceKind, ValueConfig};
pub use mapper::{DataMapper, MapperConfig, MapperStats};
pub use registry::{EntityEntry, FieldType, TypeRegistry, ValueEntry};
pub use wire::{Format, Record, WireValue};
