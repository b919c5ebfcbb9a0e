//! Recommended API entrypoints grouped by abstraction level.
//!
//! `dx` covers configuring types and mapping entities. `advanced` exposes the
//! composition building blocks for hand-written transforms.

pub mod dx {
    //! Stable high-level surface.
    //!
    //! Intended usage in app code:
    //! - describe classes with `Class` and configure them on a `TypeRegistry`,
    //! - map instances with `DataMapper`.
    pub use crate::{
        Class, DataMapper, EntityConfig, FieldType, MapperConfig, MapperError, Object, Result,
        Scalar, TypeRegistry, Value, ValueConfig,
    };
}

pub mod advanced {
    //! Building blocks for custom chain steps and codecs.
    pub use crate::compose::{
        ChainableMapper, Mapper, SequenceKind, any_mapper, assoc, boolean_mapper, chain, field,
        number_mapper, ordered, string_mapper,
    };
    pub use crate::context::{Context, Direction, PathSegment};
    pub use crate::wire::{
        AnyCodec, BooleanCodec, Format, NumberCodec, Record, ScalarCodec, StringCodec, WireValue,
    };
}
