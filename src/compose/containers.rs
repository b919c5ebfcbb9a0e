use std::collections::BTreeMap;

use crate::compose::Mapper;
use crate::context::Context;
use crate::core::{MapperError, Result, Value};
use crate::wire::{LIST_TAG, MAP_TAG, Record, WireValue, db_null, is_db_null, tagged, untag};

/// Host collection an ordered mapper rebuilds on the way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    List,
    Set,
}

impl SequenceKind {
    fn build(self, items: Vec<Value>) -> Value {
        match self {
            Self::List => Value::List(items),
            Self::Set => Value::Set(items),
        }
    }
}

fn null_for(ctx: &Context) -> WireValue {
    if ctx.format().is_db() {
        db_null()
    } else {
        WireValue::Null
    }
}

/// Null check for the incoming side of a container mapper.
fn wire_is_null(wire: &WireValue, ctx: &Context) -> bool {
    if ctx.format().is_db() {
        is_db_null(wire)
    } else {
        wire.is_null()
    }
}

/// Mapper for a list or set whose elements go through `element`.
///
/// Each element is mapped with its index on the path. In DB format the array
/// is wrapped in `L`. Sets keep their iteration order.
pub fn ordered(element: Mapper, kind: SequenceKind) -> Mapper {
    let to_element = element.clone();
    Mapper::new(
        move |value, ctx| {
            if value.is_null() {
                return Ok(null_for(ctx));
            }
            let items = value.as_sequence().ok_or_else(|| {
                MapperError::TypeMismatch(format!("expected a list or set, got {}", value.type_name()))
            })?;
            let mut out = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                out.push(ctx.scoped(idx, |ctx| to_element.to(item, ctx))?);
            }
            let array = WireValue::Array(out);
            Ok(if ctx.format().is_db() {
                tagged(LIST_TAG, array)
            } else {
                array
            })
        },
        move |wire, ctx| {
            if wire_is_null(wire, ctx) {
                return Ok(Value::Null);
            }
            let format = ctx.format();
            let inner = if format.is_db() { untag(wire, LIST_TAG)? } else { wire };
            let items = inner
                .as_array()
                .ok_or_else(|| MapperError::malformed(format, format!("expected an array, got {}", inner)))?;
            let mut out = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                out.push(ctx.scoped(idx, |ctx| element.from(item, ctx))?);
            }
            Ok(kind.build(out))
        },
    )
}

/// Mapper for a string-keyed dictionary whose values go through `element`.
pub fn assoc(element: Mapper) -> Mapper {
    let to_element = element.clone();
    Mapper::new(
        move |value, ctx| {
            if value.is_null() {
                return Ok(null_for(ctx));
            }
            let entries = value.as_map().ok_or_else(|| {
                MapperError::TypeMismatch(format!("expected a dictionary, got {}", value.type_name()))
            })?;
            let mut out = Record::new();
            for (key, item) in entries {
                let encoded = ctx.scoped(key.as_str(), |ctx| to_element.to(item, ctx))?;
                out.insert(key.clone(), encoded);
            }
            let map = WireValue::Object(out);
            Ok(if ctx.format().is_db() {
                tagged(MAP_TAG, map)
            } else {
                map
            })
        },
        move |wire, ctx| {
            if wire_is_null(wire, ctx) {
                return Ok(Value::Null);
            }
            let format = ctx.format();
            let inner = if format.is_db() { untag(wire, MAP_TAG)? } else { wire };
            let entries = inner
                .as_object()
                .ok_or_else(|| MapperError::malformed(format, format!("expected an object, got {}", inner)))?;
            let mut out = BTreeMap::new();
            for (key, item) in entries {
                let decoded = ctx.scoped(key.as_str(), |ctx| element.from(item, ctx))?;
                out.insert(key.clone(), decoded);
            }
            Ok(Value::Map(out))
        },
    )
}
