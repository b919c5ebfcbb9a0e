use std::sync::{Arc, Weak};

use crate::compose::Mapper;
use crate::context::Context;
use crate::core::{MapperError, Object, Result, Scalar, Value};
use crate::registry::{EntityEntry, EntityTable, ValueEntry};
use crate::wire::{
    AnyCodec, MAP_TAG, Record, ScalarCodec, StringCodec, TYPE_MARK, WireValue, db_null,
    is_db_null, parse_type_mark, tagged, untag,
};

/// Nested entities are wrapped in `M` in DB format; the root record is not.
fn wraps(ctx: &Context) -> bool {
    !ctx.is_root() && ctx.format().is_db()
}

fn lookup(table: &Weak<EntityTable>, name: &str) -> Result<Option<Arc<EntityEntry>>> {
    match table.upgrade() {
        Some(table) => Ok(table.read()?.get(name).cloned()),
        None => Ok(None),
    }
}

/// Entry that writes `obj`: its own when registered, else the declared one.
fn entry_for_instance(
    declared: &Arc<EntityEntry>,
    table: &Weak<EntityTable>,
    obj: &Object,
) -> Result<Arc<EntityEntry>> {
    if obj.class() == declared.class() {
        return Ok(declared.clone());
    }
    if !obj.is_instance_of(declared.class()) {
        return Err(MapperError::TypeMismatch(format!(
            "expected an instance of {}, got {}",
            declared.name(),
            obj.class()
        )));
    }
    Ok(match lookup(table, obj.class().name())? {
        Some(entry) if entry.class() == obj.class() => entry,
        _ => declared.clone(),
    })
}

/// Entry selected by a nested record's own `$type`, if it carries one.
fn entry_for_record(
    declared: &Arc<EntityEntry>,
    table: &Weak<EntityTable>,
    record: &Record,
    ctx: &Context,
) -> Result<Arc<EntityEntry>> {
    let Some(wire_mark) = record.get(TYPE_MARK) else {
        return Ok(declared.clone());
    };
    let Some(mark) = StringCodec.from(wire_mark, ctx.format())? else {
        return Ok(declared.clone());
    };
    let (name, version) = parse_type_mark(&mark)?;

    let entry = if name == declared.name() {
        declared.clone()
    } else {
        let entry = lookup(table, name)?.ok_or_else(|| MapperError::EntityNotConfigured(name.to_string()))?;
        if !entry.class().is_subclass_of(declared.class()) {
            return Err(MapperError::TypeMismatch(format!(
                "'{}' is not a subtype of {}",
                mark,
                declared.name()
            )));
        }
        entry
    };
    if entry.version() != version {
        return Err(MapperError::VersionMismatch {
            name: name.to_string(),
            found: version,
            registered: entry.version(),
        });
    }
    Ok(entry)
}

/// Composite mapper of an entity type.
///
/// Nested records are polymorphic: a registered subclass instance is written
/// with its own chain and `$type`, and read back through the entry its
/// `$type` names. Null maps to the null convention of the format.
pub(crate) fn entity_mapper(declared: Arc<EntityEntry>, table: Weak<EntityTable>) -> Mapper {
    let (to_declared, to_table) = (declared.clone(), table.clone());
    Mapper::new(
        move |value, ctx| {
            let obj = match value {
                Value::Null => {
                    return Ok(if ctx.format().is_db() { db_null() } else { WireValue::Null });
                }
                Value::Object(obj) => obj,
                other => {
                    return Err(MapperError::TypeMismatch(format!(
                        "expected an instance of {}, got {}",
                        to_declared.name(),
                        other.type_name()
                    )));
                }
            };
            let entry = entry_for_instance(&to_declared, &to_table, obj)?;
            let record = WireValue::Object(entry.encode(obj, ctx)?);
            Ok(if wraps(ctx) { tagged(MAP_TAG, record) } else { record })
        },
        move |wire, ctx| {
            let format = ctx.format();
            // the root is always a record, even one holding a `NULL` attribute
            let is_null = if format.is_db() { is_db_null(wire) } else { wire.is_null() };
            if is_null && !ctx.is_root() {
                return Ok(Value::Null);
            }
            let inner = if wraps(ctx) { untag(wire, MAP_TAG)? } else { wire };
            let record = inner.as_object().ok_or_else(|| {
                MapperError::malformed(format, format!("expected an entity record, got {}", inner))
            })?;
            let entry = if ctx.is_root() {
                declared.clone()
            } else {
                entry_for_record(&declared, &table, record, ctx)?
            };
            Ok(Value::Object(entry.decode(record, ctx)?))
        },
    )
}

/// Composite mapper of a value type. Not polymorphic: the declared entry is
/// used whatever the runtime class, and no `$type` is written.
///
/// Null never reaches the configured transforms: it maps straight to the
/// null convention of the format and back to `Value::Null`.
pub(crate) fn value_mapper(entry: Arc<ValueEntry>) -> Mapper {
    let to_entry = entry.clone();
    Mapper::new(
        move |value, ctx| {
            let scalar = match value {
                Value::Null => Scalar::Null,
                Value::Object(obj) => to_entry.encode(obj, ctx)?,
                other => {
                    return Err(MapperError::TypeMismatch(format!(
                        "expected an instance of {}, got {}",
                        to_entry.name(),
                        other.type_name()
                    )));
                }
            };
            AnyCodec.to(&scalar, ctx.format())
        },
        move |wire, ctx| {
            let scalar = AnyCodec.from(wire, ctx.format())?;
            if scalar.is_null() {
                return Ok(Value::Null);
            }
            Ok(Value::Object(entry.decode(scalar, ctx)?))
        },
    )
}
