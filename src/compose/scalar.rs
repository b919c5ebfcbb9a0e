use crate::compose::Mapper;
use crate::core::{MapperError, Result, Scalar, Value};
use crate::wire::{AnyCodec, BooleanCodec, NumberCodec, ScalarCodec, StringCodec};

fn mismatch(expected: &str, value: &Value) -> MapperError {
    MapperError::TypeMismatch(format!("expected {}, got {}", expected, value.type_name()))
}

fn host_string(value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(mismatch("a string", other)),
    }
}

fn host_number(value: &Value) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(Some(*n)),
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| MapperError::TypeMismatch(format!("'{}' is not a number", s))),
        other => Err(mismatch("a number", other)),
    }
}

fn host_bool(value: &Value) -> Result<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        Value::Number(n) => Ok(Some(*n != 0.0 && !n.is_nan())),
        Value::String(s) => Ok(Some(!s.is_empty())),
        other => Err(mismatch("a boolean", other)),
    }
}

/// String field mapper. Numbers and booleans are stringified on the way out.
pub fn string_mapper() -> Mapper {
    Mapper::new(
        |value, ctx| StringCodec.to(&host_string(value)?, ctx.format()),
        |wire, ctx| Ok(Value::from(StringCodec.from(wire, ctx.format())?)),
    )
}

pub fn number_mapper() -> Mapper {
    Mapper::new(
        |value, ctx| NumberCodec.to(&host_number(value)?, ctx.format()),
        |wire, ctx| Ok(Value::from(NumberCodec.from(wire, ctx.format())?)),
    )
}

pub fn boolean_mapper() -> Mapper {
    Mapper::new(
        |value, ctx| BooleanCodec.to(&host_bool(value)?, ctx.format()),
        |wire, ctx| Ok(Value::from(BooleanCodec.from(wire, ctx.format())?)),
    )
}

/// Mapper for a field holding any single scalar.
pub fn any_mapper() -> Mapper {
    Mapper::new(
        |value, ctx| AnyCodec.to(&Scalar::try_from(value)?, ctx.format()),
        |wire, ctx| Ok(Value::from(AnyCodec.from(wire, ctx.format())?)),
    )
}
