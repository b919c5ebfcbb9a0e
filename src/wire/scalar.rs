//! Scalar codecs
//!
//! Fixed transform pairs for the primitive kinds. In DB format every value is
//! wrapped in its tag and null becomes `{"NULL": true}`; in DTO format values
//! stay native and only null normalisation and numeric coercion happen.

use super::{
    BOOL_TAG, Format, NUMBER_TAG, STRING_TAG, WireValue, db_null, is_db_null, tagged, untag,
};
use crate::core::{MapperError, Result, Scalar};

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Format-aware encoder/decoder for one primitive kind.
pub trait ScalarCodec: Send + Sync {
    type Host;

    fn to(&self, value: &Self::Host, format: Format) -> Result<WireValue>;

    fn from(&self, wire: &WireValue, format: Format) -> Result<Self::Host>;

    fn to_db(&self, value: &Self::Host) -> Result<WireValue> {
        self.to(value, Format::Db)
    }

    fn to_dto(&self, value: &Self::Host) -> Result<WireValue> {
        self.to(value, Format::Dto)
    }

    fn from_db(&self, wire: &WireValue) -> Result<Self::Host> {
        self.from(wire, Format::Db)
    }

    fn from_dto(&self, wire: &WireValue) -> Result<Self::Host> {
        self.from(wire, Format::Dto)
    }
}

/// JSON number for `n`; integral values are written without a fraction.
pub fn number_to_json(n: f64) -> Result<WireValue> {
    if !n.is_finite() {
        return Err(MapperError::NonFiniteNumber(n));
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Ok(WireValue::from(n as i64));
    }
    serde_json::Number::from_f64(n)
        .map(WireValue::Number)
        .ok_or(MapperError::NonFiniteNumber(n))
}

fn number_to_string(n: f64) -> Result<String> {
    if !n.is_finite() {
        return Err(MapperError::NonFiniteNumber(n));
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Ok((n as i64).to_string())
    } else {
        Ok(n.to_string())
    }
}

fn parse_number(s: &str, format: Format) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| MapperError::malformed(format, format!("'{}' is not a number", s)))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl ScalarCodec for StringCodec {
    type Host = Option<String>;

    fn to(&self, value: &Option<String>, format: Format) -> Result<WireValue> {
        Ok(match (value, format) {
            (None, Format::Db) => db_null(),
            (None, Format::Dto) => WireValue::Null,
            (Some(s), Format::Db) => tagged(STRING_TAG, WireValue::String(s.clone())),
            (Some(s), Format::Dto) => WireValue::String(s.clone()),
        })
    }

    fn from(&self, wire: &WireValue, format: Format) -> Result<Option<String>> {
        match format {
            Format::Db => {
                if is_db_null(wire) {
                    return Ok(None);
                }
                untag(wire, STRING_TAG)?
                    .as_str()
                    .map(|s| Some(s.to_string()))
                    .ok_or_else(|| MapperError::malformed(format, "S tag must hold a string"))
            }
            Format::Dto => match wire {
                WireValue::Null => Ok(None),
                WireValue::String(s) => Ok(Some(s.clone())),
                WireValue::Number(n) => match n.as_f64() {
                    Some(f) => number_to_string(f).map(Some),
                    None => Ok(Some(n.to_string())),
                },
                WireValue::Bool(b) => Ok(Some(b.to_string())),
                other => Err(MapperError::malformed(
                    format,
                    format!("expected a string, got {}", other),
                )),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NumberCodec;

impl ScalarCodec for NumberCodec {
    type Host = Option<f64>;

    fn to(&self, value: &Option<f64>, format: Format) -> Result<WireValue> {
        match (value, format) {
            (None, Format::Db) => Ok(db_null()),
            (None, Format::Dto) => Ok(WireValue::Null),
            (Some(n), Format::Db) => Ok(tagged(NUMBER_TAG, WireValue::String(number_to_string(*n)?))),
            (Some(n), Format::Dto) => number_to_json(*n),
        }
    }

    fn from(&self, wire: &WireValue, format: Format) -> Result<Option<f64>> {
        match format {
            Format::Db => {
                if is_db_null(wire) {
                    return Ok(None);
                }
                match untag(wire, NUMBER_TAG)? {
                    WireValue::String(s) => parse_number(s, format).map(Some),
                    other => Err(MapperError::malformed(
                        format,
                        format!("N tag must hold a numeric string, got {}", other),
                    )),
                }
            }
            Format::Dto => match wire {
                WireValue::Null => Ok(None),
                WireValue::Number(n) => n
                    .as_f64()
                    .map(Some)
                    .ok_or_else(|| MapperError::malformed(format, format!("'{}' is not representable", n))),
                WireValue::String(s) => parse_number(s, format).map(Some),
                WireValue::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
                other => Err(MapperError::malformed(
                    format,
                    format!("expected a number, got {}", other),
                )),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCodec;

impl ScalarCodec for BooleanCodec {
    type Host = Option<bool>;

    fn to(&self, value: &Option<bool>, format: Format) -> Result<WireValue> {
        Ok(match (value, format) {
            (None, Format::Db) => db_null(),
            (None, Format::Dto) => WireValue::Null,
            (Some(b), Format::Db) => tagged(BOOL_TAG, WireValue::Bool(*b)),
            (Some(b), Format::Dto) => WireValue::Bool(*b),
        })
    }

    fn from(&self, wire: &WireValue, format: Format) -> Result<Option<bool>> {
        match format {
            Format::Db => {
                if is_db_null(wire) {
                    return Ok(None);
                }
                untag(wire, BOOL_TAG)?
                    .as_bool()
                    .map(Some)
                    .ok_or_else(|| MapperError::malformed(format, "BOOL tag must hold a boolean"))
            }
            Format::Dto => match wire {
                WireValue::Null => Ok(None),
                WireValue::Bool(b) => Ok(Some(*b)),
                WireValue::Number(n) => Ok(Some(n.as_f64().is_some_and(|f| f != 0.0))),
                WireValue::String(s) => Ok(Some(!s.is_empty())),
                other => Err(MapperError::malformed(
                    format,
                    format!("expected a boolean, got {}", other),
                )),
            },
        }
    }
}

/// Codec for [`Scalar`]; null goes through the numeric branch.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyCodec;

impl ScalarCodec for AnyCodec {
    type Host = Scalar;

    fn to(&self, value: &Scalar, format: Format) -> Result<WireValue> {
        match value {
            Scalar::Null => NumberCodec.to(&None, format),
            Scalar::Number(n) => NumberCodec.to(&Some(*n), format),
            Scalar::Bool(b) => BooleanCodec.to(&Some(*b), format),
            Scalar::String(s) => StringCodec.to(&Some(s.clone()), format),
        }
    }

    fn from(&self, wire: &WireValue, format: Format) -> Result<Scalar> {
        match format {
            Format::Db => {
                if wire.get(NUMBER_TAG).is_some() {
                    return Ok(NumberCodec.from(wire, format)?.map_or(Scalar::Null, Scalar::Number));
                }
                if wire.get(BOOL_TAG).is_some() {
                    return Ok(BooleanCodec.from(wire, format)?.map_or(Scalar::Null, Scalar::Bool));
                }
                Ok(StringCodec.from(wire, format)?.map_or(Scalar::Null, Scalar::String))
            }
            Format::Dto => match wire {
                WireValue::Null => Ok(Scalar::Null),
                WireValue::Number(_) => {
                    Ok(NumberCodec.from(wire, format)?.map_or(Scalar::Null, Scalar::Number))
                }
                WireValue::Bool(b) => Ok(Scalar::Bool(*b)),
                WireValue::String(s) => Ok(Scalar::String(s.clone())),
                other => Err(MapperError::malformed(
                    format,
                    format!("expected a scalar, got {}", other),
                )),
            },
        }
    }
}
