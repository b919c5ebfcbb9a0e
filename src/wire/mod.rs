//! Wire representations
//!
//! Both formats are carried as `serde_json::Value`:
//!
//! - `Format::Db` - DynamoDB-item shape, every value wrapped in a tag
//!   (`{"S": ..}`, `{"N": "1"}`, `{"BOOL": true}`, `{"NULL": true}`,
//!   `{"M": {..}}`, `{"L": [..]}`)
//! - `Format::Dto` - plain JSON, only entity records carry a `$type` marker

mod scalar;

pub use scalar::{
    AnyCodec, BooleanCodec, NumberCodec, ScalarCodec, StringCodec, number_to_json,
};

use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::fmt;

use crate::core::{MapperError, Result};

pub type WireValue = serde_json::Value;
/// A wire object: the accumulator entity steps write into.
pub type Record = Map<String, WireValue>;

pub const NULL_TAG: &str = "NULL";
pub const STRING_TAG: &str = "S";
pub const NUMBER_TAG: &str = "N";
pub const BOOL_TAG: &str = "BOOL";
pub const MAP_TAG: &str = "M";
pub const LIST_TAG: &str = "L";
pub const TYPE_MARK: &str = "$type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    #[serde(rename = "DB")]
    Db,
    #[serde(rename = "DTO")]
    Dto,
}

impl Format {
    pub fn is_db(self) -> bool {
        matches!(self, Self::Db)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Db => write!(f, "DB"),
            Self::Dto => write!(f, "DTO"),
        }
    }
}

/// `{"NULL": true}`
pub fn db_null() -> WireValue {
    tagged(NULL_TAG, WireValue::Bool(true))
}

/// Null check by presence of the `NULL` key, not by value equality.
pub fn is_db_null(value: &WireValue) -> bool {
    value
        .as_object()
        .is_some_and(|m| m.contains_key(NULL_TAG))
}

/// `{tag: inner}`
pub fn tagged(tag: &str, inner: WireValue) -> WireValue {
    let mut map = Map::with_capacity(1);
    map.insert(tag.to_string(), inner);
    WireValue::Object(map)
}

/// Inner value of a DB-tagged wrapper, failing if `tag` is not present.
pub fn untag<'a>(value: &'a WireValue, tag: &str) -> Result<&'a WireValue> {
    value.get(tag).ok_or_else(|| {
        MapperError::malformed(
            Format::Db,
            format!("expected a '{}' tagged value, got {}", tag, value),
        )
    })
}

/// Splits `"<TypeName>@<version>"`.
pub fn parse_type_mark(mark: &str) -> Result<(&str, u32)> {
    let (name, version) = mark
        .rsplit_once('@')
        .ok_or_else(|| MapperError::InvalidTypeMark(mark.to_string()))?;
    if name.is_empty() {
        return Err(MapperError::InvalidTypeMark(mark.to_string()));
    }
    let version = version
        .parse::<u32>()
        .map_err(|_| MapperError::InvalidTypeMark(mark.to_string()))?;
    Ok((name, version))
}

pub fn format_type_mark(name: &str, version: u32) -> String {
    format!("{}@{}", name, version)
}
