//! Mapper composition
//!
//! - `Mapper` - plain transform pair used for leaves and whole values
//! - `ChainableMapper` - accumulator-passing pair, one per entity type
//! - `ValueConfig` - per-direction transform of a value type
//! - `field`, `ordered`, `assoc` - combinators building the above
//! - `string_mapper` and friends - leaf mappers over the scalar codecs
//! - `entity_mapper`, `value_mapper` - composites served from the registry

mod composite;
mod containers;
mod field;
mod scalar;

pub(crate) use composite::{entity_mapper, value_mapper};
pub use containers::{SequenceKind, assoc, ordered};
pub use field::field;
pub use scalar::{any_mapper, boolean_mapper, number_mapper, string_mapper};

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::core::{Object, Result, Scalar, Value};
use crate::wire::{Record, WireValue};

pub type ToFn = dyn Fn(&Value, &mut Context) -> Result<WireValue> + Send + Sync;
pub type FromFn = dyn Fn(&WireValue, &mut Context) -> Result<Value> + Send + Sync;

/// Transform pair between an in-memory value and its wire form.
#[derive(Clone)]
pub struct Mapper {
    to: Arc<ToFn>,
    from: Arc<FromFn>,
}

impl Mapper {
    pub fn new<T, F>(to: T, from: F) -> Self
    where
        T: Fn(&Value, &mut Context) -> Result<WireValue> + Send + Sync + 'static,
        F: Fn(&WireValue, &mut Context) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            to: Arc::new(to),
            from: Arc::new(from),
        }
    }

    pub fn to(&self, value: &Value, ctx: &mut Context) -> Result<WireValue> {
        (self.to)(value, ctx)
    }

    pub fn from(&self, wire: &WireValue, ctx: &mut Context) -> Result<Value> {
        (self.from)(wire, ctx)
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper").finish_non_exhaustive()
    }
}

pub type ChainToFn = dyn Fn(&Object, Record, &mut Context) -> Result<Record> + Send + Sync;
pub type ChainFromFn = dyn Fn(&Record, Object, &mut Context) -> Result<Object> + Send + Sync;

/// Accumulator-passing transform pair of an entity type.
///
/// `to` gets the source object and the record built so far; `from` gets the
/// source record and the instance built so far. A missing direction passes
/// the accumulator through untouched.
#[derive(Clone, Default)]
pub struct ChainableMapper {
    to: Option<Arc<ChainToFn>>,
    from: Option<Arc<ChainFromFn>>,
}

impl ChainableMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_to<F>(mut self, f: F) -> Self
    where
        F: Fn(&Object, Record, &mut Context) -> Result<Record> + Send + Sync + 'static,
    {
        self.to = Some(Arc::new(f));
        self
    }

    pub fn with_from<F>(mut self, f: F) -> Self
    where
        F: Fn(&Record, Object, &mut Context) -> Result<Object> + Send + Sync + 'static,
    {
        self.from = Some(Arc::new(f));
        self
    }

    pub fn has_to(&self) -> bool {
        self.to.is_some()
    }

    pub fn has_from(&self) -> bool {
        self.from.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.to.is_none() && self.from.is_none()
    }

    /// `self` followed by `addition`, per direction.
    ///
    /// The addition sees the original source and the accumulator produced by
    /// `self`. Where `self` has no function for a direction, the addition's
    /// function is used as is.
    pub fn chain(&self, addition: &ChainableMapper) -> ChainableMapper {
        let to = match (&self.to, &addition.to) {
            (Some(prev), Some(next)) => {
                let (prev, next) = (prev.clone(), next.clone());
                Some(Arc::new(move |src: &Object, acc: Record, ctx: &mut Context| {
                    let acc = prev(src, acc, ctx)?;
                    next(src, acc, ctx)
                }) as Arc<ChainToFn>)
            }
            (None, Some(next)) => Some(next.clone()),
            (prev, None) => prev.clone(),
        };
        let from = match (&self.from, &addition.from) {
            (Some(prev), Some(next)) => {
                let (prev, next) = (prev.clone(), next.clone());
                Some(Arc::new(move |src: &Record, acc: Object, ctx: &mut Context| {
                    let acc = prev(src, acc, ctx)?;
                    next(src, acc, ctx)
                }) as Arc<ChainFromFn>)
            }
            (None, Some(next)) => Some(next.clone()),
            (prev, None) => prev.clone(),
        };
        ChainableMapper { to, from }
    }

    pub fn run_to(&self, src: &Object, acc: Record, ctx: &mut Context) -> Result<Record> {
        match &self.to {
            Some(f) => f(src, acc, ctx),
            None => Ok(acc),
        }
    }

    pub fn run_from(&self, src: &Record, acc: Object, ctx: &mut Context) -> Result<Object> {
        match &self.from {
            Some(f) => f(src, acc, ctx),
            None => Ok(acc),
        }
    }
}

impl fmt::Debug for ChainableMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainableMapper")
            .field("to", &self.to.is_some())
            .field("from", &self.from.is_some())
            .finish()
    }
}

/// Free-function form of [`ChainableMapper::chain`].
pub fn chain(existing: &ChainableMapper, addition: &ChainableMapper) -> ChainableMapper {
    existing.chain(addition)
}

pub type ValueToFn = dyn Fn(&Object, &mut Context) -> Result<Scalar> + Send + Sync;
pub type ValueFromFn = dyn Fn(Scalar, Object, &mut Context) -> Result<Object> + Send + Sync;

/// Transforms of a value type: one function per direction, no chaining.
///
/// `from` receives the decoded scalar and a bare instance of the declared
/// value type.
#[derive(Clone, Default)]
pub struct ValueConfig {
    to: Option<Arc<ValueToFn>>,
    from: Option<Arc<ValueFromFn>>,
}

impl ValueConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_to<F>(mut self, f: F) -> Self
    where
        F: Fn(&Object, &mut Context) -> Result<Scalar> + Send + Sync + 'static,
    {
        self.to = Some(Arc::new(f));
        self
    }

    pub fn with_from<F>(mut self, f: F) -> Self
    where
        F: Fn(Scalar, Object, &mut Context) -> Result<Object> + Send + Sync + 'static,
    {
        self.from = Some(Arc::new(f));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.to.is_none() && self.from.is_none()
    }

    /// Directions present in `other` replace ours; the rest are kept.
    pub fn overridden_by(&self, other: &ValueConfig) -> ValueConfig {
        ValueConfig {
            to: other.to.clone().or_else(|| self.to.clone()),
            from: other.from.clone().or_else(|| self.from.clone()),
        }
    }

    pub(crate) fn to_fn(&self) -> Option<&Arc<ValueToFn>> {
        self.to.as_ref()
    }

    pub(crate) fn from_fn(&self) -> Option<&Arc<ValueFromFn>> {
        self.from.as_ref()
    }
}

impl fmt::Debug for ValueConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueConfig")
            .field("to", &self.to.is_some())
            .field("from", &self.from.is_some())
            .finish()
    }
}

/// Entity-level configuration: an extra chain step and an optional schema
/// version.
#[derive(Clone, Default, Debug)]
pub struct EntityConfig {
    mapper: ChainableMapper,
    version: Option<u32>,
}

impl EntityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_to<F>(mut self, f: F) -> Self
    where
        F: Fn(&Object, Record, &mut Context) -> Result<Record> + Send + Sync + 'static,
    {
        self.mapper = self.mapper.with_to(f);
        self
    }

    pub fn with_from<F>(mut self, f: F) -> Self
    where
        F: Fn(&Record, Object, &mut Context) -> Result<Object> + Send + Sync + 'static,
    {
        self.mapper = self.mapper.with_from(f);
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn mapper(&self) -> &ChainableMapper {
        &self.mapper
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }
}
