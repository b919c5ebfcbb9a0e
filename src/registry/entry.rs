use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::compose::{ChainableMapper, ValueConfig};
use crate::context::{Context, Direction};
use crate::core::{Class, MapperError, Object, Result, Scalar};
use crate::wire::{Record, ScalarCodec, StringCodec, TYPE_MARK, format_type_mark};

/// Registered entity type: its class, schema version and the accumulated
/// chain of steps.
#[derive(Debug)]
pub struct EntityEntry {
    class: Class,
    version: AtomicU32,
    mapper: RwLock<ChainableMapper>,
}

impl EntityEntry {
    /// New entry seeded from a snapshot of `parent`, if any.
    pub(crate) fn new(class: Class, parent: Option<&EntityEntry>, default_version: u32) -> Result<Self> {
        let (mapper, version) = match parent {
            Some(parent) => (parent.snapshot()?, parent.version()),
            None => (ChainableMapper::new(), default_version),
        };
        Ok(Self {
            class,
            version: AtomicU32::new(version),
            mapper: RwLock::new(mapper),
        })
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn name(&self) -> &str {
        self.class.name()
    }

    pub fn version(&self) -> u32 {
        self.version.load(Ordering::Acquire)
    }

    pub(crate) fn set_version(&self, version: u32) {
        self.version.store(version, Ordering::Release);
    }

    /// `"<Name>@<version>"`
    pub fn type_mark(&self) -> String {
        format_type_mark(self.name(), self.version())
    }

    /// Copy of the current chain. Runs happen on the copy, never under the lock.
    pub fn snapshot(&self) -> Result<ChainableMapper> {
        Ok(self.mapper.read()?.clone())
    }

    pub(crate) fn chain_step(&self, step: &ChainableMapper) -> Result<()> {
        let mut mapper = self.mapper.write()?;
        *mapper = mapper.chain(step);
        Ok(())
    }

    /// Runs the `to` chain from an empty record and stamps the type mark.
    pub(crate) fn encode(&self, src: &Object, ctx: &mut Context) -> Result<Record> {
        let mapper = self.snapshot()?;
        let mut record = mapper.run_to(src, Record::new(), ctx)?;
        let mark = StringCodec.to(&Some(self.type_mark()), ctx.format())?;
        record.insert(TYPE_MARK.to_string(), mark);
        Ok(record)
    }

    /// Runs the `from` chain against a bare instance of this exact class.
    pub(crate) fn decode(&self, src: &Record, ctx: &mut Context) -> Result<Object> {
        let mapper = self.snapshot()?;
        mapper.run_from(src, self.class.allocate(), ctx)
    }
}

/// Registered value type: its class and the per-direction transforms.
#[derive(Debug)]
pub struct ValueEntry {
    class: Class,
    config: RwLock<ValueConfig>,
}

impl ValueEntry {
    pub(crate) fn new(class: Class, parent: Option<&ValueEntry>) -> Result<Self> {
        let config = match parent {
            Some(parent) => parent.snapshot()?,
            None => ValueConfig::new(),
        };
        Ok(Self {
            class,
            config: RwLock::new(config),
        })
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn name(&self) -> &str {
        self.class.name()
    }

    pub fn snapshot(&self) -> Result<ValueConfig> {
        Ok(self.config.read()?.clone())
    }

    pub(crate) fn override_with(&self, config: &ValueConfig) -> Result<()> {
        let mut current = self.config.write()?;
        *current = current.overridden_by(config);
        Ok(())
    }

    pub(crate) fn encode(&self, src: &Object, ctx: &mut Context) -> Result<Scalar> {
        let config = self.snapshot()?;
        let to = config.to_fn().ok_or_else(|| self.missing(Direction::To))?;
        to(src, ctx)
    }

    /// The result always carries this entry's class, whatever the transform
    /// built it from.
    pub(crate) fn decode(&self, scalar: Scalar, ctx: &mut Context) -> Result<Object> {
        let config = self.snapshot()?;
        let from = config.from_fn().ok_or_else(|| self.missing(Direction::From))?;
        let object = from(scalar, self.class.allocate(), ctx)?;
        Ok(object.rehome(&self.class))
    }

    fn missing(&self, direction: Direction) -> MapperError {
        MapperError::MissingTransform {
            name: self.name().to_string(),
            direction,
        }
    }
}
