//! Dispatch orchestrator
//!
//! Entry points for mapping a whole entity to and from either wire format.
//! Selects the composite mapper from the entity's class (outgoing) or from
//! the embedded `$type` mark (incoming), runs it inside a fresh root
//! [`Context`], and wraps any failure raised by a mapper with the path,
//! direction and format it happened at.

mod config;
mod stats;

pub use config::MapperConfig;
pub use stats::MapperStats;

use lazy_static::lazy_static;
use log::warn;
use std::sync::Arc;
use tracing::{Level, event, info_span};

use crate::context::Context;
use crate::core::{MapperError, Object, Result, Value};
use crate::registry::TypeRegistry;
use crate::wire::{Format, ScalarCodec, StringCodec, TYPE_MARK, WireValue, parse_type_mark};
use stats::StatsRecorder;

lazy_static! {
    static ref GLOBAL_MAPPER: DataMapper = DataMapper::new(TypeRegistry::global().clone());
}

#[derive(Debug)]
pub struct DataMapper {
    registry: Arc<TypeRegistry>,
    config: MapperConfig,
    stats: StatsRecorder,
}

impl DataMapper {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_config(registry, MapperConfig::default())
    }

    pub fn with_config(registry: Arc<TypeRegistry>, config: MapperConfig) -> Self {
        Self {
            registry,
            config,
            stats: StatsRecorder::default(),
        }
    }

    /// Mapper over [`TypeRegistry::global`].
    pub fn global() -> &'static DataMapper {
        &GLOBAL_MAPPER
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn stats(&self) -> MapperStats {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    pub fn to_db(&self, entity: &Value) -> Result<WireValue> {
        self.to(Format::Db, entity)
    }

    pub fn to_dto(&self, entity: &Value) -> Result<WireValue> {
        self.to(Format::Dto, entity)
    }

    pub fn from_db(&self, value: &WireValue) -> Result<Object> {
        self.from(Format::Db, value)
    }

    pub fn from_dto(&self, value: &WireValue) -> Result<Object> {
        self.from(Format::Dto, value)
    }

    /// `"<Name>@<version>"` for a configured entity instance.
    pub fn type_mark(&self, entity: &Value) -> Result<String> {
        let obj = as_entity(entity)?;
        self.registry.type_mark(obj.class())
    }

    fn to(&self, format: Format, entity: &Value) -> Result<WireValue> {
        let obj = as_entity(entity)?;
        let type_name = obj.class().name();
        if type_name.is_empty() {
            return Err(MapperError::EmptyTypeName);
        }
        self.registry
            .find_entity(type_name)?
            .ok_or_else(|| MapperError::EntityNotConfigured(type_name.to_string()))?;
        let mapper = self
            .registry
            .find_mapper(obj.class())?
            .ok_or_else(|| MapperError::MapperNotRegistered(type_name.to_string()))?;

        let span = info_span!(
            "data_mapper.to",
            format = %format,
            type_name = %type_name
        );
        let _enter = span.enter();

        let mut ctx = Context::to(format, type_name);
        let result = mapper.to(entity, &mut ctx);
        self.finish(result, &ctx)
    }

    fn from(&self, format: Format, value: &WireValue) -> Result<Object> {
        let record = match value {
            WireValue::Null => return Err(MapperError::EmptyValue),
            WireValue::Object(record) => record,
            other => {
                return Err(MapperError::malformed(
                    format,
                    format!("expected an entity record, got {}", other),
                ));
            }
        };
        let wire_mark = record
            .get(TYPE_MARK)
            .filter(|mark| !mark.is_null())
            .ok_or(MapperError::MissingTypeMark)?;

        let mut ctx = Context::from(format, "");
        let mark = StringCodec
            .from(wire_mark, format)?
            .ok_or(MapperError::MissingTypeMark)?;
        ctx.set_prefix(mark.as_str());
        let (type_name, version) = parse_type_mark(&mark)?;

        let entry = self
            .registry
            .find_entity(type_name)?
            .ok_or_else(|| MapperError::EntityNotConfigured(type_name.to_string()))?;
        if entry.version() != version {
            return Err(MapperError::VersionMismatch {
                name: type_name.to_string(),
                found: version,
                registered: entry.version(),
            });
        }
        let mapper = self
            .registry
            .find_mapper(entry.class())?
            .ok_or_else(|| MapperError::MapperNotRegistered(mark.clone()))?;

        let span = info_span!(
            "data_mapper.from",
            format = %format,
            type_name = %type_name,
            version = version
        );
        let _enter = span.enter();

        let result = mapper.from(value, &mut ctx).and_then(|rehydrated| {
            rehydrated.into_object().ok_or_else(|| {
                MapperError::TypeMismatch(format!("'{}' did not rehydrate into an entity", mark))
            })
        });
        self.finish(result, &ctx)
    }

    /// Records the call and wraps a mapper failure with where it happened.
    fn finish<T>(&self, result: Result<T>, ctx: &Context) -> Result<T> {
        let elapsed = ctx.elapsed();
        if self.config.collect_stats {
            self.stats.record(elapsed, result.is_err());
        }
        if self.config.is_slow(elapsed) {
            warn!(
                "Slow mapping of {} {} {}: {:?}",
                ctx.prefix(),
                ctx.direction(),
                ctx.format(),
                elapsed
            );
        }

        result.map_err(|err| {
            let err = MapperError::MappingFailed {
                path: ctx.path(),
                direction: ctx.direction(),
                format: ctx.format(),
                source: Box::new(err),
            };
            event!(Level::ERROR, error = %err, "mapping failed");
            err
        })
    }
}

fn as_entity(entity: &Value) -> Result<&Object> {
    match entity {
        Value::Null => Err(MapperError::EmptyEntity),
        Value::Object(obj) => Ok(obj),
        other => Err(MapperError::NotAnEntity(other.type_name())),
    }
}
