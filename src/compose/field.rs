use std::sync::Arc;

use crate::compose::{ChainableMapper, Mapper};
use crate::context::Context;
use crate::core::Object;
use crate::wire::Record;

/// Chain step copying one property to and from its wire name.
///
/// A property missing from the source is skipped; one holding null goes
/// through `element` like any other value. Keys already in the accumulator
/// are never removed.
pub fn field(
    property: impl Into<String>,
    wire_name: impl Into<String>,
    element: Mapper,
) -> ChainableMapper {
    let property: Arc<str> = Arc::from(property.into());
    let wire_name: Arc<str> = Arc::from(wire_name.into());

    let to = {
        let (property, wire_name, element) = (property.clone(), wire_name.clone(), element.clone());
        move |src: &Object, mut acc: Record, ctx: &mut Context| {
            ctx.scoped(&*property, |ctx| {
                if let Some(value) = src.get(&property) {
                    let encoded = element.to(value, ctx)?;
                    acc.insert(wire_name.to_string(), encoded);
                }
                Ok(acc)
            })
        }
    };
    let from = move |src: &Record, mut acc: Object, ctx: &mut Context| {
        ctx.scoped(&*property, |ctx| {
            if let Some(wire) = src.get(&*wire_name) {
                let decoded = element.from(wire, ctx)?;
                acc.set(property.to_string(), decoded);
            }
            Ok(acc)
        })
    };

    ChainableMapper::new().with_to(to).with_from(from)
}
