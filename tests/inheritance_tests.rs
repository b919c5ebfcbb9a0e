/// Inheritance tests
///
/// Subtypes start from a snapshot of their parent's accumulated steps and add
/// their own after it. Nested entity fields are polymorphic.

use std::sync::Arc;

use data_mapper::{
    Class, DataMapper, EntityConfig, FieldType, MapperError, Object, Record, TypeRegistry, Value,
};
use serde_json::json;

fn numbers(registry: &TypeRegistry, class: &Class, props: &[(&str, &str)]) {
    for (property, wire_name) in props {
        registry
            .configure_attribute(class, property, wire_name, FieldType::Number)
            .unwrap();
    }
}

#[test]
fn test_subtype_steps_run_after_base_steps() {
    let registry = Arc::new(TypeRegistry::new());
    let ia11 = Class::new("IA11");
    let ia12 = Class::with_parent("IA12", &ia11);
    let ia13 = Class::with_parent("IA13", &ia12);

    numbers(&registry, &ia11, &[("a", "a"), ("b", "b"), ("q", "q"), ("w", "w")]);
    numbers(&registry, &ia12, &[("a", "a"), ("c", "c"), ("e", "e")]);
    numbers(&registry, &ia13, &[("c", "c"), ("_q", "q")]);
    let mapper = DataMapper::new(registry);

    let entity = Value::from(
        ia13.allocate()
            .with("a", 2)
            .with("b", 1)
            .with("q", 2)
            .with("w", 2)
            .with("e", 2)
            .with("c", 3)
            .with("_q", 3),
    );

    // IA13's "_q" writes "q" after IA11's "q" did
    let dto = mapper.to_dto(&entity).unwrap();
    assert_eq!(
        dto,
        json!({"a": 2, "b": 1, "q": 3, "w": 2, "c": 3, "e": 2, "$type": "IA13@1"})
    );
    let db = mapper.to_db(&entity).unwrap();
    assert_eq!(db["q"], json!({"N": "3"}));
    assert_eq!(db["$type"], json!({"S": "IA13@1"}));

    for back in [mapper.from_dto(&dto).unwrap(), mapper.from_db(&db).unwrap()] {
        assert_eq!(back.class(), &ia13);
        assert!(back.is_instance_of(&ia11));
        assert!(back.is_instance_of(&ia12));
        assert_eq!(back.get("q"), Some(&Value::Number(3.0)));
        assert_eq!(back.get("_q"), Some(&Value::Number(3.0)));
        assert_eq!(back.get("e"), Some(&Value::Number(2.0)));
    }
}

#[test]
fn test_entity_without_own_steps_inherits_chain() {
    let registry = Arc::new(TypeRegistry::new());
    let ia11 = Class::new("IA11");
    let ia12 = Class::with_parent("IA12", &ia11);
    let ia14 = Class::with_parent("IA14", &ia12);

    numbers(&registry, &ia11, &[("a", "a"), ("b", "b"), ("q", "q"), ("w", "w")]);
    numbers(&registry, &ia12, &[("a", "a"), ("c", "c"), ("e", "e")]);
    registry.configure_entity(&ia14, EntityConfig::new()).unwrap();
    let mapper = DataMapper::new(registry);

    let entity = Value::from(
        ia14.allocate()
            .with("a", 2)
            .with("b", 1)
            .with("q", 2)
            .with("w", 2)
            .with("e", 4)
            .with("c", 2),
    );
    let dto = mapper.to_dto(&entity).unwrap();
    assert_eq!(
        dto,
        json!({"a": 2, "b": 1, "q": 2, "w": 2, "c": 2, "e": 4, "$type": "IA14@1"})
    );
    assert_eq!(Value::from(mapper.from_dto(&dto).unwrap()), entity);

    let db = mapper.to_db(&entity).unwrap();
    assert_eq!(Value::from(mapper.from_db(&db).unwrap()), entity);
}

#[test]
fn test_parent_steps_added_later_are_not_inherited() {
    let registry = Arc::new(TypeRegistry::new());
    let base = Class::new("Base");
    let child = Class::with_parent("Child", &base);

    numbers(&registry, &base, &[("a", "a")]);
    numbers(&registry, &child, &[("b", "b")]);
    numbers(&registry, &base, &[("late", "late")]);
    let mapper = DataMapper::new(registry);

    let entity = Value::from(child.allocate().with("a", 1).with("b", 2).with("late", 3));
    assert_eq!(
        mapper.to_dto(&entity).unwrap(),
        json!({"a": 1, "b": 2, "$type": "Child@1"})
    );
}

fn c2x() -> (DataMapper, Class, Class) {
    let registry = Arc::new(TypeRegistry::new());
    let c21 = Class::new("C21");
    let c22 = Class::with_parent("C22", &c21);
    let c23 = Class::with_parent("C23", &c22);

    registry
        .configure_entity(
            &c21,
            EntityConfig::new()
                .with_to(|src: &Object, _prev: Record, _ctx| {
                    let id = src.get("id").and_then(Value::as_str).unwrap_or_default();
                    let name = src.get("name").and_then(Value::as_str).unwrap_or_default();
                    let mut out = Record::new();
                    out.insert("id".into(), json!(format!("id#{}", id)));
                    out.insert("name".into(), json!(name));
                    Ok(out)
                })
                .with_from(|src: &Record, mut acc: Object, _ctx| {
                    let id = src.get("id").and_then(|v| v.as_str()).unwrap_or_default();
                    acc.set("id", id.split('#').nth(1).unwrap_or_default());
                    acc.set("name", src.get("name").and_then(|v| v.as_str()));
                    Ok(acc)
                }),
        )
        .unwrap();
    registry
        .configure_attribute(&c22, "code", "code", FieldType::String)
        .unwrap();
    registry
        .configure_entity(
            &c23,
            EntityConfig::new()
                .with_to(|src: &Object, mut acc: Record, _ctx| {
                    let version = src.get("version").and_then(Value::as_str);
                    acc.insert("Version".into(), json!(version));
                    Ok(acc)
                })
                .with_from(|src: &Record, mut acc: Object, _ctx| {
                    acc.set("version", src.get("Version").and_then(|v| v.as_str()));
                    Ok(acc)
                }),
        )
        .unwrap();

    (DataMapper::new(registry), c21, c23)
}

#[test]
fn test_custom_entity_step() {
    let (mapper, c21, _) = c2x();
    let entity = Value::from(c21.allocate().with("id", "3").with("name", "foo"));

    let db = mapper.to_db(&entity).unwrap();
    assert_eq!(db, json!({"id": "id#3", "name": "foo", "$type": {"S": "C21@1"}}));
    let dto = mapper.to_dto(&entity).unwrap();
    assert_eq!(dto, json!({"id": "id#3", "name": "foo", "$type": "C21@1"}));

    assert_eq!(Value::from(mapper.from_db(&db).unwrap()), entity);
    assert_eq!(Value::from(mapper.from_dto(&dto).unwrap()), entity);
}

#[test]
fn test_custom_entity_steps_under_inheritance() {
    let (mapper, c21, c23) = c2x();
    let entity = Value::from(
        c23.allocate()
            .with("id", "id_code")
            .with("name", "code is code")
            .with("code", "code")
            .with("version", "v2"),
    );

    let db = mapper.to_db(&entity).unwrap();
    assert_eq!(
        db,
        json!({
            "id": "id#id_code",
            "name": "code is code",
            "code": {"S": "code"},
            "Version": "v2",
            "$type": {"S": "C23@1"}
        })
    );
    let dto = mapper.to_dto(&entity).unwrap();
    assert_eq!(
        dto,
        json!({
            "id": "id#id_code",
            "name": "code is code",
            "code": "code",
            "Version": "v2",
            "$type": "C23@1"
        })
    );

    let back = mapper.from_db(&db).unwrap();
    assert!(back.is_instance_of(&c21));
    assert_eq!(Value::from(back), entity);
    assert_eq!(Value::from(mapper.from_dto(&dto).unwrap()), entity);
}

struct Shapes {
    mapper: DataMapper,
    shape: Class,
    circle: Class,
    drawing: Class,
}

fn shapes() -> Shapes {
    let registry = Arc::new(TypeRegistry::new());
    let shape = Class::new("Shape");
    let circle = Class::with_parent("Circle", &shape);
    let drawing = Class::new("Drawing");

    registry.configure_attribute(&shape, "name", "name", FieldType::String).unwrap();
    registry.configure_attribute(&circle, "radius", "radius", FieldType::Number).unwrap();
    registry.configure_attribute(&drawing, "main", "main", &shape).unwrap();
    registry.configure_list_attribute(&drawing, "all", "all", &shape).unwrap();

    Shapes {
        mapper: DataMapper::new(registry),
        shape,
        circle,
        drawing,
    }
}

#[test]
fn test_nested_subtype_keeps_its_own_type() {
    let s = shapes();
    let circle = Value::from(s.circle.allocate().with("name", "c").with("radius", 2));
    let plain = Value::from(s.shape.allocate().with("name", "p"));
    let entity = Value::from(
        s.drawing
            .allocate()
            .with("main", circle.clone())
            .with("all", Value::List(vec![plain, circle])),
    );

    let db = s.mapper.to_db(&entity).unwrap();
    assert_eq!(
        db["main"],
        json!({"M": {"name": {"S": "c"}, "radius": {"N": "2"}, "$type": {"S": "Circle@1"}}})
    );
    assert_eq!(
        db["all"]["L"][0],
        json!({"M": {"name": {"S": "p"}, "$type": {"S": "Shape@1"}}})
    );

    let back = s.mapper.from_db(&db).unwrap();
    let main = back.get("main").and_then(Value::as_object).unwrap();
    assert_eq!(main.class(), &s.circle);
    assert_eq!(Value::from(back), entity);

    let dto = s.mapper.to_dto(&entity).unwrap();
    assert_eq!(dto["main"]["$type"], json!("Circle@1"));
    assert_eq!(Value::from(s.mapper.from_dto(&dto).unwrap()), entity);
}

#[test]
fn test_unregistered_subtype_is_written_as_declared_type() {
    let s = shapes();
    let square = Class::with_parent("Square", &s.shape);
    let entity = Value::from(
        s.drawing
            .allocate()
            .with("main", square.allocate().with("name", "sq").with("side", 1)),
    );

    let dto = s.mapper.to_dto(&entity).unwrap();
    assert_eq!(dto["main"], json!({"name": "sq", "$type": "Shape@1"}));
    let back = s.mapper.from_dto(&dto).unwrap();
    let main = back.get("main").and_then(Value::as_object).unwrap();
    assert_eq!(main.class(), &s.shape);
}

#[test]
fn test_nested_unrelated_types_are_rejected() {
    let s = shapes();

    let stranger = Value::from(
        s.drawing
            .allocate()
            .with("main", s.drawing.allocate()),
    );
    let err = s.mapper.to_dto(&stranger).unwrap_err();
    assert!(matches!(err.root_cause(), MapperError::TypeMismatch(_)));

    let wire = json!({"main": {"$type": "Drawing@1"}, "$type": "Drawing@1"});
    let err = s.mapper.from_dto(&wire).unwrap_err();
    assert!(matches!(err.root_cause(), MapperError::TypeMismatch(_)));

    let wire = json!({"main": {"name": "x", "$type": "Ghost@1"}, "$type": "Drawing@1"});
    let err = s.mapper.from_dto(&wire).unwrap_err();
    assert!(matches!(err.root_cause(), MapperError::EntityNotConfigured(_)));

    let wire = json!({"main": {"name": "x", "$type": "Circle@7"}, "$type": "Drawing@1"});
    let err = s.mapper.from_dto(&wire).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        MapperError::VersionMismatch { found: 7, registered: 1, .. }
    ));
}

#[test]
fn test_nested_record_without_mark_uses_declared_type() {
    let s = shapes();
    let wire = json!({"main": {"name": "bare"}, "$type": "Drawing@1"});
    let back = s.mapper.from_dto(&wire).unwrap();
    let main = back.get("main").and_then(Value::as_object).unwrap();
    assert_eq!(main.class(), &s.shape);
    assert_eq!(main.get("name"), Some(&Value::from("bare")));
}
