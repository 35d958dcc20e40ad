//! Tests for ObjectRef and ArrayRef

use core_types::{
    builtin, ArrayRef, ClassDescriptor, ObjectState, PrimitiveType, TypeRef, Value, ValueError,
};

#[test]
fn test_property_access_rules() {
    let class = ClassDescriptor::bean("Config")
        .property("name", TypeRef::named("String"))
        .read_only("entries", TypeRef::named("Map"))
        .build();
    let config = class.instantiate().unwrap();

    config.set_property("name", Value::from("main")).unwrap();
    assert_eq!(config.get_property("name").unwrap(), Value::from("main"));
    assert!(matches!(
        config.set_property("entries", Value::Null),
        Err(ValueError::ReadOnlyProperty { .. })
    ));
    assert!(matches!(
        config.get_property("missing"),
        Err(ValueError::NoSuchProperty { .. })
    ));

    let entries = config.get_property("entries").unwrap();
    entries
        .as_object()
        .unwrap()
        .put(Value::from("k"), Value::Int(1))
        .unwrap();
    assert_eq!(config.get_property("entries").unwrap().as_object().unwrap().len(), 1);
}

#[test]
fn test_rewriting_members_replaces_in_place() {
    let class = ClassDescriptor::bean("Counter")
        .property("label", TypeRef::named("String"))
        .field("count", TypeRef::Primitive(PrimitiveType::Int))
        .build();
    let counter = class.instantiate().unwrap();

    for i in 0..3 {
        counter.set_field("count", Value::Int(i)).unwrap();
        counter.set_property("label", Value::from(format!("run {}", i))).unwrap();
    }
    assert_eq!(counter.get_field("count").unwrap(), Value::Int(2));
    assert_eq!(counter.get_property("label").unwrap(), Value::from("run 2"));
    match counter.snapshot() {
        ObjectState::Bean(members) => {
            assert_eq!(members.fields.len(), 1);
            assert_eq!(members.properties.len(), 1);
        }
        other => panic!("expected bean state, got {:?}", other),
    }
}

#[test]
fn test_self_reference_through_property() {
    let class = ClassDescriptor::bean("Node")
        .property("next", TypeRef::named("Node"))
        .build();
    let node = class.instantiate().unwrap();
    node.set_property("next", Value::Object(node.clone())).unwrap();
    let next = node.get_property("next").unwrap();
    assert!(next.as_object().unwrap().ptr_eq(&node));
}

#[test]
fn test_snapshot_of_map() {
    let map = builtin("LinkedHashMap").unwrap().instantiate().unwrap();
    map.put(Value::from("a"), Value::Int(1)).unwrap();
    map.put(Value::from("b"), Value::Int(2)).unwrap();
    match map.snapshot() {
        ObjectState::Map(entries) => {
            assert_eq!(entries[0].0, Value::from("a"));
            assert_eq!(entries[1].1, Value::Int(2));
        }
        other => panic!("expected map state, got {:?}", other),
    }
}

#[test]
fn test_collection_ops_on_bean_fail() {
    let bean = ClassDescriptor::bean("Plain").build().instantiate().unwrap();
    assert!(matches!(bean.add(Value::Null), Err(ValueError::NotACollection(_))));
    assert!(matches!(
        bean.put(Value::Null, Value::Null),
        Err(ValueError::NotAMap(_))
    ));
}

#[test]
fn test_primitive_array_zero_filled() {
    let array = ArrayRef::allocate(TypeRef::Primitive(PrimitiveType::Long), 3);
    assert_eq!(array.elements(), vec![Value::Long(0); 3]);
}
