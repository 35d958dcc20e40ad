//! Tests for Value and IdentityKey

use core_types::{builtin, ArrayRef, IdentityKey, ObjectRef, Placeholder, TypeRef, Value};

#[test]
fn test_scalars_key_by_value() {
    assert_eq!(Value::Int(7).identity(), IdentityKey::Int(7));
    assert_eq!(Value::from("a").identity(), Value::from("a").identity());
    assert_eq!(
        Value::enum_constant("Level", "INFO").identity(),
        Value::enum_constant("Level", "INFO").identity()
    );
    assert_eq!(Value::class("Widget").identity(), Value::class("Widget").identity());
}

#[test]
fn test_references_key_by_address() {
    let list = ObjectRef::list(builtin("ArrayList").unwrap(), vec![]);
    let alias = Value::Object(list.clone());
    assert_eq!(Value::Object(list).identity(), alias.identity());

    let a = ArrayRef::allocate(TypeRef::Any, 1);
    let b = ArrayRef::allocate(TypeRef::Any, 1);
    assert_eq!(Value::Array(a.clone()), Value::Array(b.clone()));
    assert_ne!(Value::Array(a).identity(), Value::Array(b).identity());
}

#[test]
fn test_placeholders_key_by_proxy_key() {
    let p = Placeholder::new("proxykey1", true, TypeRef::named("Pool"));
    let q = Placeholder::new("proxykey1", true, TypeRef::named("Pool"));
    assert_eq!(Value::from(p).identity(), Value::from(q).identity());
}

#[test]
fn test_zero_values() {
    use core_types::PrimitiveType;
    assert_eq!(Value::zero_of(PrimitiveType::Int), Value::Int(0));
    assert_eq!(Value::zero_of(PrimitiveType::Bool), Value::Bool(false));
    assert_eq!(Value::zero_of(PrimitiveType::Char), Value::Char('\0'));
}

#[test]
fn test_accessors() {
    assert_eq!(Value::Short(3).as_i64(), Some(3));
    assert_eq!(Value::from("x").as_str(), Some("x"));
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
    assert!(Value::Null.is_null());
    assert!(Value::Int(1).as_object().is_none());
}
