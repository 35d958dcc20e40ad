//! Tests for metadata contracts and literals

use core_types::{LiteralType, MetadataContract, MetadataLiteral, TypeRef, Value};
use std::sync::Arc;

#[test]
fn test_contract_defaults() {
    let contract = MetadataContract::new("Timeout")
        .element_with_default("seconds", TypeRef::named("Long"), Value::Long(30))
        .element("unit", TypeRef::named("String"))
        .build();
    assert_eq!(
        contract.element_named("seconds").unwrap().default,
        Some(Value::Long(30))
    );
    assert!(contract.element_named("unit").unwrap().default.is_none());
}

#[test]
fn test_literal_param_types() {
    let contract = MetadataContract::new("Tag").element("value", TypeRef::named("String"));
    let literal = LiteralType::for_contract(&contract);
    assert_eq!(literal.param_types(), vec![TypeRef::named("String")]);
    assert_eq!(literal.contract.as_str(), "Tag");
}

#[test]
fn test_equal_literals() {
    let contract = MetadataContract::new("Tag").element("value", TypeRef::named("String"));
    let literal = Arc::new(LiteralType::for_contract(&contract));
    let a = MetadataLiteral::new(literal.clone(), vec![Value::from("x")]).unwrap();
    let b = MetadataLiteral::new(literal, vec![Value::from("x")]).unwrap();
    assert_eq!(a, b);
}
