//! Tests for recording metadata instances

use bytecode_system::Opcode;
use core_types::{ClassRegistry, MetadataContract, MetadataInstance, PrimitiveType, TypeRef, Value};
use recorder::{RecorderConfig, RecorderContract, RecordingEnvironment, RecordingError};
use std::sync::Arc;

fn qualifier() -> Arc<MetadataContract> {
    MetadataContract::new("Qualifier")
        .element("name", TypeRef::named("String"))
        .element_with_default("priority", TypeRef::Primitive(PrimitiveType::Int), Value::Int(10))
        .element("scope", TypeRef::named("String"))
        .build()
}

fn env() -> RecordingEnvironment {
    RecordingEnvironment::new(ClassRegistry::with_builtins(), RecorderConfig::default()).unwrap()
}

fn contract() -> Arc<RecorderContract> {
    RecorderContract::new("Beans")
        .method("qualify", [TypeRef::named("Qualifier")])
        .build()
}

#[test]
fn test_literal_carried_by_program() {
    let env = env();
    let instance = MetadataInstance::new("Qualifier").on("Service").value("name", "primary");
    let literal = env
        .metadata_proxy(instance, &qualifier(), vec![("scope".to_string(), Value::from("app"))])
        .unwrap();

    let mut session = env.session(false, "Meta", "run");
    session.recording_proxy(&contract()).call("qualify", vec![literal]).unwrap();
    let program = session.finish().unwrap();

    assert_eq!(program.literal_types.len(), 1);
    assert_eq!(program.literal_types[0].name.as_str(), "Qualifier$Literal");
    let args = program
        .units
        .iter()
        .flat_map(|u| &u.instructions)
        .find_map(|i| match &i.opcode {
            Opcode::NewLiteral { args, .. } => Some(args.len()),
            _ => None,
        });
    assert_eq!(args, Some(3));
}

#[test]
fn test_literal_type_reused() {
    let env = env();
    let contract = qualifier();
    for name in ["a", "b"] {
        let instance = MetadataInstance::new("Qualifier")
            .value("name", name)
            .value("scope", "app");
        env.metadata_proxy(instance, &contract, vec![]).unwrap();
    }
    assert_eq!(env.literal_provider().generated_count(), 1);
}

#[test]
fn test_identical_instances_record_separately() {
    let env = env();
    let make = || {
        let instance = MetadataInstance::new("Qualifier")
            .value("name", "same")
            .value("scope", "app");
        env.metadata_proxy(instance, &qualifier(), vec![]).unwrap()
    };
    let mut session = env.session(false, "Meta", "run");
    let proxy = session.recording_proxy(&contract());
    proxy.call("qualify", vec![make()]).unwrap();
    proxy.call("qualify", vec![make()]).unwrap();
    let program = session.finish().unwrap();
    let literals = program
        .units
        .iter()
        .flat_map(|u| &u.instructions)
        .filter(|i| matches!(i.opcode, Opcode::NewLiteral { .. }))
        .count();
    assert_eq!(literals, 2);
    assert_eq!(program.literal_types.len(), 1);
}

#[test]
fn test_missing_element_value() {
    let env = env();
    let instance = MetadataInstance::new("Qualifier").value("name", "x");
    let literal = env.metadata_proxy(instance, &qualifier(), vec![]).unwrap();
    let mut session = env.session(false, "Meta", "run");
    session.recording_proxy(&contract()).call("qualify", vec![literal]).unwrap();
    let err = session.finish().unwrap_err();
    assert!(matches!(
        &err,
        RecordingError::MetadataValueMissing { element, .. } if element == "scope"
    ));
    assert!(err.to_string().contains("value not set for element"));
}

#[test]
fn test_mismatched_contract() {
    let env = env();
    let err = env
        .metadata_proxy(MetadataInstance::new("Other"), &qualifier(), vec![])
        .unwrap_err();
    assert!(err.to_string().contains("metadata contract mismatch"));
}
