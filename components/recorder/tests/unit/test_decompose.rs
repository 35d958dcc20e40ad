//! Tests for value resolution and object decomposition

use bytecode_system::{CollectionShape, Opcode, StartupProgram};
use core_types::{
    builtin, ArrayRef, ClassDescriptor, ClassRegistry, ConstructorDescriptor, FnSubstitution,
    ObjectRef, TypeRef, Value, ValueError,
};
use recorder::{
    RecorderConfig, RecorderContract, RecordingEnvironment, RecordingError, RecordingSession,
};
use std::sync::Arc;

fn classes() -> ClassRegistry {
    let mut classes = ClassRegistry::with_builtins();
    classes.register(
        ClassDescriptor::bean("Settings")
            .property("name", TypeRef::named("String"))
            .property("parent", TypeRef::named("Settings"))
            .read_only("tags", TypeRef::named("List"))
            .read_only("extras", TypeRef::named("Map"))
            .build(),
    );
    classes.register(
        ClassDescriptor::bean("Point")
            .without_default_constructor()
            .field("x", TypeRef::Primitive(core_types::PrimitiveType::Int))
            .field("y", TypeRef::Primitive(core_types::PrimitiveType::Int))
            .constructor(ConstructorDescriptor::new([
                ("x", TypeRef::Primitive(core_types::PrimitiveType::Int)),
                ("y", TypeRef::Primitive(core_types::PrimitiveType::Int)),
            ]))
            .build(),
    );
    classes.register(
        ClassDescriptor::bean("Version")
            .final_class()
            .without_default_constructor()
            .field("text", TypeRef::named("String"))
            .build(),
    );
    classes
}

fn record_as(
    method: &str,
    arg: Value,
    setup: impl FnOnce(&mut RecordingSession),
) -> Result<StartupProgram, RecordingError> {
    let env = RecordingEnvironment::new(classes(), RecorderConfig::default()).unwrap();
    let contract = RecorderContract::new("Rec")
        .method("accept", [TypeRef::Any])
        .method("accept_list", [TypeRef::named("List")])
        .build();
    let mut session = env.session(false, "Decompose", "run");
    setup(&mut session);
    session.recording_proxy(&contract).call(method, vec![arg])?;
    session.finish()
}

fn record(
    arg: Value,
    setup: impl FnOnce(&mut RecordingSession),
) -> Result<StartupProgram, RecordingError> {
    record_as("accept", arg, setup)
}

fn ops(program: &StartupProgram) -> Vec<&Opcode> {
    program
        .units
        .iter()
        .flat_map(|u| &u.instructions)
        .map(|i| &i.opcode)
        .collect()
}

#[test]
fn test_builtin_shapes_use_collection_steps() {
    let empty = Value::Object(ObjectRef::list(builtin("EmptyList").unwrap(), vec![]));
    let program = record(empty, |_| {}).unwrap();
    assert!(ops(&program).iter().any(|op| matches!(
        op,
        Opcode::NewCollection {
            shape: CollectionShape::EmptyList,
            ..
        }
    )));

    let single = Value::Object(ObjectRef::map(
        builtin("SingletonMap").unwrap(),
        vec![(Value::from("k"), Value::from("v"))],
    ));
    let program = record(single, |_| {}).unwrap();
    assert!(ops(&program).iter().any(|op| matches!(
        op,
        Opcode::NewCollection { shape: CollectionShape::SingletonMap, args, .. } if args.len() == 2
    )));
}

#[test]
fn test_bean_properties_become_steps() {
    let settings = classes().get("Settings").unwrap().instantiate().unwrap();
    settings.set_property("name", Value::from("value1")).unwrap();
    let tags = settings.get_property("tags").unwrap();
    tags.as_object().unwrap().add(Value::from("a")).unwrap();
    tags.as_object().unwrap().add(Value::from("b")).unwrap();

    let program = record(Value::Object(settings), |_| {}).unwrap();
    let ops = ops(&program);
    let set = ops
        .iter()
        .filter(|op| matches!(op, Opcode::SetProperty { property, .. } if property == "name"))
        .count();
    let fetched = ops
        .iter()
        .filter(|op| matches!(op, Opcode::GetProperty { property, .. } if property == "tags"))
        .count();
    let appended = ops.iter().filter(|op| matches!(op, Opcode::Append { .. })).count();
    assert_eq!(set, 1);
    assert_eq!(fetched, 2);
    assert_eq!(appended, 2);
    // "parent" is null and "extras" is empty
    assert!(!ops
        .iter()
        .any(|op| matches!(op, Opcode::SetProperty { property, .. } if property == "parent")));
    assert!(!ops.iter().any(|op| matches!(op, Opcode::Put { .. })));
}

#[test]
fn test_self_referencing_bean() {
    let settings = classes().get("Settings").unwrap().instantiate().unwrap();
    settings
        .set_property("parent", Value::Object(settings.clone()))
        .unwrap();
    let program = record(Value::Object(settings), |_| {}).unwrap();
    let ops = ops(&program);
    assert_eq!(
        ops.iter().filter(|op| matches!(op, Opcode::NewInstance { .. })).count(),
        1
    );
    assert!(ops
        .iter()
        .any(|op| matches!(op, Opcode::SetProperty { property, .. } if property == "parent")));
}

#[test]
fn test_missing_constructor_names_type() {
    let point = ObjectRef::new(
        classes().get("Point").unwrap().clone(),
        core_types::ObjectState::Bean(Default::default()),
    );
    let err = record(Value::Object(point), |_| {}).unwrap_err();
    assert!(matches!(&err, RecordingError::NoDefaultConstructor(ty) if ty.as_str() == "Point"));
    assert!(err.to_string().contains("Point"));
}

#[test]
fn test_non_default_constructor() {
    let class = classes().get("Point").unwrap().clone();
    let point = class
        .instantiate_with(
            &[
                TypeRef::Primitive(core_types::PrimitiveType::Int),
                TypeRef::Primitive(core_types::PrimitiveType::Int),
            ],
            vec![Value::Int(3), Value::Int(4)],
        )
        .unwrap();
    let ctor = class.constructors()[0].clone();

    let program = record(Value::Object(point.clone()), |session| {
        session.register_non_default_constructor("Point", ctor.clone(), |value| {
            let point = value.as_object().unwrap();
            vec![point.get_field("x").unwrap(), point.get_field("y").unwrap()]
        });
    })
    .unwrap();
    assert!(ops(&program)
        .iter()
        .any(|op| matches!(op, Opcode::NewInstanceWith { args, .. } if args.len() == 2)));

    let err = record(Value::Object(point), |session| {
        session.register_non_default_constructor("Point", ctor, |_| vec![Value::Int(1)]);
    })
    .unwrap_err();
    assert!(matches!(
        err,
        RecordingError::ArgumentCountMismatch {
            expected: 2,
            actual: 1,
            ..
        }
    ));
}

#[test]
fn test_unmodifiable_list_falls_back_for_list_parameter() {
    let frozen = Value::Object(ObjectRef::list(
        builtin("UnmodifiableList").unwrap(),
        vec![Value::Int(1), Value::Int(2)],
    ));
    let program = record_as("accept_list", frozen.clone(), |_| {}).unwrap();
    assert!(ops(&program)
        .iter()
        .any(|op| matches!(op, Opcode::NewInstance { ty, .. } if ty.as_str() == "ArrayList")));

    let err = record(frozen, |_| {}).unwrap_err();
    assert!(matches!(err, RecordingError::NoDefaultConstructor(_)));
}

#[test]
fn test_substitution_replaces_value() {
    let version = ObjectRef::new(
        classes().get("Version").unwrap().clone(),
        core_types::ObjectState::Bean(Default::default()),
    );
    let substitution = FnSubstitution::new(
        |_: &Value| Ok(Value::from("1.2.3")),
        |_: Value| Err(ValueError::Substitution("not used when recording".to_string())),
    );
    let program = record(Value::Object(version), |session| {
        session.register_substitution("Version", TypeRef::named("String"), Arc::new(substitution));
    })
    .unwrap();
    assert!(ops(&program)
        .iter()
        .any(|op| matches!(op, Opcode::Deserialize { substitution, .. } if substitution == "Version")));
}

#[test]
fn test_fresh_substitution_results_stay_distinct() {
    let env = RecordingEnvironment::new(classes(), RecorderConfig::default()).unwrap();
    let contract = RecorderContract::new("Rec")
        .method("accept", [TypeRef::Any])
        .build();
    let mut session = env.session(false, "Versions", "run");
    let substitution = FnSubstitution::new(
        |value: &Value| {
            let text = value.as_object().unwrap().get_field("text")?;
            Ok(Value::Object(ObjectRef::list(builtin("ArrayList").unwrap(), vec![text])))
        },
        |_: Value| Err(ValueError::Substitution("not used when recording".to_string())),
    );
    session.register_substitution("Version", TypeRef::named("List"), Arc::new(substitution));

    let proxy = session.recording_proxy(&contract);
    for text in ["1.0", "2.0", "3.0"] {
        let version = ObjectRef::new(
            classes().get("Version").unwrap().clone(),
            core_types::ObjectState::Bean(core_types::Members {
                properties: vec![],
                fields: vec![("text".to_string(), Value::from(text))],
            }),
        );
        proxy.call("accept", vec![Value::Object(version)]).unwrap();
    }
    let program = session.finish().unwrap();
    let ops = ops(&program);

    let lists = ops
        .iter()
        .filter(|op| matches!(op, Opcode::NewInstance { ty, .. } if ty.as_str() == "ArrayList"))
        .count();
    let deserialized = ops
        .iter()
        .filter(|op| matches!(op, Opcode::Deserialize { .. }))
        .count();
    assert_eq!(lists, 3);
    assert_eq!(deserialized, 3);
}

#[test]
fn test_arrays_and_optionals() {
    let array = ArrayRef::from_elements(
        TypeRef::named("String"),
        vec![Value::from("a"), Value::Null, Value::from("c")],
    );
    let program = record(Value::Array(array), |_| {}).unwrap();
    let ops = ops(&program);
    assert!(ops.iter().any(|op| matches!(op, Opcode::NewArray { len: 3, .. })));
    assert_eq!(
        ops.iter().filter(|op| matches!(op, Opcode::ArrayStore { .. })).count(),
        2
    );

    let program = record(Value::some(Value::Int(1)), |_| {}).unwrap();
    assert!(ops_of(&program, |op| matches!(op, Opcode::NewOptional { value: Some(_), .. })));
}

fn ops_of(program: &StartupProgram, pred: impl Fn(&Opcode) -> bool) -> bool {
    ops(program).into_iter().any(pred)
}
