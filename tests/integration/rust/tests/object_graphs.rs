//! Object Graph Integration Tests
//!
//! Values passed to the recorder are decomposed into construction steps;
//! these tests check the replayed objects match what was recorded.

use bytecode_system::StartupProgram;
use core_types::{
    builtin, ArrayRef, FnSubstitution, Members, ObjectRef, ObjectState, PrimitiveType, TypeRef,
    Value, ValueError,
};
use integration_tests::{classes, contract, replay, runtime, Collector};
use interpreter::RuntimeRegistry;
use recorder::{RecorderConfig, RecordingEnvironment, RecordingError, RecordingSession};
use std::sync::Arc;

fn record_with(
    calls: Vec<(&str, Value)>,
    setup: impl FnOnce(&mut RecordingSession),
) -> Result<StartupProgram, RecordingError> {
    let config = RecorderConfig::default().with_max_steps_per_unit(3);
    let env = RecordingEnvironment::new(classes(), config).unwrap();
    let mut session = env.session(false, "Graphs", "run");
    setup(&mut session);
    let proxy = session.recording_proxy(&contract());
    for (method, value) in calls {
        proxy.call(method, vec![value])?;
    }
    session.finish()
}

/// Record each value through `accept` and return what replay delivered
fn round_trip(values: Vec<Value>) -> Vec<Value> {
    let calls = values.into_iter().map(|v| ("accept", v)).collect();
    let program = record_with(calls, |_| {}).unwrap();
    let collector = Collector::new();
    replay(&[program], runtime(&collector)).unwrap();
    collector
        .args_of("accept")
        .into_iter()
        .map(|args| args[0].clone())
        .collect()
}

fn object(class: &str, state: ObjectState) -> Value {
    Value::Object(ObjectRef::new(builtin(class).unwrap(), state))
}

#[test]
fn test_builtin_shapes_round_trip() {
    let values = vec![
        object("EmptyList", ObjectState::List(vec![])),
        object("EmptyMap", ObjectState::Map(vec![])),
        object("SingletonList", ObjectState::List(vec![Value::from("only")])),
        object(
            "SingletonMap",
            ObjectState::Map(vec![(Value::from("k"), Value::Int(1))]),
        ),
    ];
    let replayed = round_trip(values.clone());
    assert_eq!(replayed, values);
    for (original, replayed) in values.iter().zip(&replayed) {
        assert_eq!(
            original.as_object().unwrap().type_name(),
            replayed.as_object().unwrap().type_name()
        );
    }
}

#[test]
fn test_mutable_collections_round_trip() {
    let values = vec![
        object(
            "ArrayList",
            ObjectState::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        ),
        object(
            "LinkedHashMap",
            ObjectState::Map(vec![
                (Value::from("a"), Value::Long(1)),
                (Value::from("b"), Value::Null),
            ]),
        ),
        object(
            "LinkedHashSet",
            ObjectState::Set(vec![Value::from("x"), Value::from("y")]),
        ),
    ];
    assert_eq!(round_trip(values.clone()), values);
}

#[test]
fn test_bean_with_value_and_list() {
    let settings = classes().get("Settings").unwrap().instantiate().unwrap();
    settings.set_property("name", Value::from("value1")).unwrap();
    let tags = settings.get_property("tags").unwrap();
    tags.as_object().unwrap().add(Value::from("a")).unwrap();
    tags.as_object().unwrap().add(Value::from("b")).unwrap();

    let replayed = round_trip(vec![Value::Object(settings)]);
    let bean = replayed[0].as_object().unwrap();
    assert_eq!(bean.type_name().as_str(), "Settings");
    assert_eq!(bean.get_property("name").unwrap(), Value::from("value1"));
    assert_eq!(bean.get_property("parent").unwrap(), Value::Null);
    let tags = bean.get_property("tags").unwrap();
    assert_eq!(
        tags.as_object().unwrap().elements().unwrap(),
        vec![Value::from("a"), Value::from("b")]
    );
}

#[test]
fn test_cyclic_beans_keep_identity() {
    let registry = classes();
    let settings = registry.get("Settings").unwrap();
    let a = settings.instantiate().unwrap();
    let b = settings.instantiate().unwrap();
    a.set_property("name", Value::from("a")).unwrap();
    b.set_property("name", Value::from("b")).unwrap();
    a.set_property("parent", Value::Object(b.clone())).unwrap();
    b.set_property("parent", Value::Object(a.clone())).unwrap();

    let replayed = round_trip(vec![Value::Object(a.clone()), Value::Object(b), Value::Object(a)]);
    let a = replayed[0].as_object().unwrap();
    let b = replayed[1].as_object().unwrap();
    assert!(replayed[2].as_object().unwrap().ptr_eq(a));
    assert!(!a.ptr_eq(b));

    let a_parent = a.get_property("parent").unwrap();
    let b_parent = b.get_property("parent").unwrap();
    assert!(a_parent.as_object().unwrap().ptr_eq(b));
    assert!(b_parent.as_object().unwrap().ptr_eq(a));
}

#[test]
fn test_self_reference() {
    let settings = classes().get("Settings").unwrap().instantiate().unwrap();
    settings
        .set_property("parent", Value::Object(settings.clone()))
        .unwrap();
    let replayed = round_trip(vec![Value::Object(settings)]);
    let bean = replayed[0].as_object().unwrap();
    let parent = bean.get_property("parent").unwrap();
    assert!(parent.as_object().unwrap().ptr_eq(bean));
}

#[test]
fn test_list_shared_between_calls() {
    let shared = object("ArrayList", ObjectState::List(vec![Value::Int(7)]));
    let replayed = round_trip(vec![shared.clone(), Value::Int(0), shared]);
    let first = replayed[0].as_object().unwrap();
    assert!(replayed[2].as_object().unwrap().ptr_eq(first));
}

#[test]
fn test_substitution_round_trip() {
    let version_class = classes().get("Version").unwrap().clone();
    let version = ObjectRef::new(
        version_class.clone(),
        ObjectState::Bean(Members {
            properties: vec![],
            fields: vec![("text".to_string(), Value::from("1.2.3"))],
        }),
    );

    let program = record_with(vec![("accept", Value::Object(version))], |session| {
        let substitution = FnSubstitution::new(
            |value: &Value| {
                value
                    .as_object()
                    .ok_or_else(|| ValueError::Substitution("not a Version".to_string()))?
                    .get_field("text")
            },
            |_: Value| Err(ValueError::Substitution("replay only".to_string())),
        );
        session.register_substitution("Version", TypeRef::named("String"), Arc::new(substitution));
    })
    .unwrap();

    let collector = Collector::new();
    let mut registry = runtime(&collector);
    registry.register_substitution(
        "Version",
        Arc::new(FnSubstitution::new(
            |_: &Value| Err(ValueError::Substitution("record only".to_string())),
            move |serialized: Value| {
                Ok(Value::Object(ObjectRef::new(
                    version_class.clone(),
                    ObjectState::Bean(Members {
                        properties: vec![],
                        fields: vec![("text".to_string(), serialized)],
                    }),
                )))
            },
        )),
    );
    replay(&[program], registry).unwrap();

    let args = collector.args_of("accept");
    let rebuilt = args[0][0].as_object().unwrap();
    assert_eq!(rebuilt.type_name().as_str(), "Version");
    assert_eq!(rebuilt.get_field("text").unwrap(), Value::from("1.2.3"));
}

#[test]
fn test_substitution_to_fresh_lists_keeps_each_value() {
    let version_class = classes().get("Version").unwrap().clone();
    let versions: Vec<(&str, Value)> = ["1.0", "2.0", "3.0"]
        .into_iter()
        .map(|text| {
            let version = ObjectRef::new(
                version_class.clone(),
                ObjectState::Bean(Members {
                    properties: vec![],
                    fields: vec![("text".to_string(), Value::from(text))],
                }),
            );
            ("accept", Value::Object(version))
        })
        .collect();

    let program = record_with(versions, |session| {
        let substitution = FnSubstitution::new(
            |value: &Value| {
                let text = value
                    .as_object()
                    .ok_or_else(|| ValueError::Substitution("not a Version".to_string()))?
                    .get_field("text")?;
                Ok(Value::Object(ObjectRef::list(builtin("ArrayList").unwrap(), vec![text])))
            },
            |_: Value| Err(ValueError::Substitution("replay only".to_string())),
        );
        session.register_substitution("Version", TypeRef::named("List"), Arc::new(substitution));
    })
    .unwrap();

    let collector = Collector::new();
    let mut registry = runtime(&collector);
    registry.register_substitution(
        "Version",
        Arc::new(FnSubstitution::new(
            |_: &Value| Err(ValueError::Substitution("record only".to_string())),
            |serialized: Value| Ok(serialized),
        )),
    );
    replay(&[program], registry).unwrap();

    let delivered: Vec<Vec<Value>> = collector
        .args_of("accept")
        .iter()
        .map(|args| args[0].as_object().unwrap().elements().unwrap())
        .collect();
    assert_eq!(
        delivered,
        vec![
            vec![Value::from("1.0")],
            vec![Value::from("2.0")],
            vec![Value::from("3.0")],
        ]
    );
}

#[test]
fn test_non_default_constructor_round_trip() {
    let class = classes().get("Point").unwrap().clone();
    let int = TypeRef::Primitive(PrimitiveType::Int);
    let point = class
        .instantiate_with(&[int.clone(), int], vec![Value::Int(3), Value::Int(4)])
        .unwrap();
    let ctor = class.constructors()[0].clone();

    let program = record_with(vec![("accept", Value::Object(point))], |session| {
        session.register_non_default_constructor("Point", ctor, |value| {
            let point = value.as_object().map(|p| (p.get_field("x"), p.get_field("y")));
            match point {
                Some((Ok(x), Ok(y))) => vec![x, y],
                _ => vec![],
            }
        });
    })
    .unwrap();

    let collector = Collector::new();
    replay(&[program], runtime(&collector)).unwrap();
    let args = collector.args_of("accept");
    let point = args[0][0].as_object().unwrap();
    assert_eq!(point.get_field("x").unwrap(), Value::Int(3));
    assert_eq!(point.get_field("y").unwrap(), Value::Int(4));
}

#[test]
fn test_read_only_list_rebuilt_for_list_parameter() {
    let frozen = object(
        "UnmodifiableList",
        ObjectState::List(vec![Value::Int(1), Value::Int(2)]),
    );
    let program = record_with(vec![("accept_list", frozen)], |_| {}).unwrap();
    let collector = Collector::new();
    replay(&[program], runtime(&collector)).unwrap();
    let args = collector.args_of("accept_list");
    let list = args[0][0].as_object().unwrap();
    assert_eq!(list.type_name().as_str(), "ArrayList");
    assert_eq!(list.elements().unwrap(), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_arrays_and_optionals_round_trip() {
    let array = Value::Array(ArrayRef::from_elements(
        TypeRef::named("String"),
        vec![Value::from("a"), Value::Null, Value::from("c")],
    ));
    let values = vec![array, Value::some(Value::Int(5)), Value::none()];
    assert_eq!(round_trip(values.clone()), values);
}

#[test]
fn test_replay_needs_matching_classes() {
    let settings = classes().get("Settings").unwrap().instantiate().unwrap();
    let program = record_with(vec![("accept", Value::Object(settings))], |_| {}).unwrap();

    let collector = Collector::new();
    let mut registry = RuntimeRegistry::with_builtins();
    let target = Arc::clone(&collector);
    registry.register_recorder(integration_tests::CONTRACT, move || {
        target.clone() as Arc<dyn interpreter::RecorderTarget>
    });
    assert!(replay(&[program], registry).is_err());
    assert!(collector.calls().is_empty());
}
