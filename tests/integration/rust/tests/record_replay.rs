//! Record -> Emit -> Replay Integration Tests
//!
//! Records invocations through recording proxies, emits startup programs
//! and replays them against a collecting recorder.

use bytecode_system::{Opcode, RegisterId, StartupProgram};
use core_types::{
    builtin, MetadataContract, MetadataInstance, NativeRef, ObjectRef, PrimitiveType, TypeRef,
    Value,
};
use integration_tests::{classes, contract, replay, runtime, Collector, LATE_CLASS};
use interpreter::ReplayError;
use recorder::{
    ObjectLoader, RecorderConfig, RecordingEnvironment, RecordingError, RecordingResult,
    UnitWriter,
};
use std::sync::Arc;

fn env(max_steps: usize) -> RecordingEnvironment {
    let config = RecorderConfig::default().with_max_steps_per_unit(max_steps);
    RecordingEnvironment::new(classes(), config).unwrap()
}

fn list(items: Vec<Value>) -> Value {
    Value::Object(ObjectRef::list(builtin("ArrayList").unwrap(), items))
}

fn record_accepts(max_steps: usize, values: Vec<Value>) -> StartupProgram {
    let env = env(max_steps);
    let mut session = env.session(false, "Order", "run");
    let proxy = session.recording_proxy(&contract());
    for value in values {
        proxy.call("accept", vec![value]).unwrap();
    }
    session.finish().unwrap()
}

#[test]
fn test_order_preserved_across_units() {
    let values: Vec<Value> = (0..25).map(Value::Int).collect();
    let program = record_accepts(1, values.clone());
    assert!(program.units.len() > 10);

    let collector = Collector::new();
    let (_, stats) = replay(&[program], runtime(&collector)).unwrap();
    let replayed: Vec<Value> = collector
        .args_of("accept")
        .into_iter()
        .map(|args| args[0].clone())
        .collect();
    assert_eq!(replayed, values);
    assert_eq!(stats.invocations, 25);
    assert_eq!(stats.recorders, 1);
}

#[test]
fn test_ceiling_does_not_change_replay() {
    let record = |max_steps: usize| {
        let env = env(max_steps);
        let mut session = env.session(false, "Split", "run");
        let proxy = session.recording_proxy(&contract());
        for i in 0..8 {
            let item = list(vec![Value::Int(i), Value::from(format!("item{}", i))]);
            proxy.call("accept", vec![item]).unwrap();
            proxy
                .call("open", vec![Value::from(format!("res{}", i))])
                .unwrap();
        }
        session.finish().unwrap()
    };
    let narrow = record(1);
    let wide = record(1000);
    assert!(narrow.units.len() > wide.units.len());

    let narrow_calls = Collector::new();
    let wide_calls = Collector::new();
    let (narrow_context, _) = replay(&[narrow], runtime(&narrow_calls)).unwrap();
    let (wide_context, _) = replay(&[wide], runtime(&wide_calls)).unwrap();
    assert_eq!(narrow_calls.calls(), wide_calls.calls());
    assert_eq!(narrow_calls.calls().len(), 16);

    assert_eq!(narrow_context.keys(), wide_context.keys());
    assert_eq!(narrow_context.len(), 8);
    for key in narrow_context.keys() {
        assert_eq!(narrow_context.get(&key), wide_context.get(&key));
    }
}

#[test]
fn test_program_name_counts_per_environment() {
    let env = env(100);
    let first = env.session(false, "Boot", "run").finish().unwrap();
    let second = env.session(false, "Boot", "run").finish().unwrap();
    assert_eq!(first.name, "startup.steps.Boot$run1");
    assert_eq!(second.name, "startup.steps.Boot$run2");
}

#[test]
fn test_result_passed_back_into_recorder() {
    let env = env(2);
    let mut session = env.session(false, "Handles", "run");
    let proxy = session.recording_proxy(&contract());
    let handle = proxy.call("open", vec![Value::from("db")]).unwrap().unwrap();
    assert!(handle.as_placeholder().is_some());
    proxy.call("accept", vec![Value::Int(1)]).unwrap();
    proxy.call("pair", vec![handle.clone(), handle]).unwrap();
    let program = session.finish().unwrap();

    let collector = Collector::new();
    let (context, _) = replay(&[program], runtime(&collector)).unwrap();
    let pair = collector.args_of("pair");
    assert_eq!(pair, vec![vec![Value::from("handle:db"), Value::from("handle:db")]]);
    assert_eq!(context.len(), 1);
}

#[test]
fn test_static_result_used_by_runtime_program() {
    let env = env(100);
    let mut early = env.session(true, "Early", "boot");
    let handle = early
        .recording_proxy(&contract())
        .call("open", vec![Value::from("cache")])
        .unwrap()
        .unwrap();
    let mut late = env.session(false, "Late", "run");
    late.recording_proxy(&contract())
        .call("accept", vec![handle])
        .unwrap();

    let late = late.finish().unwrap();
    let early = early.finish().unwrap();

    let collector = Collector::new();
    replay(&[early.clone(), late.clone()], runtime(&collector)).unwrap();
    assert_eq!(
        collector.args_of("accept"),
        vec![vec![Value::from("handle:cache")]]
    );

    // Out of order, the value has not been published yet
    let err = replay(&[late, early], runtime(&Collector::new())).unwrap_err();
    assert!(matches!(err, ReplayError::MissingContextValue(_)));
}

#[test]
fn test_unsupported_result_records_nothing() {
    let env = env(100);
    let mut session = env.session(false, "Label", "run");
    let proxy = session.recording_proxy(&contract());
    proxy.call("accept", vec![Value::Int(1)]).unwrap();
    assert!(matches!(
        proxy.call("label", vec![]),
        Err(RecordingError::UnsupportedResultType { .. })
    ));
    let program = session.finish().unwrap();

    let collector = Collector::new();
    replay(&[program], runtime(&collector)).unwrap();
    assert_eq!(collector.calls().len(), 1);
}

#[test]
fn test_enum_and_class_references() {
    let env = env(100);
    let mut session = env.session(false, "Refs", "run");
    let late = session.class_proxy(LATE_CLASS);
    let proxy = session.recording_proxy(&contract());
    proxy
        .call("accept", vec![Value::enum_constant("Level", "HIGH")])
        .unwrap();
    proxy.call("accept", vec![Value::class("Settings")]).unwrap();
    proxy.call("accept", vec![late]).unwrap();
    let program = session.finish().unwrap();

    let collector = Collector::new();
    replay(&[program.clone()], runtime(&collector)).unwrap();
    let args: Vec<Value> = collector
        .args_of("accept")
        .into_iter()
        .map(|args| args[0].clone())
        .collect();
    assert_eq!(
        args,
        vec![
            Value::enum_constant("Level", "HIGH"),
            Value::class("Settings"),
            Value::class(LATE_CLASS),
        ]
    );

    // Without the late class registered, replay cannot resolve it
    let mut registry = interpreter::RuntimeRegistry::new(classes());
    let collector = Collector::new();
    let target = Arc::clone(&collector);
    registry.register_recorder(integration_tests::CONTRACT, move || {
        target.clone() as Arc<dyn interpreter::RecorderTarget>
    });
    assert!(replay(&[program], registry).is_err());
}

struct DataSourceLoader;

impl ObjectLoader for DataSourceLoader {
    fn can_handle(&self, value: &Value, _static_init: bool) -> bool {
        value
            .as_native()
            .and_then(|native| native.downcast_ref::<String>())
            .is_some()
    }

    fn load(
        &self,
        writer: &mut UnitWriter<'_>,
        value: &Value,
        _static_init: bool,
    ) -> RecordingResult<RegisterId> {
        let name = value
            .as_native()
            .and_then(|native| native.downcast_ref::<String>())
            .cloned()
            .unwrap_or_default();
        let name = writer.load_string(&name);
        Ok(writer.call_static("lookup", &[name]))
    }
}

#[test]
fn test_object_loader_replays_through_function() {
    let env = env(100);
    let mut session = env.session(false, "Loader", "run");
    session.register_object_loader(Arc::new(DataSourceLoader));
    session
        .recording_proxy(&contract())
        .call(
            "accept",
            vec![Value::Native(NativeRef::new("primary".to_string()))],
        )
        .unwrap();
    let program = session.finish().unwrap();

    let collector = Collector::new();
    let mut registry = runtime(&collector);
    registry.register_function("lookup", |args, _| {
        Ok(Value::from(format!(
            "resource:{}",
            args[0].as_str().unwrap_or_default()
        )))
    });
    replay(&[program], registry).unwrap();
    assert_eq!(
        collector.args_of("accept"),
        vec![vec![Value::from("resource:primary")]]
    );
}

#[test]
fn test_missing_function_fails_replay() {
    let env = env(100);
    let mut session = env.session(false, "Loader", "run");
    session.register_object_loader(Arc::new(DataSourceLoader));
    session
        .recording_proxy(&contract())
        .call("accept", vec![Value::Native(NativeRef::new("x".to_string()))])
        .unwrap();
    let program = session.finish().unwrap();
    assert!(matches!(
        replay(&[program], runtime(&Collector::new())),
        Err(ReplayError::UnknownFunction(_))
    ));
}

#[test]
fn test_metadata_literal_replayed() {
    let qualifier = MetadataContract::new("Qualifier")
        .element("name", TypeRef::named("String"))
        .element_with_default("priority", TypeRef::Primitive(PrimitiveType::Int), Value::Int(10))
        .build();
    let env = env(100);
    let instance = MetadataInstance::new("Qualifier")
        .on("Service")
        .value("name", "primary");
    let literal = env.metadata_proxy(instance, &qualifier, vec![]).unwrap();

    let mut session = env.session(false, "Meta", "run");
    session
        .recording_proxy(&contract())
        .call("accept", vec![literal])
        .unwrap();
    let program = session.finish().unwrap();
    assert!(program
        .units
        .iter()
        .flat_map(|u| &u.instructions)
        .any(|i| matches!(i.opcode, Opcode::NewLiteral { .. })));

    let collector = Collector::new();
    replay(&[program], runtime(&collector)).unwrap();
    let args = collector.args_of("accept");
    let literal = args[0][0].as_metadata().unwrap();
    assert_eq!(literal.element("name"), Some(&Value::from("primary")));
    assert_eq!(literal.element("priority"), Some(&Value::Int(10)));
}

#[test]
fn test_unknown_recorder_at_replay() {
    let program = record_accepts(100, vec![Value::Int(1)]);
    let registry = interpreter::RuntimeRegistry::new(classes());
    assert!(matches!(
        replay(&[program], registry),
        Err(ReplayError::UnknownRecorder(_))
    ));
}
