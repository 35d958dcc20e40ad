//! Program Lifecycle Integration Tests
//!
//! Programs are written, read back, inspected and replayed; phases are
//! checked across the static-init and runtime-init programs of one build.

use bytecode_system::{DirectoryOutput, InMemoryOutput, StartupProgram};
use core_types::{builtin, ObjectRef, Value};
use integration_tests::{classes, contract, replay, runtime, Collector};
use recorder::{RecorderConfig, RecordingEnvironment, RecordingError};
use startup_cli::Inspector;
use tempfile::TempDir;

fn env(config: RecorderConfig) -> RecordingEnvironment {
    RecordingEnvironment::new(classes(), config).unwrap()
}

fn sample(env: &RecordingEnvironment) -> StartupProgram {
    let mut session = env.session(false, "Sample", "run");
    let proxy = session.recording_proxy(&contract());
    let handle = proxy.call("open", vec![Value::from("db")]).unwrap().unwrap();
    let items = Value::Object(ObjectRef::list(
        builtin("ArrayList").unwrap(),
        vec![Value::Int(1), Value::from("two")],
    ));
    proxy.call("pair", vec![handle, items]).unwrap();
    session.finish().unwrap()
}

#[test]
fn test_json_round_trip_replays_identically() {
    let env = env(RecorderConfig::default().with_max_steps_per_unit(2));
    let program = sample(&env);
    let restored = StartupProgram::from_json(&program.to_json().unwrap()).unwrap();
    assert_eq!(restored, program);

    let direct = Collector::new();
    let decoded = Collector::new();
    replay(&[program], runtime(&direct)).unwrap();
    replay(&[restored], runtime(&decoded)).unwrap();
    assert_eq!(direct.calls(), decoded.calls());
    assert_eq!(direct.calls().len(), 2);
}

#[test]
fn test_written_program_inspected_and_replayed() {
    let dir = TempDir::new().unwrap();
    let mut output = DirectoryOutput::new(dir.path());
    let env = env(RecorderConfig::default());
    let mut session = env.session(true, "Disk", "boot");
    session
        .recording_proxy(&contract())
        .call("accept", vec![Value::from("x")])
        .unwrap();
    let program = session.write_program(&mut output).unwrap();

    let inspector = Inspector::load(output.path_for(&program.name)).unwrap();
    let summary = inspector.summary_text();
    assert!(summary.contains("startup.steps.Disk$boot1"));
    assert!(summary.contains("static-init"));
    assert!(summary.contains("invocations:  1"));

    let read = output.read_program(&program.name).unwrap();
    let collector = Collector::new();
    replay(&[read], runtime(&collector)).unwrap();
    assert_eq!(collector.args_of("accept"), vec![vec![Value::from("x")]]);
}

#[test]
fn test_build_with_both_phases() {
    let env = env(RecorderConfig::default());
    let mut output = InMemoryOutput::new();

    let mut early = env.session(true, "Config", "boot");
    let handle = early
        .recording_proxy(&contract())
        .call("open", vec![Value::from("config")])
        .unwrap()
        .unwrap();
    early.write_program(&mut output).unwrap();

    let mut late = env.session(false, "Server", "run");
    late.recording_proxy(&contract())
        .call("accept", vec![handle])
        .unwrap();
    late.write_program(&mut output).unwrap();

    let programs = output.into_programs();
    assert_eq!(programs[0].phase(), "static-init");
    assert_eq!(programs[1].phase(), "runtime-init");

    let collector = Collector::new();
    let (context, stats) = replay(&programs, runtime(&collector)).unwrap();
    assert_eq!(stats.invocations, 2);
    assert_eq!(stats.recorders, 2);
    assert_eq!(context.len(), 1);
    assert_eq!(
        collector.args_of("accept"),
        vec![vec![Value::from("handle:config")]]
    );
}

#[test]
fn test_runtime_result_rejected_in_static_program() {
    let env = env(RecorderConfig::default());
    let mut late = env.session(false, "Server", "run");
    let handle = late
        .recording_proxy(&contract())
        .call("open", vec![Value::from("socket")])
        .unwrap()
        .unwrap();

    let mut early = env.session(true, "Config", "boot");
    early
        .recording_proxy(&contract())
        .call("accept", vec![handle])
        .unwrap();
    let err = early.finish().unwrap_err();
    assert!(matches!(err, RecordingError::PhaseMismatch { .. }));
    assert!(late.finish().is_ok());
}

#[test]
fn test_configuration_from_json() {
    let config =
        RecorderConfig::from_json(r#"{"max_steps_per_unit": 1, "program_prefix": "boot."}"#)
            .unwrap();
    let env = env(config);
    let program = sample(&env);
    assert!(program.name.starts_with("boot.Sample$run"));
    assert!(program.units.len() > 1);

    assert!(matches!(
        RecorderConfig::from_json(r#"{"max_steps_per_unit": 0}"#),
        Err(RecordingError::InvalidConfig(_))
    ));
}

#[test]
fn test_recording_after_environment_closed() {
    let env = env(RecorderConfig::default());
    let mut session = env.session(false, "Closed", "run");
    let proxy = session.recording_proxy(&contract());
    proxy.call("accept", vec![Value::Int(1)]).unwrap();
    session.finish().unwrap();
    env.close();
    assert!(matches!(
        proxy.call("accept", vec![Value::Int(2)]),
        Err(RecordingError::AlreadyFinalized)
    ));
    assert_eq!(env.literal_provider().generated_count(), 0);
}
