//! Contract compliance tests for bytecode_system
//!
//! These tests pin the program surface the recorder and replay VM share.

use bytecode_system::{InMemoryOutput, Opcode, ProgramOutput, RegisterId, StartupProgram};

/// Contract: programs are written through a trait object
#[test]
fn test_program_output_is_object_safe() {
    let mut out: Box<dyn ProgramOutput> = Box::new(InMemoryOutput::new());
    let mut program = StartupProgram::new("p", false);
    program.units.push(bytecode_system::CodeUnit::new("p_0"));
    program.units[0].emit(Opcode::Return);
    assert!(out.write_program(&program).is_ok());
}

/// Contract: every value-producing step names its destination
#[test]
fn test_value_steps_have_destinations() {
    let dst = RegisterId(0);
    let steps = vec![
        Opcode::LoadNull { dst },
        Opcode::GetContextValue {
            dst,
            key: "k".to_string(),
        },
        Opcode::NewInstance {
            dst,
            ty: "A".into(),
        },
        Opcode::NewRecorder {
            dst,
            contract: "R".into(),
        },
        Opcode::NewOptional { dst, value: None },
    ];
    for step in steps {
        assert_eq!(step.destination(), Some(dst), "{}", step);
    }
}

/// Contract: summary serializes for the inspector
#[test]
fn test_summary_serializes() {
    let mut program = StartupProgram::new("p", true);
    program.units.push(bytecode_system::CodeUnit::new("p_0"));
    program.units[0].emit(Opcode::Return);
    let json = serde_json::to_string(&program.summary()).unwrap();
    assert!(json.contains("\"phase\":\"static-init\""));
}
