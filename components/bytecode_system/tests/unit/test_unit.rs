//! Tests for CodeUnit

use bytecode_system::{CodeUnit, Constant, Opcode, RegisterId};

#[test]
fn test_unit_emit_instruction() {
    let mut unit = CodeUnit::new("u");
    unit.emit(Opcode::LoadNull { dst: RegisterId(0) });
    assert_eq!(unit.instructions.len(), 1);
    assert!(matches!(unit.instructions[0].opcode, Opcode::LoadNull { .. }));
    assert!(unit.instructions[0].origin.is_none());
}

#[test]
fn test_unit_emit_from_keeps_origin() {
    let mut unit = CodeUnit::new("u");
    unit.emit_from(Opcode::Return, Some(7));
    assert_eq!(unit.instructions[0].origin, Some(7));
}

#[test]
fn test_unit_constants() {
    let mut unit = CodeUnit::new("u");
    assert_eq!(unit.add_constant(Constant::Double(1.5)), 0);
    assert_eq!(unit.add_constant(Constant::Char('x')), 1);
    assert_eq!(unit.add_constant(Constant::Double(1.5)), 0);
}

#[test]
fn test_invocation_count() {
    let mut unit = CodeUnit::new("u");
    let recorder = unit.alloc_register();
    unit.emit(Opcode::Invoke {
        dst: None,
        recorder,
        method: "a".to_string(),
        args: vec![],
    });
    unit.emit(Opcode::Invoke {
        dst: None,
        recorder,
        method: "b".to_string(),
        args: vec![],
    });
    unit.emit(Opcode::Return);
    assert_eq!(unit.invocation_count(), 2);
}
