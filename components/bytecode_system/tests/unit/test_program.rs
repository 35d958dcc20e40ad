//! Tests for StartupProgram

use bytecode_system::{
    CodeUnit, CollectionShape, Opcode, ProgramError, RegisterId, SlotId, StartupProgram,
};
use core_types::{LiteralType, MetadataContract, TypeRef};

fn single(ops: Vec<Opcode>, registers: u32) -> StartupProgram {
    let mut unit = CodeUnit::new("p_0");
    unit.register_count = registers;
    for op in ops {
        unit.emit(op);
    }
    let mut program = StartupProgram::new("p", false);
    program.units.push(unit);
    program
}

#[test]
fn test_empty_program_is_malformed() {
    let program = StartupProgram::new("p", false);
    assert!(matches!(program.validate(), Err(ProgramError::Malformed { .. })));
}

#[test]
fn test_last_unit_must_return() {
    let program = single(vec![Opcode::ChainNext(1)], 0);
    assert!(program.validate().is_err());
}

#[test]
fn test_terminator_inside_unit_rejected() {
    let program = single(vec![Opcode::Return, Opcode::Return], 0);
    assert!(program.validate().is_err());
}

#[test]
fn test_literal_types_must_be_carried() {
    let op = Opcode::NewLiteral {
        dst: RegisterId(0),
        literal: "Tag$Literal".into(),
        args: vec![],
    };
    let mut program = single(vec![op, Opcode::Return], 1);
    assert!(program.validate().is_err());

    let contract = MetadataContract::new("Tag");
    program.literal_types.push(LiteralType::for_contract(&contract));
    assert!(program.validate().is_ok());
    assert!(program.literal_type("Tag$Literal").is_some());
}

#[test]
fn test_json_keeps_every_field() {
    let ops = vec![
        Opcode::NewCollection {
            dst: RegisterId(0),
            shape: CollectionShape::EmptyList,
            args: vec![],
        },
        Opcode::NewArray {
            dst: RegisterId(1),
            component: TypeRef::array_of(TypeRef::named("String")),
            len: 2,
        },
        Opcode::WriteSlot {
            slot: SlotId(0),
            src: RegisterId(1),
        },
        Opcode::Return,
    ];
    let mut program = single(ops, 2);
    program.slot_count = 1;
    program.static_init = true;
    let restored = StartupProgram::from_json(&program.to_json().unwrap()).unwrap();
    assert_eq!(restored, program);
    assert!(restored.static_init);
}

#[test]
fn test_garbage_json_rejected() {
    assert!(matches!(
        StartupProgram::from_json("{\"name\": 1}"),
        Err(ProgramError::Json(_))
    ));
}
