//! Step opcodes of a startup program.
//!
//! Steps are register based: every value-producing step writes its result
//! into a destination register of the current unit. Registers do not
//! survive a unit boundary; values needed by later units travel through the
//! slot table (`ReadSlot` / `WriteSlot`).

use core_types::{TypeName, TypeRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Register identifier, local to one code unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegisterId(pub u32);

/// Index into the program's shared slot table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub u32);

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Built-in empty and singleton container shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionShape {
    /// Immutable empty list
    EmptyList,
    /// Immutable empty set
    EmptySet,
    /// Immutable empty map
    EmptyMap,
    /// Immutable one-element list
    SingletonList,
    /// Immutable one-element set
    SingletonSet,
    /// Immutable one-entry map
    SingletonMap,
}

impl CollectionShape {
    /// Number of register arguments the shape's constructor takes
    pub fn arity(&self) -> usize {
        match self {
            CollectionShape::EmptyList | CollectionShape::EmptySet | CollectionShape::EmptyMap => 0,
            CollectionShape::SingletonList | CollectionShape::SingletonSet => 1,
            CollectionShape::SingletonMap => 2,
        }
    }

    /// Name of the concrete built-in class
    pub fn class_name(&self) -> &'static str {
        use core_types::well_known::*;
        match self {
            CollectionShape::EmptyList => EMPTY_LIST,
            CollectionShape::EmptySet => EMPTY_SET,
            CollectionShape::EmptyMap => EMPTY_MAP,
            CollectionShape::SingletonList => SINGLETON_LIST,
            CollectionShape::SingletonSet => SINGLETON_SET,
            CollectionShape::SingletonMap => SINGLETON_MAP,
        }
    }

    /// Shape whose concrete class is `name`
    pub fn from_class_name(name: &str) -> Option<Self> {
        use core_types::well_known::*;
        Some(match name {
            EMPTY_LIST => CollectionShape::EmptyList,
            EMPTY_SET => CollectionShape::EmptySet,
            EMPTY_MAP => CollectionShape::EmptyMap,
            SINGLETON_LIST => CollectionShape::SingletonList,
            SINGLETON_SET => CollectionShape::SingletonSet,
            SINGLETON_MAP => CollectionShape::SingletonMap,
            _ => return None,
        })
    }
}

/// One step of a code unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Opcode {
    // Literals
    /// Load null
    LoadNull {
        /// Destination register
        dst: RegisterId,
    },
    /// Load a constant from the unit's constant pool
    LoadConstant {
        /// Destination register
        dst: RegisterId,
        /// Constant pool index
        index: usize,
    },
    /// Load an enum constant by declaring type and name
    LoadEnum {
        /// Destination register
        dst: RegisterId,
        /// Declaring enum type
        ty: TypeName,
        /// Constant name
        name: String,
    },
    /// Load a class reference, resolved by name
    LoadClass {
        /// Destination register
        dst: RegisterId,
        /// Class name
        name: TypeName,
    },

    // Slot table
    /// Read a slot written by an earlier step
    ReadSlot {
        /// Destination register
        dst: RegisterId,
        /// Slot to read
        slot: SlotId,
    },
    /// Write a slot, exactly once per program run
    WriteSlot {
        /// Slot to write
        slot: SlotId,
        /// Source register
        src: RegisterId,
    },

    // Ambient context
    /// Fetch a value from the startup context
    GetContextValue {
        /// Destination register
        dst: RegisterId,
        /// Context key
        key: String,
    },
    /// Publish a value into the startup context
    PutContextValue {
        /// Context key
        key: String,
        /// Source register
        src: RegisterId,
    },

    // Construction
    /// Construct through the no-arg constructor
    NewInstance {
        /// Destination register
        dst: RegisterId,
        /// Class to construct
        ty: TypeName,
    },
    /// Construct through an explicit constructor
    NewInstanceWith {
        /// Destination register
        dst: RegisterId,
        /// Class to construct
        ty: TypeName,
        /// Constructor parameter types
        params: Vec<TypeRef>,
        /// Argument registers
        args: Vec<RegisterId>,
    },
    /// Construct a built-in empty or singleton container
    NewCollection {
        /// Destination register
        dst: RegisterId,
        /// Container shape
        shape: CollectionShape,
        /// Element or entry registers
        args: Vec<RegisterId>,
    },
    /// Construct an optional, present when `value` is set
    NewOptional {
        /// Destination register
        dst: RegisterId,
        /// Payload register
        value: Option<RegisterId>,
    },
    /// Allocate an array
    NewArray {
        /// Destination register
        dst: RegisterId,
        /// Component type
        component: TypeRef,
        /// Length
        len: usize,
    },
    /// Store into an array element
    ArrayStore {
        /// Array register
        array: RegisterId,
        /// Element index
        index: usize,
        /// Source register
        src: RegisterId,
    },
    /// Construct a metadata literal through its positional constructor
    NewLiteral {
        /// Destination register
        dst: RegisterId,
        /// Literal type name
        literal: TypeName,
        /// Element value registers, in declaration order
        args: Vec<RegisterId>,
    },
    /// Rebuild a value from its serialized stand-in
    Deserialize {
        /// Destination register
        dst: RegisterId,
        /// Substitution id
        substitution: String,
        /// Serialized value register
        src: RegisterId,
    },
    /// Construct a recorder instance
    NewRecorder {
        /// Destination register
        dst: RegisterId,
        /// Recorder contract name
        contract: TypeName,
    },
    /// Call a registered static function
    CallStatic {
        /// Destination register, if the result is kept
        dst: Option<RegisterId>,
        /// Function name
        function: String,
        /// Argument registers
        args: Vec<RegisterId>,
    },

    // Mutation
    /// Add to a collection
    Append {
        /// Collection register
        target: RegisterId,
        /// Element register
        src: RegisterId,
    },
    /// Put a map entry
    Put {
        /// Map register
        target: RegisterId,
        /// Key register
        key: RegisterId,
        /// Value register
        value: RegisterId,
    },
    /// Read a property through its accessor
    GetProperty {
        /// Destination register
        dst: RegisterId,
        /// Object register
        target: RegisterId,
        /// Property name
        property: String,
    },
    /// Write a property through its mutator
    SetProperty {
        /// Object register
        target: RegisterId,
        /// Property name
        property: String,
        /// Source register
        src: RegisterId,
    },
    /// Write a public field
    WriteField {
        /// Object register
        target: RegisterId,
        /// Field name
        field: String,
        /// Source register
        src: RegisterId,
    },

    // Invocation
    /// Invoke a recorder method
    Invoke {
        /// Destination register for the result, if any
        dst: Option<RegisterId>,
        /// Recorder instance register
        recorder: RegisterId,
        /// Method name
        method: String,
        /// Argument registers
        args: Vec<RegisterId>,
    },

    // Control flow
    /// Continue with the unit at the given index
    ChainNext(usize),
    /// Return to the program's caller
    Return,
}

impl Opcode {
    /// Check if this opcode ends a unit
    pub fn is_terminator(&self) -> bool {
        matches!(self, Opcode::ChainNext(_) | Opcode::Return)
    }

    /// Register written by this step, if any
    pub fn destination(&self) -> Option<RegisterId> {
        match self {
            Opcode::LoadNull { dst }
            | Opcode::LoadConstant { dst, .. }
            | Opcode::LoadEnum { dst, .. }
            | Opcode::LoadClass { dst, .. }
            | Opcode::ReadSlot { dst, .. }
            | Opcode::GetContextValue { dst, .. }
            | Opcode::NewInstance { dst, .. }
            | Opcode::NewInstanceWith { dst, .. }
            | Opcode::NewCollection { dst, .. }
            | Opcode::NewOptional { dst, .. }
            | Opcode::NewArray { dst, .. }
            | Opcode::NewLiteral { dst, .. }
            | Opcode::Deserialize { dst, .. }
            | Opcode::NewRecorder { dst, .. }
            | Opcode::GetProperty { dst, .. } => Some(*dst),
            Opcode::CallStatic { dst, .. } | Opcode::Invoke { dst, .. } => *dst,
            _ => None,
        }
    }

    /// Registers read by this step
    pub fn sources(&self) -> Vec<RegisterId> {
        match self {
            Opcode::WriteSlot { src, .. }
            | Opcode::PutContextValue { src, .. }
            | Opcode::Deserialize { src, .. } => vec![*src],
            Opcode::NewInstanceWith { args, .. }
            | Opcode::NewCollection { args, .. }
            | Opcode::NewLiteral { args, .. }
            | Opcode::CallStatic { args, .. } => args.clone(),
            Opcode::NewOptional { value, .. } => value.iter().copied().collect(),
            Opcode::ArrayStore { array, src, .. } => vec![*array, *src],
            Opcode::Append { target, src } => vec![*target, *src],
            Opcode::Put { target, key, value } => vec![*target, *key, *value],
            Opcode::GetProperty { target, .. } => vec![*target],
            Opcode::SetProperty { target, src, .. } | Opcode::WriteField { target, src, .. } => {
                vec![*target, *src]
            }
            Opcode::Invoke { recorder, args, .. } => {
                let mut sources = vec![*recorder];
                sources.extend(args.iter().copied());
                sources
            }
            _ => Vec::new(),
        }
    }

    /// Slot touched by this step, if any
    pub fn slot(&self) -> Option<SlotId> {
        match self {
            Opcode::ReadSlot { slot, .. } | Opcode::WriteSlot { slot, .. } => Some(*slot),
            _ => None,
        }
    }
}

fn registers(regs: &[RegisterId]) -> String {
    regs.iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::LoadNull { dst } => write!(f, "LoadNull {}", dst),
            Opcode::LoadConstant { dst, index } => write!(f, "LoadConstant {}, #{}", dst, index),
            Opcode::LoadEnum { dst, ty, name } => write!(f, "LoadEnum {}, {}.{}", dst, ty, name),
            Opcode::LoadClass { dst, name } => write!(f, "LoadClass {}, {}", dst, name),
            Opcode::ReadSlot { dst, slot } => write!(f, "ReadSlot {}, {}", dst, slot),
            Opcode::WriteSlot { slot, src } => write!(f, "WriteSlot {}, {}", slot, src),
            Opcode::GetContextValue { dst, key } => {
                write!(f, "GetContextValue {}, \"{}\"", dst, key)
            }
            Opcode::PutContextValue { key, src } => {
                write!(f, "PutContextValue \"{}\", {}", key, src)
            }
            Opcode::NewInstance { dst, ty } => write!(f, "NewInstance {}, {}", dst, ty),
            Opcode::NewInstanceWith {
                dst,
                ty,
                params,
                args,
            } => {
                let params = params
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "NewInstance {}, {}({}) [{}]", dst, ty, params, registers(args))
            }
            Opcode::NewCollection { dst, shape, args } => {
                write!(f, "NewCollection {}, {:?} [{}]", dst, shape, registers(args))
            }
            Opcode::NewOptional { dst, value } => match value {
                Some(value) => write!(f, "NewOptional {}, {}", dst, value),
                None => write!(f, "NewOptional {}, empty", dst),
            },
            Opcode::NewArray { dst, component, len } => {
                write!(f, "NewArray {}, {}[{}]", dst, component, len)
            }
            Opcode::ArrayStore { array, index, src } => {
                write!(f, "ArrayStore {}[{}], {}", array, index, src)
            }
            Opcode::NewLiteral { dst, literal, args } => {
                write!(f, "NewLiteral {}, {} [{}]", dst, literal, registers(args))
            }
            Opcode::Deserialize {
                dst,
                substitution,
                src,
            } => write!(f, "Deserialize {}, {} <- {}", dst, substitution, src),
            Opcode::NewRecorder { dst, contract } => write!(f, "NewRecorder {}, {}", dst, contract),
            Opcode::CallStatic {
                dst,
                function,
                args,
            } => match dst {
                Some(dst) => write!(f, "CallStatic {}, {}({})", dst, function, registers(args)),
                None => write!(f, "CallStatic {}({})", function, registers(args)),
            },
            Opcode::Append { target, src } => write!(f, "Append {}, {}", target, src),
            Opcode::Put { target, key, value } => {
                write!(f, "Put {}, {} => {}", target, key, value)
            }
            Opcode::GetProperty {
                dst,
                target,
                property,
            } => write!(f, "GetProperty {}, {}.{}", dst, target, property),
            Opcode::SetProperty {
                target,
                property,
                src,
            } => write!(f, "SetProperty {}.{}, {}", target, property, src),
            Opcode::WriteField { target, field, src } => {
                write!(f, "WriteField {}.{}, {}", target, field, src)
            }
            Opcode::Invoke {
                dst,
                recorder,
                method,
                args,
            } => match dst {
                Some(dst) => write!(
                    f,
                    "Invoke {}, {}.{}({})",
                    dst,
                    recorder,
                    method,
                    registers(args)
                ),
                None => write!(f, "Invoke {}.{}({})", recorder, method, registers(args)),
            },
            Opcode::ChainNext(next) => write!(f, "ChainNext unit{}", next),
            Opcode::Return => write!(f, "Return"),
        }
    }
}
