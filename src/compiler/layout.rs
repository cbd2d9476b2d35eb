//! Wire types and memory layouts.
//!
//! Every value is carried as one of four wire types. Composite values
//! (strings, arrays, tuples, built structs) are pointers into linear memory
//! laid out as:
//!
//! - string: `[len:i32][utf-8 bytes]`
//! - array: `[count:i32][elements]`
//! - tuple: packed fields
//! - built struct: `[struct index:i32][packed fields]`

use wasm_encoder::{Instruction, MemArg, ValType};

use crate::model::types::{Native, Type, TypeKind};

/// Size of the count and struct-index words.
pub const HEADER_WIDTH: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    I32,
    I64,
    F32,
    F64,
}

impl WireType {
    pub fn val_type(self) -> ValType {
        match self {
            WireType::I32 => ValType::I32,
            WireType::I64 => ValType::I64,
            WireType::F32 => ValType::F32,
            WireType::F64 => ValType::F64,
        }
    }

    /// log2 of the natural alignment.
    fn align(self) -> u32 {
        match self {
            WireType::I32 | WireType::F32 => 2,
            WireType::I64 | WireType::F64 => 3,
        }
    }
}

/// Wire type of a value, `None` for void.
pub fn wire_type(ty: &Type) -> Option<WireType> {
    if ty.is_array() {
        return Some(WireType::I32);
    }

    match &ty.kind {
        TypeKind::Void => None,
        TypeKind::Native(Native::I64) => Some(WireType::I64),
        TypeKind::Native(Native::F32) => Some(WireType::F32),
        TypeKind::Native(Native::F64) => Some(WireType::F64),
        _ => Some(WireType::I32),
    }
}

/// A function type on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<WireType>,
    pub results: Vec<WireType>,
}

impl Signature {
    pub fn new(params: &[Type], output: &Type) -> Self {
        Signature {
            params: params.iter().filter_map(wire_type).collect(),
            results: wire_type(output).into_iter().collect(),
        }
    }

    pub fn param_types(&self) -> Vec<ValType> {
        self.params.iter().map(|wire| wire.val_type()).collect()
    }

    pub fn result_types(&self) -> Vec<ValType> {
        self.results.iter().map(|wire| wire.val_type()).collect()
    }
}

pub fn memarg(offset: u32, wire: WireType) -> MemArg {
    MemArg {
        offset: offset as u64,
        align: wire.align(),
        memory_index: 0,
    }
}

/// Load of a value of type `ty` stored at `offset` from the address on
/// the stack.
pub fn load(ty: &Type, offset: u32) -> Option<Instruction<'static>> {
    let wire = wire_type(ty)?;
    let arg = memarg(offset, wire);

    Some(match wire {
        WireType::I32 => Instruction::I32Load(arg),
        WireType::I64 => Instruction::I64Load(arg),
        WireType::F32 => Instruction::F32Load(arg),
        WireType::F64 => Instruction::F64Load(arg),
    })
}

pub fn store(ty: &Type, offset: u32) -> Option<Instruction<'static>> {
    let wire = wire_type(ty)?;
    let arg = memarg(offset, wire);

    Some(match wire {
        WireType::I32 => Instruction::I32Store(arg),
        WireType::I64 => Instruction::I64Store(arg),
        WireType::F32 => Instruction::F32Store(arg),
        WireType::F64 => Instruction::F64Store(arg),
    })
}
