use std::collections::HashMap;

use lazy_static::lazy_static;
use wasm_encoder::Instruction;

use super::layout::{memarg, WireType};

lazy_static! {
    /// Instruction sequences of the builtin kernel functions. Builtins are
    /// inlined at the call site after their arguments.
    pub static ref INJECTOR: HashMap<&'static str, Vec<Instruction<'static>>> = {
        let mut map = HashMap::new();

        map.insert("nop", vec![]);
        map.insert("len", vec![Instruction::I32Load(memarg(0, WireType::I32))]);

        map.insert("bool.eq", vec![Instruction::I32Eq]);
        map.insert("bool.ne", vec![Instruction::I32Ne]);
        map.insert("bool.and", vec![Instruction::I32And]);
        map.insert("bool.or", vec![Instruction::I32Or]);
        map.insert("bool.not", vec![Instruction::I32Eqz]);

        map.insert("i32.add", vec![Instruction::I32Add]);
        map.insert("i32.sub", vec![Instruction::I32Sub]);
        map.insert("i32.mul", vec![Instruction::I32Mul]);
        map.insert("i32.div_s", vec![Instruction::I32DivS]);
        map.insert("i32.rem_s", vec![Instruction::I32RemS]);
        map.insert("i32.neg", vec![Instruction::I32Const(-1), Instruction::I32Mul]);
        map.insert("i32.eq", vec![Instruction::I32Eq]);
        map.insert("i32.ne", vec![Instruction::I32Ne]);
        map.insert("i32.lt_s", vec![Instruction::I32LtS]);
        map.insert("i32.le_s", vec![Instruction::I32LeS]);
        map.insert("i32.gt_s", vec![Instruction::I32GtS]);
        map.insert("i32.ge_s", vec![Instruction::I32GeS]);

        map.insert("i64.add", vec![Instruction::I64Add]);
        map.insert("i64.sub", vec![Instruction::I64Sub]);
        map.insert("i64.mul", vec![Instruction::I64Mul]);
        map.insert("i64.div_s", vec![Instruction::I64DivS]);
        map.insert("i64.rem_s", vec![Instruction::I64RemS]);
        map.insert("i64.neg", vec![Instruction::I64Const(-1), Instruction::I64Mul]);
        map.insert("i64.eq", vec![Instruction::I64Eq]);
        map.insert("i64.ne", vec![Instruction::I64Ne]);
        map.insert("i64.lt_s", vec![Instruction::I64LtS]);
        map.insert("i64.le_s", vec![Instruction::I64LeS]);
        map.insert("i64.gt_s", vec![Instruction::I64GtS]);
        map.insert("i64.ge_s", vec![Instruction::I64GeS]);

        map.insert("f32.add", vec![Instruction::F32Add]);
        map.insert("f32.sub", vec![Instruction::F32Sub]);
        map.insert("f32.mul", vec![Instruction::F32Mul]);
        map.insert("f32.div", vec![Instruction::F32Div]);
        map.insert("f32.neg", vec![Instruction::F32Neg]);
        map.insert("f32.eq", vec![Instruction::F32Eq]);
        map.insert("f32.ne", vec![Instruction::F32Ne]);
        map.insert("f32.lt", vec![Instruction::F32Lt]);
        map.insert("f32.le", vec![Instruction::F32Le]);
        map.insert("f32.gt", vec![Instruction::F32Gt]);
        map.insert("f32.ge", vec![Instruction::F32Ge]);

        map.insert("f64.add", vec![Instruction::F64Add]);
        map.insert("f64.sub", vec![Instruction::F64Sub]);
        map.insert("f64.mul", vec![Instruction::F64Mul]);
        map.insert("f64.div", vec![Instruction::F64Div]);
        map.insert("f64.neg", vec![Instruction::F64Neg]);
        map.insert("f64.eq", vec![Instruction::F64Eq]);
        map.insert("f64.ne", vec![Instruction::F64Ne]);
        map.insert("f64.lt", vec![Instruction::F64Lt]);
        map.insert("f64.le", vec![Instruction::F64Le]);
        map.insert("f64.gt", vec![Instruction::F64Gt]);
        map.insert("f64.ge", vec![Instruction::F64Ge]);

        map.insert("i32.to_i64", vec![Instruction::I64ExtendI32S]);
        map.insert("i32.to_f32", vec![Instruction::F32ConvertI32S]);
        map.insert("i32.to_f64", vec![Instruction::F64ConvertI32S]);
        map.insert("i64.to_i32", vec![Instruction::I32WrapI64]);
        map.insert("i64.to_f32", vec![Instruction::F32ConvertI64S]);
        map.insert("i64.to_f64", vec![Instruction::F64ConvertI64S]);
        map.insert("f32.to_i32", vec![Instruction::I32TruncF32S]);
        map.insert("f32.to_i64", vec![Instruction::I64TruncF32S]);
        map.insert("f32.to_f64", vec![Instruction::F64PromoteF32]);
        map.insert("f64.to_i32", vec![Instruction::I32TruncF64S]);
        map.insert("f64.to_i64", vec![Instruction::I64TruncF64S]);
        map.insert("f64.to_f32", vec![Instruction::F32DemoteF64]);

        map
    };
}

/// Instructions of builtin `name`, if it exists.
pub fn inject(name: &str) -> Option<&'static [Instruction<'static>]> {
    INJECTOR.get(name).map(|instructions| instructions.as_slice())
}
