use log::trace;
use wasm_encoder::{BlockType, Function, Instruction, MemArg, ValType};

use crate::{
    ast::expressions::Literal,
    errors::errors::{Error, ErrorImpl},
    model::{func::Func, func::FuncBody, types::Type},
    type_checker::typed_ast::{TypedExpr, TypedExprKind},
};

use super::{
    compiler::{CallTarget, Emitter},
    layout::{self, memarg, wire_type, WireType, HEADER_WIDTH},
};

/// Instructions and locals of one function body under construction.
///
/// Locals are laid out as the parameters, then one local per generator
/// slot, then scratch pointers for composite construction. Scratch locals
/// are handed out by nesting depth, so sibling constructions share them.
pub struct FunctionBuilder {
    pub instructions: Vec<Instruction<'static>>,
    params: u32,
    slots: Vec<ValType>,
    scratch_depth: u32,
    scratch_max: u32,
}

impl FunctionBuilder {
    pub fn new(params: u32, slots: &[Type]) -> Self {
        FunctionBuilder {
            instructions: Vec::new(),
            params,
            slots: slots
                .iter()
                .map(|slot| wire_type(slot).unwrap_or(WireType::I32).val_type())
                .collect(),
            scratch_depth: 0,
            scratch_max: 0,
        }
    }

    fn push(&mut self, instruction: Instruction<'static>) {
        self.instructions.push(instruction);
    }

    fn slot_local(&self, slot: u32) -> u32 {
        self.params + slot
    }

    fn acquire_scratch(&mut self) -> u32 {
        let local = self.params + self.slots.len() as u32 + self.scratch_depth;
        self.scratch_depth += 1;
        self.scratch_max = self.scratch_max.max(self.scratch_depth);
        local
    }

    fn release_scratch(&mut self) {
        self.scratch_depth -= 1;
    }

    /// Declared locals, parameters excluded.
    pub fn locals(&self) -> Vec<(u32, ValType)> {
        let mut locals: Vec<(u32, ValType)> = self.slots.iter().map(|ty| (1, *ty)).collect();
        if self.scratch_max > 0 {
            locals.push((self.scratch_max, ValType::I32));
        }
        locals
    }
}

/// Generates the body of an expression function.
pub fn gen_function(emitter: &Emitter, func: &Func) -> Result<Function, Error> {
    let FuncBody::Expr(body) = &func.body else {
        return Err(Error::new(
            ErrorImpl::NotPureExport {
                function: func.header.name.clone(),
            },
            func.header.position.clone(),
        ));
    };

    trace!(
        "Generating body of {} ({} params, {} locals)",
        func.header.name,
        func.header.parameters().len(),
        func.locals.len()
    );

    let mut builder = FunctionBuilder::new(func.header.parameters().len() as u32, &func.locals);
    gen_expression(emitter, &mut builder, body)?;
    builder.push(Instruction::End);

    let mut function = Function::new(builder.locals());
    for instruction in &builder.instructions {
        function.instruction(instruction);
    }

    Ok(function)
}

/// Generates the instructions leaving the value of `expression` on the
/// stack, or nothing for void expressions.
pub fn gen_expression(
    emitter: &Emitter,
    builder: &mut FunctionBuilder,
    expression: &TypedExpr,
) -> Result<(), Error> {
    match &expression.kind {
        TypedExprKind::Void => {}
        TypedExprKind::Literal(literal) => gen_literal(emitter, builder, literal),
        TypedExprKind::Param(index) => builder.push(Instruction::LocalGet(*index)),
        TypedExprKind::Local(slot) => {
            let local = builder.slot_local(*slot);
            builder.push(Instruction::LocalGet(local));
        }
        TypedExprKind::Assign { slot, value } => {
            gen_expression(emitter, builder, value)?;
            let local = builder.slot_local(*slot);
            builder.push(Instruction::LocalSet(local));
        }
        TypedExprKind::If {
            condition,
            then,
            otherwise,
        } => {
            gen_expression(emitter, builder, condition)?;

            let block = match wire_type(&expression.ty) {
                Some(wire) => BlockType::Result(wire.val_type()),
                None => BlockType::Empty,
            };
            builder.push(Instruction::If(block));
            gen_expression(emitter, builder, then)?;

            if let Some(otherwise) = otherwise {
                builder.push(Instruction::Else);
                gen_expression(emitter, builder, otherwise)?;
            }
            builder.push(Instruction::End);
        }
        TypedExprKind::Group(expressions) => {
            let last = expressions.len().saturating_sub(1);
            for (index, inner) in expressions.iter().enumerate() {
                gen_expression(emitter, builder, inner)?;
                if index != last && !inner.ty.is_void() {
                    builder.push(Instruction::Drop);
                }
            }
        }
        TypedExprKind::Call { func, arguments } => {
            for argument in arguments {
                gen_expression(emitter, builder, argument)?;
            }

            match emitter.call_target(*func)? {
                CallTarget::Inline(instructions) => {
                    builder.instructions.extend(instructions.iter().cloned())
                }
                CallTarget::Index(index) => builder.push(Instruction::Call(index)),
            }
        }
        TypedExprKind::InstancedCall {
            group,
            receiver,
            arguments,
        } => {
            let region = emitter.table_region(group).ok_or_else(|| {
                Error::new(
                    ErrorImpl::UnhandledExpression {
                        kind: String::from("instanced call without a call table"),
                    },
                    expression.position.clone(),
                )
            })?;
            let (base, type_index) = (region.base, region.type_index);

            let receiver_local = builder.acquire_scratch();
            gen_expression(emitter, builder, receiver)?;
            builder.push(Instruction::LocalTee(receiver_local));

            for argument in arguments {
                gen_expression(emitter, builder, argument)?;
            }

            // Table slot = region base + struct index of the receiver
            builder.push(Instruction::LocalGet(receiver_local));
            builder.push(Instruction::I32Load(memarg(0, WireType::I32)));
            builder.push(Instruction::I32Const(base as i32));
            builder.push(Instruction::I32Add);
            builder.push(Instruction::CallIndirect {
                type_index,
                table_index: 0,
            });
            builder.release_scratch();
        }
        TypedExprKind::Tuple(elements) => {
            gen_composite(emitter, builder, expression, None, elements)?;
        }
        TypedExprKind::List(elements) => {
            let count = elements.len() as i32;
            gen_composite(emitter, builder, expression, Some(count), elements)?;
        }
        TypedExprKind::Build {
            struct_index,
            fields,
        } => {
            let index = *struct_index as i32;
            gen_composite(emitter, builder, expression, Some(index), fields)?;
        }
        TypedExprKind::Field {
            base,
            index,
            fields,
            header,
        } => {
            gen_expression(emitter, builder, base)?;

            let offset = header + TypedExpr::field_offset(fields, *index);
            let load = layout::load(&fields[*index], offset)
                .ok_or_else(|| unhandled(expression))?;
            builder.push(load);
        }
        TypedExprKind::Index { base, index, width } => {
            gen_expression(emitter, builder, base)?;
            gen_expression(emitter, builder, index)?;
            builder.push(Instruction::I32Const(*width as i32));
            builder.push(Instruction::I32Mul);
            builder.push(Instruction::I32Add);

            let load =
                layout::load(&expression.ty, HEADER_WIDTH).ok_or_else(|| unhandled(expression))?;
            builder.push(load);
        }
    }

    Ok(())
}

fn unhandled(expression: &TypedExpr) -> Error {
    Error::new(
        ErrorImpl::UnhandledExpression {
            kind: format!("{} of type {}", expression.describe(), expression.ty),
        },
        expression.position.clone(),
    )
}

fn gen_literal(emitter: &Emitter, builder: &mut FunctionBuilder, literal: &Literal) {
    match literal {
        Literal::I32(value) => builder.push(Instruction::I32Const(*value)),
        Literal::I64(value) => builder.push(Instruction::I64Const(*value)),
        Literal::F32(value) => builder.push(Instruction::F32Const((*value).into())),
        Literal::F64(value) => builder.push(Instruction::F64Const((*value).into())),
        Literal::Bool(value) => builder.push(Instruction::I32Const(*value as i32)),
        Literal::String(value) => gen_string(emitter, builder, value.as_bytes()),
    }
}

/// Allocates `[len][bytes]` and writes the bytes a word at a time.
fn gen_string(emitter: &Emitter, builder: &mut FunctionBuilder, bytes: &[u8]) {
    let pointer = builder.acquire_scratch();

    builder.push(Instruction::I32Const((HEADER_WIDTH as usize + bytes.len()) as i32));
    builder.push(Instruction::Call(emitter.alloc_index()));
    builder.push(Instruction::LocalSet(pointer));

    builder.push(Instruction::LocalGet(pointer));
    builder.push(Instruction::I32Const(bytes.len() as i32));
    builder.push(Instruction::I32Store(memarg(0, WireType::I32)));

    let mut chunks = bytes.chunks_exact(4);
    let mut offset = HEADER_WIDTH;
    for chunk in &mut chunks {
        let word = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        builder.push(Instruction::LocalGet(pointer));
        builder.push(Instruction::I32Const(word));
        builder.push(Instruction::I32Store(memarg(offset, WireType::I32)));
        offset += 4;
    }

    for byte in chunks.remainder() {
        builder.push(Instruction::LocalGet(pointer));
        builder.push(Instruction::I32Const(*byte as i32));
        builder.push(Instruction::I32Store8(MemArg {
            offset: offset as u64,
            align: 0,
            memory_index: 0,
        }));
        offset += 1;
    }

    builder.push(Instruction::LocalGet(pointer));
    builder.release_scratch();
}

/// Allocates a composite value: an optional header word followed by the
/// packed `fields`, and leaves its address on the stack.
fn gen_composite(
    emitter: &Emitter,
    builder: &mut FunctionBuilder,
    expression: &TypedExpr,
    header: Option<i32>,
    fields: &[TypedExpr],
) -> Result<(), Error> {
    let header_width = if header.is_some() { HEADER_WIDTH } else { 0 };
    let size: u32 = header_width + fields.iter().map(|field| field.ty.width()).sum::<u32>();

    let pointer = builder.acquire_scratch();
    builder.push(Instruction::I32Const(size as i32));
    builder.push(Instruction::Call(emitter.alloc_index()));
    builder.push(Instruction::LocalSet(pointer));

    if let Some(header) = header {
        builder.push(Instruction::LocalGet(pointer));
        builder.push(Instruction::I32Const(header));
        builder.push(Instruction::I32Store(memarg(0, WireType::I32)));
    }

    let mut offset = header_width;
    for field in fields {
        let store = layout::store(&field.ty, offset).ok_or_else(|| unhandled(expression))?;

        builder.push(Instruction::LocalGet(pointer));
        gen_expression(emitter, builder, field)?;
        builder.push(store);
        offset += field.ty.width();
    }

    builder.push(Instruction::LocalGet(pointer));
    builder.release_scratch();

    Ok(())
}
