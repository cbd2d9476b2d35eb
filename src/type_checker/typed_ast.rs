//! Typed intermediate representation.
//!
//! This module contains the typed expression tree produced by the
//! generator. Every node carries its resolved type, every name has been
//! turned into a parameter or local slot and every call into a concrete
//! function or instance group.
//!
//! The typed tree is consumed by the code emitter to produce the binary.

use crate::{
    ast::expressions::Literal,
    model::{definition::GroupRef, func::FuncId, types::Type},
    Position,
};

#[derive(Debug, Clone)]
pub enum TypedExprKind {
    Void,
    Literal(Literal),
    Param(u32),
    Local(u32),
    /// First write of a local slot
    Assign {
        slot: u32,
        value: Box<TypedExpr>,
    },
    If {
        condition: Box<TypedExpr>,
        then: Box<TypedExpr>,
        otherwise: Option<Box<TypedExpr>>,
    },
    Group(Vec<TypedExpr>),
    Call {
        func: FuncId,
        arguments: Vec<TypedExpr>,
    },
    /// Call dispatched on the receiver's runtime struct index
    InstancedCall {
        group: GroupRef,
        receiver: Box<TypedExpr>,
        arguments: Vec<TypedExpr>,
    },
    Tuple(Vec<TypedExpr>),
    List(Vec<TypedExpr>),
    /// A struct value of a definition, tagged with its struct index
    Build {
        struct_index: usize,
        fields: Vec<TypedExpr>,
    },
    /// Constant field access on a tuple or built struct. `header` is the
    /// byte size of the tag preceding the fields.
    Field {
        base: Box<TypedExpr>,
        index: usize,
        fields: Vec<Type>,
        header: u32,
    },
    /// Element access on an array
    Index {
        base: Box<TypedExpr>,
        index: Box<TypedExpr>,
        width: u32,
    },
}

#[derive(Debug, Clone)]
pub struct TypedExpr {
    pub kind: TypedExprKind,
    pub ty: Type,
    pub position: Position,
}

impl TypedExpr {
    pub fn new(kind: TypedExprKind, ty: Type, position: Position) -> Self {
        TypedExpr { kind, ty, position }
    }

    pub fn void(position: Position) -> Self {
        TypedExpr::new(TypedExprKind::Void, Type::void(), position)
    }

    /// Short name of the expression kind, used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match &self.kind {
            TypedExprKind::Void => "void",
            TypedExprKind::Literal(_) => "literal",
            TypedExprKind::Param(_) => "parameter",
            TypedExprKind::Local(_) => "local",
            TypedExprKind::Assign { .. } => "assignment",
            TypedExprKind::If { .. } => "if",
            TypedExprKind::Group(_) => "group",
            TypedExprKind::Call { .. } => "call",
            TypedExprKind::InstancedCall { .. } => "instanced call",
            TypedExprKind::Tuple(_) => "tuple",
            TypedExprKind::List(_) => "list",
            TypedExprKind::Build { .. } => "build",
            TypedExprKind::Field { .. } => "field access",
            TypedExprKind::Index { .. } => "index access",
        }
    }

    /// Byte offset of field `index` in a packed field list.
    pub fn field_offset(fields: &[Type], index: usize) -> u32 {
        fields[..index].iter().map(|field| field.width()).sum()
    }
}
