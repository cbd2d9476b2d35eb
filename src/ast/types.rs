use std::fmt::Display;

use crate::Position;

/// Array adornment written after a type: `[]` or `[n]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArraySize {
    Auto,
    Fixed(u32),
}

/// A type as written in source, before resolution against a scope.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// A dotted route such as `i32`, `Point` or `geometry.Point`
    Symbol {
        route: Vec<String>,
        position: Position,
    },
    Tuple {
        fields: Vec<TypeExpr>,
        position: Position,
    },
    Array {
        underlying: Box<TypeExpr>,
        size: ArraySize,
        position: Position,
    },
    Extern {
        name: String,
        position: Position,
    },
    Function {
        parameters: Vec<TypeExpr>,
        output: Option<Box<TypeExpr>>,
        position: Position,
    },
}

impl TypeExpr {
    pub fn get_position(&self) -> &Position {
        match self {
            TypeExpr::Symbol { position, .. }
            | TypeExpr::Tuple { position, .. }
            | TypeExpr::Array { position, .. }
            | TypeExpr::Extern { position, .. }
            | TypeExpr::Function { position, .. } => position,
        }
    }
}

impl Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeExpr::Symbol { route, .. } => write!(f, "{}", route.join(".")),
            TypeExpr::Tuple { fields, .. } => {
                let fields: Vec<String> = fields.iter().map(|field| field.to_string()).collect();
                write!(f, "({})", fields.join(", "))
            }
            TypeExpr::Array {
                underlying, size, ..
            } => match size {
                ArraySize::Auto => write!(f, "{}[]", underlying),
                ArraySize::Fixed(size) => write!(f, "{}[{}]", underlying, size),
            },
            TypeExpr::Extern { name, .. } => write!(f, "extern {}", name),
            TypeExpr::Function {
                parameters, output, ..
            } => {
                let parameters: Vec<String> =
                    parameters.iter().map(|param| param.to_string()).collect();
                match output {
                    Some(output) => write!(f, "fn({}) -> {}", parameters.join(", "), output),
                    None => write!(f, "fn({})", parameters.join(", ")),
                }
            }
        }
    }
}
