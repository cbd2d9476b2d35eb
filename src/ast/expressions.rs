use crate::Span;

/// Literal values as written in source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Bool(bool),
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// `.`, the expression without a value
    Void,
    Literal(Literal),
    Symbol(String),
    /// `object.property`
    Member {
        object: Box<Expr>,
        property: String,
    },
    /// `object[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Binary {
        operator: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Prefix {
        operator: String,
        operand: Box<Expr>,
    },
    Assignment {
        assignee: String,
        value: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Option<Box<Expr>>,
    },
    /// `(a; b; c)`
    Group(Vec<Expr>),
    /// `(a, b)`
    Tuple(Vec<Expr>),
    /// `[a, b]`
    List(Vec<Expr>),
    /// `new Name { field: value }`
    StructInit {
        name: String,
        fields: Vec<(String, Expr)>,
    },
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    pub fn get_span(&self) -> &Span {
        &self.span
    }

    /// Flattens `a.b.c` into `["a", "b", "c"]` when the expression is a plain
    /// dotted route.
    pub fn as_route(&self) -> Option<Vec<String>> {
        match &self.kind {
            ExprKind::Symbol(name) => Some(vec![name.clone()]),
            ExprKind::Member { object, property } => {
                let mut route = object.as_route()?;
                route.push(property.clone());
                Some(route)
            }
            _ => None,
        }
    }

    /// Short name of the expression kind, used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match &self.kind {
            ExprKind::Void => "void",
            ExprKind::Literal(_) => "literal",
            ExprKind::Symbol(_) => "symbol",
            ExprKind::Member { .. } => "attribute access",
            ExprKind::Index { .. } => "indexing",
            ExprKind::Call { .. } => "call",
            ExprKind::Binary { .. } => "binary operation",
            ExprKind::Prefix { .. } => "prefix operation",
            ExprKind::Assignment { .. } => "assignment",
            ExprKind::If { .. } => "if",
            ExprKind::Group(_) => "group",
            ExprKind::Tuple(_) => "tuple",
            ExprKind::List(_) => "list",
            ExprKind::StructInit { .. } => "struct literal",
        }
    }
}
