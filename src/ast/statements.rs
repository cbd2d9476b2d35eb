use crate::Span;

use super::{expressions::Expr, types::TypeExpr};

/// How an imported module is merged into the importer's scope.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportMode {
    /// `import name from "route";` binds the whole module to one alias
    Named(String),
    /// `import * from "route";` merges every definition directly
    Flatten,
    /// `export * from "route";` flattens and re-exports the module's exports
    ExportMerge,
}

#[derive(Debug, Clone)]
pub struct ImportStmt {
    pub mode: ImportMode,
    pub descriptor: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ExportStmt {
    pub names: Vec<(String, Span)>,
    pub span: Span,
}

/// `def Name ... end`
#[derive(Debug, Clone)]
pub struct DefStmt {
    pub name: String,
    pub structs: Vec<StructDeclStmt>,
    pub functions: Vec<FnDeclStmt>,
    pub span: Span,
}

/// `struct i32, string;` declares one anonymous field tuple.
#[derive(Debug, Clone)]
pub struct StructDeclStmt {
    pub fields: Vec<TypeExpr>,
    pub span: Span,
}

/// One entry of an instance function's struct prefix, e.g. `i32 x` or `? y`.
#[derive(Debug, Clone)]
pub struct PrefixField {
    pub field_type: Option<TypeExpr>,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub param_type: TypeExpr,
}

#[derive(Debug, Clone)]
pub struct FnDeclStmt {
    pub name: String,
    pub prefix: Option<Vec<PrefixField>>,
    pub parameters: Vec<Parameter>,
    pub output: Option<TypeExpr>,
    pub body: Expr,
    pub span: Span,
}

impl FnDeclStmt {
    pub fn is_instance(&self) -> bool {
        self.prefix.is_some()
    }
}
