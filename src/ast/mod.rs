/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the raw syntax tree
///
/// Submodules:
/// - ast: The source module and its top-level items
/// - expressions: Definitions for the expression kinds
/// - statements: Imports, exports, definitions and their members
/// - types: Type expressions as written in source
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
