//! Binary code emission.
//!
//! This module turns a resolved program into a binary module. It handles:
//!
//! - Walking the call graph from the exported roots
//! - Inlining builtin kernel functions through the injector
//! - Laying out call tables for duck-typed dispatch
//! - Lowering typed expressions to stack instructions
//! - Assembling the sections of the binary

pub mod compiler;
pub mod expr;
pub mod injector;
pub mod layout;

#[cfg(test)]
mod tests;
