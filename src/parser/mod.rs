//! Parser module for building the raw syntax tree.
//!
//! This module contains the parser that transforms a stream of tokens
//! into a `SourceModule`. It uses a Pratt parser for expressions
//! with proper operator precedence and handles:
//!
//! - Top-level items (imports, exports, definitions)
//! - Definition members (structs, free and instance functions)
//! - Expression parsing (operators, calls, groups, tuples, lists, if)
//! - Type parsing for type annotations
//!
//! The parser uses NUD (null denotation) and LED (left denotation) functions
//! for expression parsing with binding power for precedence handling.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;
