//! Type and definition model.
//!
//! Structural types, definitions with their structs and overload
//! catalogues, the two-phase function arena, modules with their symbol
//! tables, and type resolution against a module scope.

pub mod definition;
pub mod func;
pub mod module;
pub mod scope;
pub mod types;

#[cfg(test)]
mod tests;
