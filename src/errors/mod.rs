//! Error types and error handling for the compiler.
//!
//! This module defines the error types used throughout the compilation
//! process. It includes:
//!
//! - Error structures with line-tagged source positions
//! - Specific error variants for each compilation phase
//! - Error categories (syntax, type, resolution, dependency, emission)
//! - Helpful error messages and suggestions

pub mod errors;

#[cfg(test)]
mod tests;
