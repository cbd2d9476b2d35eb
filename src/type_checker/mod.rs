//! Expression and function generator.
//!
//! This module turns function bodies into the typed intermediate
//! representation. For every function it:
//!
//! - Resolves names to local slots, parameters and receiver fields
//! - Resolves calls to overloads or struct-dispatched instance groups
//! - Allocates local slots per scope, reusing retired ones
//! - Checks branch, list and declared output types
//!
//! Callees are generated on demand so output types can be inferred in any
//! declaration order.

pub mod slots;
pub mod type_checker;
pub mod typed_ast;
