//! Module dependency resolution.
//!
//! This module builds modules from their syntax trees. It handles:
//!
//! - Loading imports through a `ModuleProvider` (files or memory)
//! - Caching built modules per route and detecting import cycles
//! - Assembling the global symbol table, kernel included
//! - Declaring definitions, structs and functions, then generating bodies
//! - Naming the exported functions of the root module

pub mod kernel;
pub mod provider;
pub mod resolver;
