use std::{fmt::Display, path::PathBuf};

use indexmap::IndexMap;

use super::types::DefId;

/// Canonical identifier of a module's origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    File(PathBuf),
    Kernel,
    Virtual(String),
}

impl Route {
    pub fn is_file(&self) -> bool {
        matches!(self, Route::File(_))
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::File(path) => write!(f, "{}", path.display()),
            Route::Kernel => write!(f, "<kernel>"),
            Route::Virtual(name) => write!(f, "{}", name),
        }
    }
}

/// Handle of a module in the session's module arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Definition(DefId),
    Module(ModuleId),
}

/// The global symbols visible to one module, in merge order.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Binds `name`, replacing any earlier binding. The replaced entry
    /// moves to the end so iteration order reflects the latest write.
    pub fn insert(&mut self, name: &str, symbol: Symbol) {
        self.symbols.shift_remove(name);
        self.symbols.insert(name.to_string(), symbol);
    }

    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).copied()
    }

    /// Every definition in scope, newest binding first.
    pub fn definitions(&self) -> impl Iterator<Item = DefId> + '_ {
        self.symbols.values().rev().filter_map(|symbol| match symbol {
            Symbol::Definition(id) => Some(*id),
            Symbol::Module(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// A resolved module: its own definitions, its export list and the
/// symbol table its functions were resolved against.
#[derive(Debug, Clone)]
pub struct Module {
    pub route: Route,
    pub definitions: IndexMap<String, DefId>,
    pub exports: Vec<DefId>,
    pub symbols: SymbolTable,
}

impl Module {
    pub fn definition(&self, name: &str) -> Option<DefId> {
        self.definitions.get(name).copied()
    }
}
