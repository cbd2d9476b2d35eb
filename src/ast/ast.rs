use crate::Span;

use super::statements::{DefStmt, ExportStmt, ImportStmt};

/// Top-level item kinds
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum ItemType {
    Import,
    Export,
    Def,
}

/// A top-level item of a source module.
#[derive(Debug, Clone)]
pub enum Item {
    Import(ImportStmt),
    Export(ExportStmt),
    Def(DefStmt),
}

impl Item {
    /// Returns the kind of the item.
    pub fn get_item_type(&self) -> ItemType {
        match self {
            Item::Import(_) => ItemType::Import,
            Item::Export(_) => ItemType::Export,
            Item::Def(_) => ItemType::Def,
        }
    }

    /// Returns the span of the item.
    pub fn get_span(&self) -> &Span {
        match self {
            Item::Import(import) => &import.span,
            Item::Export(export) => &export.span,
            Item::Def(def) => &def.span,
        }
    }
}

/// The raw syntax tree of one source file.
#[derive(Debug, Clone)]
pub struct SourceModule {
    pub items: Vec<Item>,
    pub span: Span,
}

impl SourceModule {
    pub fn imports(&self) -> impl Iterator<Item = &ImportStmt> {
        self.items.iter().filter_map(|item| match item {
            Item::Import(import) => Some(import),
            _ => None,
        })
    }

    pub fn exports(&self) -> impl Iterator<Item = &ExportStmt> {
        self.items.iter().filter_map(|item| match item {
            Item::Export(export) => Some(export),
            _ => None,
        })
    }

    pub fn definitions(&self) -> impl Iterator<Item = &DefStmt> {
        self.items.iter().filter_map(|item| match item {
            Item::Def(def) => Some(def),
            _ => None,
        })
    }
}
