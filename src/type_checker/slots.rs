use log::trace;

use crate::model::types::Type;

/// Snapshot of the live slot names, taken when a scope opens.
#[derive(Debug, Clone)]
pub struct ScopeSnapshot(Vec<Option<String>>);

/// Local slots of one function body.
///
/// `types` only ever grows and becomes the function's local list. `names`
/// maps each slot to the variable currently living in it, `None` for a
/// retired slot that a later variable of the same type may reuse.
#[derive(Debug, Default)]
pub struct SlotTable {
    names: Vec<Option<String>>,
    types: Vec<Type>,
}

impl SlotTable {
    pub fn new() -> Self {
        SlotTable::default()
    }

    /// Innermost live slot bound to `name`.
    pub fn lookup(&self, name: &str) -> Option<(u32, &Type)> {
        self.names
            .iter()
            .rposition(|slot| slot.as_deref() == Some(name))
            .map(|index| (index as u32, &self.types[index]))
    }

    pub fn allocate(&mut self, name: &str, ty: &Type) -> u32 {
        let retired = self
            .names
            .iter()
            .zip(&self.types)
            .position(|(slot, slot_type)| slot.is_none() && slot_type == ty);

        match retired {
            Some(index) => {
                trace!("reusing slot {} ({}) for `{}`", index, ty, name);
                self.names[index] = Some(name.to_string());
                index as u32
            }
            None => {
                self.names.push(Some(name.to_string()));
                self.types.push(ty.clone());
                (self.types.len() - 1) as u32
            }
        }
    }

    pub fn open_scope(&self) -> ScopeSnapshot {
        ScopeSnapshot(self.names.clone())
    }

    /// Restores the names of `snapshot`. Slots created inside the scope
    /// stay allocated but become anonymous.
    pub fn close_scope(&mut self, snapshot: ScopeSnapshot) {
        let mut names = snapshot.0;
        names.resize(self.types.len(), None);
        self.names = names;
    }

    pub fn into_types(self) -> Vec<Type> {
        self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
