use indexmap::IndexMap;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::{
    func::FuncId,
    module::Route,
    types::{DefId, Type},
};

/// An anonymous, ordered field tuple owned by a definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    pub fields: Vec<Type>,
}

/// One free-function overload.
#[derive(Debug, Clone)]
pub struct Overload {
    pub inputs: Vec<Type>,
    pub func: FuncId,
}

/// Instance functions sharing a name and input signature, one member per
/// struct of the owning definition.
#[derive(Debug, Clone)]
pub struct InstanceGroup {
    pub name: String,
    pub inputs: Vec<Type>,
    pub members: Vec<Option<FuncId>>,
    pub position: Position,
}

/// Handle of an instance group: the owning definition and its index in
/// that definition's group list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupRef {
    pub def: DefId,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct Definition {
    pub id: DefId,
    pub name: String,
    pub route: Route,
    pub structs: Vec<Struct>,
    pub functions: IndexMap<String, Vec<Overload>>,
    pub instances: Vec<InstanceGroup>,
    pub position: Position,
}

impl Definition {
    pub fn new(id: DefId, name: &str, route: Route, position: Position) -> Self {
        Definition {
            id,
            name: name.to_string(),
            route,
            structs: vec![],
            functions: IndexMap::new(),
            instances: vec![],
            position,
        }
    }

    pub fn as_type(&self) -> Type {
        Type::def(self.id, &self.name)
    }

    /// Registers a struct and returns its index.
    ///
    /// Two structs of one definition may not share a field-type sequence,
    /// since the struct index is the only thing dispatch can tell them
    /// apart by.
    pub fn add_struct(&mut self, fields: Vec<Type>, position: &Position) -> Result<usize, Error> {
        if self.structs.iter().any(|existing| existing.fields == fields) {
            return Err(Error::new(
                ErrorImpl::RepeatedStruct {
                    definition: self.name.clone(),
                },
                position.clone(),
            ));
        }

        self.structs.push(Struct { fields });
        Ok(self.structs.len() - 1)
    }

    /// Picks the struct an instance function's prefix describes.
    ///
    /// # Arguments
    ///
    /// * `heuristic` - One entry per prefix field, `None` where the type was
    ///   left out with `?`
    /// * `position` - Position of the function, for errors
    ///
    /// # Returns
    ///
    /// The index of the single struct whose field count matches and whose
    /// known field types agree positionally.
    pub fn infer_struct(
        &self,
        heuristic: &[Option<Type>],
        position: &Position,
    ) -> Result<usize, Error> {
        let candidates: Vec<usize> = self
            .structs
            .iter()
            .enumerate()
            .filter(|(_, candidate)| {
                candidate.fields.len() == heuristic.len()
                    && candidate
                        .fields
                        .iter()
                        .zip(heuristic)
                        .all(|(field, known)| known.as_ref().is_none_or(|ty| ty.is_equals(field)))
            })
            .map(|(index, _)| index)
            .collect();

        match candidates.len() {
            0 => Err(Error::new(
                ErrorImpl::StructMismatch {
                    definition: self.name.clone(),
                },
                position.clone(),
            )),
            1 => Ok(candidates[0]),
            count => Err(Error::new(
                ErrorImpl::StructAmbiguity {
                    definition: self.name.clone(),
                    candidates: count,
                },
                position.clone(),
            )),
        }
    }

    /// Adds a free-function overload and returns its overload index.
    pub fn add_function(
        &mut self,
        name: &str,
        inputs: Vec<Type>,
        func: FuncId,
        position: &Position,
    ) -> Result<usize, Error> {
        let overloads = self.functions.entry(name.to_string()).or_default();

        if overloads.iter().any(|overload| overload.inputs == inputs) {
            return Err(Error::new(
                ErrorImpl::RepeatedOverload {
                    function: name.to_string(),
                },
                position.clone(),
            ));
        }

        overloads.push(Overload { inputs, func });
        Ok(overloads.len() - 1)
    }

    /// Adds the implementation of an instance function for one struct,
    /// creating the group for `(name, inputs)` on first use.
    pub fn add_instance(
        &mut self,
        name: &str,
        inputs: Vec<Type>,
        struct_index: usize,
        func: FuncId,
        position: &Position,
    ) -> Result<GroupRef, Error> {
        let struct_count = self.structs.len();

        let index = match self
            .instances
            .iter()
            .position(|group| group.name == name && group.inputs == inputs)
        {
            Some(index) => index,
            None => {
                self.instances.push(InstanceGroup {
                    name: name.to_string(),
                    inputs,
                    members: vec![None; struct_count],
                    position: position.clone(),
                });
                self.instances.len() - 1
            }
        };

        let member = &mut self.instances[index].members[struct_index];
        if member.is_some() {
            return Err(Error::new(
                ErrorImpl::RepeatedSignature {
                    function: name.to_string(),
                    struct_index,
                },
                position.clone(),
            ));
        }
        *member = Some(func);

        Ok(GroupRef {
            def: self.id,
            index,
        })
    }

    /// Groups named `name` taking exactly `inputs.len()` inputs.
    pub fn instance_groups<'a>(
        &'a self,
        name: &'a str,
        arity: usize,
    ) -> impl Iterator<Item = (GroupRef, &'a InstanceGroup)> + 'a {
        self.instances
            .iter()
            .enumerate()
            .filter(move |(_, group)| group.name == name && group.inputs.len() == arity)
            .map(|(index, group)| {
                (
                    GroupRef {
                        def: self.id,
                        index,
                    },
                    group,
                )
            })
    }

    /// The members of a group, failing if any struct has no implementation.
    pub fn covered_members(&self, index: usize) -> Result<Vec<FuncId>, Error> {
        let group = &self.instances[index];

        group
            .members
            .iter()
            .enumerate()
            .map(|(struct_index, member)| {
                member.ok_or_else(|| {
                    Error::new(
                        ErrorImpl::SignatureNotCovered {
                            function: group.name.clone(),
                            struct_index,
                        },
                        group.position.clone(),
                    )
                })
            })
            .collect()
    }
}
