//! Main emitter module.
//!
//! This module contains the Emitter structure and drives emission from a
//! resolved program to a binary module. It walks the call graph from the
//! exported roots, assigns function and table indices, then assembles the
//! sections.

use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
};

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};
use wasm_encoder::{
    CodeSection, ConstExpr, ElementSection, Elements, EntityType, ExportKind, ExportSection,
    FunctionSection, ImportSection, MemoryType, Module, RefType, TableSection, TableType,
    TypeSection,
};

use crate::{
    errors::errors::{Error, ErrorImpl},
    model::{
        definition::GroupRef,
        func::{Dependency, Func, FuncBody, FuncId},
        types::{Native, Type},
    },
    modules::resolver::Program,
    options::CompileOptions,
};

use super::{
    expr::gen_function,
    injector::inject,
    layout::Signature,
};

/// A contiguous region of the call table holding the members of one
/// instance group, ordered by struct index.
#[derive(Debug, Clone)]
pub struct TableRegion {
    pub base: u32,
    pub type_index: u32,
    pub members: Vec<FuncId>,
}

/// How a call to a function is emitted.
#[derive(Debug, Clone, Copy)]
pub enum CallTarget {
    Inline(&'static [wasm_encoder::Instruction<'static>]),
    Index(u32),
}

/// The state of an emission.
///
/// Function indices are only final once the call graph has been walked:
/// imported functions come first in the index space, followed by the
/// emitted bodies in discovery order.
pub struct Emitter<'p> {
    pub program: &'p Program,
    pub options: &'p CompileOptions,

    /// Deduplicated function types, in type section order
    signatures: IndexSet<Signature>,
    /// Host function imports and their type indices
    imports: IndexMap<(String, String), u32>,
    /// Emitted bodies in discovery order
    bodies: Vec<FuncId>,
    /// Index into `imports` or `bodies` of every reached function
    slots: HashMap<FuncId, Slot>,
    tables: IndexMap<GroupRef, TableRegion>,
    table_size: u32,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Import(usize),
    Body(usize),
    Builtin,
}

impl<'p> Emitter<'p> {
    pub fn new(program: &'p Program, options: &'p CompileOptions) -> Self {
        let mut emitter = Emitter {
            program,
            options,
            signatures: IndexSet::new(),
            imports: IndexMap::new(),
            bodies: Vec::new(),
            slots: HashMap::new(),
            tables: IndexMap::new(),
            table_size: 0,
        };

        // The allocator backs every composite literal
        let i32_ = Type::native(Native::I32);
        let signature = emitter.signature(Signature::new(&[i32_.clone()], &i32_));
        emitter
            .imports
            .insert((options.import_module.clone(), String::from("alloc")), signature);

        emitter
    }

    fn signature(&mut self, signature: Signature) -> u32 {
        self.signatures.insert_full(signature).0 as u32
    }

    fn func_signature(&mut self, func: &Func) -> u32 {
        self.signature(Signature::new(&func.header.parameters(), &func.output))
    }

    pub fn alloc_index(&self) -> u32 {
        self.imports
            .get_index_of(&(self.options.import_module.clone(), String::from("alloc")))
            .unwrap_or(0) as u32
    }

    /// Walks the call graph from `roots`, registering every reachable
    /// function and instance group.
    fn collect(&mut self, roots: &[(String, FuncId)]) -> Result<(), Error> {
        let program = self.program;
        let mut stack: Vec<Dependency> = roots
            .iter()
            .rev()
            .map(|(_, id)| Dependency::Func(*id))
            .collect();
        let mut visited = HashSet::new();

        while let Some(dependency) = stack.pop() {
            if !visited.insert(dependency) {
                continue;
            }

            match dependency {
                Dependency::Func(id) => {
                    let func = program.func(id);
                    trace!("Reached function {} ({:?})", func.header.name, id);

                    match &func.body {
                        FuncBody::Builtin(name) => {
                            if inject(name).is_none() {
                                return Err(Error::new(
                                    ErrorImpl::UnknownBuiltin {
                                        builtin: name.clone(),
                                    },
                                    func.header.position.clone(),
                                ));
                            }
                            self.slots.insert(id, Slot::Builtin);
                        }
                        FuncBody::Import { module, name } => {
                            let signature = self.func_signature(func);
                            let (index, _) = self
                                .imports
                                .insert_full((module.clone(), name.clone()), signature);
                            self.slots.insert(id, Slot::Import(index));
                        }
                        FuncBody::Expr(_) => {
                            self.func_signature(func);
                            self.slots.insert(id, Slot::Body(self.bodies.len()));
                            self.bodies.push(id);
                            stack.extend(func.dependencies.iter().rev().copied());
                        }
                    }
                }
                Dependency::Group(group) => {
                    let definition = program.definition(group.def);
                    let members = definition.covered_members(group.index)?;

                    for member in &members {
                        let func = program.func(*member);
                        if !func.is_expr() {
                            return Err(Error::new(
                                ErrorImpl::NotPureTableEntry {
                                    function: func.header.name.clone(),
                                },
                                func.header.position.clone(),
                            ));
                        }
                    }

                    let first = program.func(members[0]);
                    let type_index = self.func_signature(first);

                    trace!(
                        "Table region for {}.{} at {} ({} members)",
                        definition.name,
                        first.header.name,
                        self.table_size,
                        members.len()
                    );

                    let region = TableRegion {
                        base: self.table_size,
                        type_index,
                        members: members.clone(),
                    };
                    self.table_size += members.len() as u32;
                    self.tables.insert(group, region);

                    stack.extend(members.into_iter().rev().map(Dependency::Func));
                }
            }
        }

        Ok(())
    }

    /// The call target of a reached function.
    pub fn call_target(&self, id: FuncId) -> Result<CallTarget, Error> {
        let func = self.program.func(id);
        let not_registered = || {
            Error::new(
                ErrorImpl::FunctionNotRegistered {
                    function: func.header.name.clone(),
                },
                func.header.position.clone(),
            )
        };

        match self.slots.get(&id).ok_or_else(not_registered)? {
            Slot::Builtin => match &func.body {
                FuncBody::Builtin(name) => inject(name).map(CallTarget::Inline).ok_or_else(|| {
                    Error::new(
                        ErrorImpl::UnknownBuiltin {
                            builtin: name.clone(),
                        },
                        func.header.position.clone(),
                    )
                }),
                _ => Err(not_registered()),
            },
            Slot::Import(index) => Ok(CallTarget::Index(*index as u32)),
            Slot::Body(index) => Ok(CallTarget::Index((self.imports.len() + index) as u32)),
        }
    }

    pub fn table_region(&self, group: &GroupRef) -> Option<&TableRegion> {
        self.tables.get(group)
    }

    /// Type index of a reached function.
    pub fn type_index(&self, func: &Func) -> u32 {
        let signature = Signature::new(&func.header.parameters(), &func.output);
        self.signatures.get_index_of(&signature).unwrap_or(0) as u32
    }

    fn function_index(&self, id: FuncId) -> Result<u32, Error> {
        match self.call_target(id)? {
            CallTarget::Index(index) => Ok(index),
            CallTarget::Inline(_) => {
                let func = self.program.func(id);
                Err(Error::new(
                    ErrorImpl::NotPureTableEntry {
                        function: func.header.name.clone(),
                    },
                    func.header.position.clone(),
                ))
            }
        }
    }

    /// Assembles the binary. Sections are written in the order the format
    /// requires.
    fn assemble(&self, roots: &[(String, FuncId)]) -> Result<Vec<u8>, Error> {
        let mut module = Module::new();

        let mut types = TypeSection::new();
        for signature in &self.signatures {
            types
                .ty()
                .function(signature.param_types(), signature.result_types());
        }
        module.section(&types);

        let mut imports = ImportSection::new();
        imports.import(
            &self.options.import_module,
            "memory",
            EntityType::Memory(MemoryType {
                minimum: self.options.memory_pages,
                maximum: self.options.max_memory_pages,
                memory64: false,
                shared: false,
                page_size_log2: None,
            }),
        );
        for ((module_name, name), type_index) in &self.imports {
            imports.import(module_name, name, EntityType::Function(*type_index));
        }
        module.section(&imports);

        let mut functions = FunctionSection::new();
        for id in &self.bodies {
            functions.function(self.type_index(self.program.func(*id)));
        }
        module.section(&functions);

        if self.table_size > 0 {
            let mut tables = TableSection::new();
            tables.table(TableType {
                element_type: RefType::FUNCREF,
                minimum: self.table_size as u64,
                maximum: Some(self.table_size as u64),
                table64: false,
                shared: false,
            });
            module.section(&tables);
        }

        let mut exports = ExportSection::new();
        for (name, id) in roots {
            let func = self.program.func(*id);
            if !func.is_expr() {
                return Err(Error::new(
                    ErrorImpl::NotPureExport {
                        function: func.header.name.clone(),
                    },
                    func.header.position.clone(),
                ));
            }
            exports.export(name, ExportKind::Func, self.function_index(*id)?);
        }
        module.section(&exports);

        if self.table_size > 0 {
            let mut indices = Vec::with_capacity(self.table_size as usize);
            for region in self.tables.values() {
                for member in &region.members {
                    indices.push(self.function_index(*member)?);
                }
            }

            let mut elements = ElementSection::new();
            elements.active(
                Some(0),
                &ConstExpr::i32_const(0),
                Elements::Functions(Cow::Borrowed(&indices)),
            );
            module.section(&elements);
        }

        let mut code = CodeSection::new();
        for id in &self.bodies {
            let function = gen_function(self, self.program.func(*id))?;
            code.function(&function);
        }
        module.section(&code);

        Ok(module.finish())
    }
}

/// Emits the binary module exporting `roots`.
///
/// # Arguments
///
/// * `program` - The sealed program
/// * `roots` - Exported names and the functions they export
/// * `options` - Memory and import settings
///
/// # Returns
///
/// The encoded module, or the first emission error.
pub fn emit(
    program: &Program,
    roots: &[(String, FuncId)],
    options: &CompileOptions,
) -> Result<Vec<u8>, Error> {
    let mut emitter = Emitter::new(program, options);
    emitter.collect(roots)?;

    debug!(
        "Emitting {} bodies, {} imports, {} table entries, {} types",
        emitter.bodies.len(),
        emitter.imports.len(),
        emitter.table_size,
        emitter.signatures.len()
    );

    emitter.assemble(roots)
}
