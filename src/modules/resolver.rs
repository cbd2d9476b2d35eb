use std::{
    collections::{HashMap, HashSet},
    rc::Rc,
};

use indexmap::IndexMap;
use log::{debug, trace};

use crate::{
    ast::{ast::SourceModule, statements::ImportMode},
    errors::errors::{Error, ErrorImpl},
    model::{
        definition::Definition,
        func::{Completion, Func, FuncArena, FuncHeader, FuncId, StructPrefix},
        module::{Module, ModuleId, Route, Symbol, SymbolTable},
        scope::Scope,
        types::{DefId, Type},
    },
    options::CompileOptions,
    type_checker::type_checker::{generate_function, GenContext},
    Position,
};

use super::{kernel::kernel_definitions, provider::ModuleProvider};

/// Everything the emitter needs once resolution is over.
#[derive(Debug)]
pub struct Program {
    pub definitions: Vec<Definition>,
    pub funcs: Vec<Func>,
    pub modules: Vec<Module>,
}

impl Program {
    pub fn func(&self, id: FuncId) -> &Func {
        &self.funcs[id.0]
    }

    pub fn definition(&self, id: DefId) -> &Definition {
        &self.definitions[id.0]
    }
}

/// One compilation: the definition and function arenas, every module built
/// so far and the import bookkeeping.
pub struct Session {
    options: CompileOptions,
    definitions: Vec<Definition>,
    funcs: FuncArena,
    modules: Vec<Module>,
    cache: HashMap<Route, ModuleId>,
    in_progress: HashSet<Route>,
    kernel: Option<ModuleId>,
}

fn is_operator(name: &str) -> bool {
    !name
        .chars()
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
}

fn void_input(position: &Position) -> Error {
    Error::new(
        ErrorImpl::TypeMatchError {
            expected: String::from("a parameter type"),
            received: String::from("void"),
        },
        position.clone(),
    )
}

impl Session {
    pub fn new(options: CompileOptions) -> Self {
        Session {
            options,
            definitions: vec![],
            funcs: FuncArena::new(),
            modules: vec![],
            cache: HashMap::new(),
            in_progress: HashSet::new(),
            kernel: None,
        }
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn definition(&self, id: DefId) -> &Definition {
        &self.definitions[id.0]
    }

    pub fn funcs(&self) -> &FuncArena {
        &self.funcs
    }

    /// Builds the kernel module once per session.
    fn kernel(&mut self) -> Result<ModuleId, Error> {
        if let Some(kernel) = self.kernel {
            return Ok(kernel);
        }

        let position = Position(0, Rc::new(Route::Kernel.to_string()));
        let mut definitions = IndexMap::new();

        for kernel_def in kernel_definitions(&self.options.import_module) {
            let id = DefId(self.definitions.len());
            let mut definition =
                Definition::new(id, kernel_def.name, Route::Kernel, position.clone());

            for function in kernel_def.functions {
                let func = self.funcs.insert_ready(
                    FuncHeader {
                        name: function.name.clone(),
                        owner: id,
                        inputs: function.inputs.clone(),
                        param_names: vec![],
                        prefix: None,
                        declared_output: Some(function.output.clone()),
                        position: position.clone(),
                    },
                    Completion {
                        output: function.output,
                        locals: vec![],
                        body: function.body,
                        dependencies: vec![],
                    },
                );

                definition.add_function(&function.name, function.inputs, func, &position)?;
            }

            definitions.insert(kernel_def.name.to_string(), id);
            self.definitions.push(definition);
        }

        let id = ModuleId(self.modules.len());
        let exports = definitions.values().copied().collect();
        self.modules.push(Module {
            route: Route::Kernel,
            definitions,
            exports,
            symbols: SymbolTable::new(),
        });
        self.cache.insert(Route::Kernel, id);
        self.kernel = Some(id);

        debug!("kernel module installed as {:?}", id);
        Ok(id)
    }

    /// Resolves an imported route, building the module if it was not built
    /// before in this session.
    fn load_module(
        &mut self,
        route: Route,
        provider: &dyn ModuleProvider,
        position: &Position,
    ) -> Result<ModuleId, Error> {
        if let Some(id) = self.cache.get(&route) {
            return Ok(*id);
        }
        if self.in_progress.contains(&route) {
            return Err(Error::new(
                ErrorImpl::CircularDependency {
                    route: route.to_string(),
                },
                position.clone(),
            ));
        }

        let tree = provider.module(&route, position)?;
        self.resolve_module(route, &tree, provider)
    }

    /// Builds the module at `route` from its syntax tree.
    ///
    /// # Arguments
    ///
    /// * `route` - Canonical route of the module
    /// * `tree` - Raw syntax tree of the module
    /// * `provider` - Resolves and loads the module's imports
    ///
    /// # Returns
    ///
    /// The id of the built module. A route already built in this session is
    /// returned from the cache, a route currently being built is a circular
    /// dependency.
    pub fn resolve_module(
        &mut self,
        route: Route,
        tree: &SourceModule,
        provider: &dyn ModuleProvider,
    ) -> Result<ModuleId, Error> {
        if let Some(id) = self.cache.get(&route) {
            return Ok(*id);
        }
        if self.in_progress.contains(&route) {
            return Err(Error::new(
                ErrorImpl::CircularDependency {
                    route: route.to_string(),
                },
                tree.span.start.clone(),
            ));
        }

        debug!("resolving module {}", route);

        self.in_progress.insert(route.clone());
        let built = self.build_module(&route, tree, provider);
        self.in_progress.remove(&route);

        let id = built?;
        self.cache.insert(route, id);
        Ok(id)
    }

    fn build_module(
        &mut self,
        route: &Route,
        tree: &SourceModule,
        provider: &dyn ModuleProvider,
    ) -> Result<ModuleId, Error> {
        let mut symbols = SymbolTable::new();
        let mut exports: Vec<DefId> = vec![];

        if self.options.kernel {
            let kernel = self.kernel()?;
            for (name, id) in &self.modules[kernel.0].definitions {
                symbols.insert(name, Symbol::Definition(*id));
            }
            symbols.insert("kernel", Symbol::Module(kernel));
        }

        for import in tree.imports() {
            let position = &import.span.start;
            let imported_route = provider.route(route, &import.descriptor, position)?;
            let imported = self.load_module(imported_route, provider, position)?;
            let module = &self.modules[imported.0];

            match &import.mode {
                ImportMode::Named(alias) => {
                    trace!("binding {} as `{}`", module.route, alias);
                    symbols.insert(alias, Symbol::Module(imported));
                }
                ImportMode::Flatten | ImportMode::ExportMerge => {
                    trace!("merging {} into {}", module.route, route);
                    for (name, id) in &module.definitions {
                        symbols.insert(name, Symbol::Definition(*id));
                    }
                    for id in &module.exports {
                        symbols.insert(&self.definitions[id.0].name, Symbol::Definition(*id));
                    }

                    if import.mode == ImportMode::ExportMerge {
                        for id in &module.exports {
                            if !exports.contains(id) {
                                exports.push(*id);
                            }
                        }
                    }
                }
            }
        }

        let mut local: IndexMap<String, DefId> = IndexMap::new();
        for def in tree.definitions() {
            if local.contains_key(&def.name) {
                return Err(Error::new(
                    ErrorImpl::RepeatedDefinition {
                        definition: def.name.clone(),
                    },
                    def.span.start.clone(),
                ));
            }

            let id = DefId(self.definitions.len());
            self.definitions.push(Definition::new(
                id,
                &def.name,
                route.clone(),
                def.span.start.clone(),
            ));
            local.insert(def.name.clone(), id);
            symbols.insert(&def.name, Symbol::Definition(id));
        }

        for (def, id) in tree.definitions().zip(local.values().copied()) {
            for declaration in &def.structs {
                let fields = {
                    let scope = Scope::new(&symbols, &self.modules, &self.definitions);
                    let mut fields = Vec::with_capacity(declaration.fields.len());
                    for field in &declaration.fields {
                        let field_type = scope.resolve_type(field)?;
                        if field_type.is_void() {
                            return Err(void_input(field.get_position()));
                        }
                        fields.push(field_type);
                    }
                    fields
                };

                let index =
                    self.definitions[id.0].add_struct(fields, &declaration.span.start)?;
                trace!("{}: struct {}", def.name, index);
            }
        }

        let mut declared: Vec<FuncId> = vec![];
        for (def, id) in tree.definitions().zip(local.values().copied()) {
            for function in &def.functions {
                let position = function.span.start.clone();

                let header = {
                    let scope = Scope::new(&symbols, &self.modules, &self.definitions);
                    let definition = scope.definition(id);

                    let mut inputs = Vec::with_capacity(function.parameters.len());
                    for parameter in &function.parameters {
                        let input = scope.resolve_type(&parameter.param_type)?;
                        if input.is_void() {
                            return Err(void_input(parameter.param_type.get_position()));
                        }
                        inputs.push(input);
                    }

                    let declared_output = match &function.output {
                        Some(output) => Some(scope.resolve_type(output)?),
                        None => None,
                    };

                    let prefix = match &function.prefix {
                        Some(fields) => {
                            let mut heuristic = Vec::with_capacity(fields.len());
                            for field in fields {
                                heuristic.push(match &field.field_type {
                                    Some(field_type) => Some(scope.resolve_type(field_type)?),
                                    None => None,
                                });
                            }

                            let index = definition.infer_struct(&heuristic, &position)?;
                            Some(StructPrefix {
                                receiver: definition.as_type(),
                                index,
                                fields: definition.structs[index].fields.clone(),
                                names: fields.iter().map(|field| field.name.clone()).collect(),
                            })
                        }
                        None => None,
                    };

                    FuncHeader {
                        name: function.name.clone(),
                        owner: id,
                        inputs,
                        param_names: function
                            .parameters
                            .iter()
                            .map(|parameter| parameter.name.clone())
                            .collect(),
                        prefix,
                        declared_output,
                        position: position.clone(),
                    }
                };

                let inputs = header.inputs.clone();
                let struct_index = header.prefix.as_ref().map(|prefix| prefix.index);
                let func = self.funcs.declare(header, function.clone());
                let definition = &mut self.definitions[id.0];

                match struct_index {
                    Some(struct_index) => {
                        definition.add_instance(
                            &function.name,
                            inputs,
                            struct_index,
                            func,
                            &position,
                        )?;
                    }
                    None => {
                        definition.add_function(&function.name, inputs, func, &position)?;
                    }
                }

                declared.push(func);
            }
        }

        for export in tree.exports() {
            for (name, span) in &export.names {
                match symbols.get(name) {
                    Some(Symbol::Definition(id)) => {
                        if !exports.contains(&id) {
                            exports.push(id);
                        }
                    }
                    _ => {
                        return Err(Error::new(
                            ErrorImpl::SymbolNotFound {
                                symbol: name.clone(),
                            },
                            span.start.clone(),
                        ))
                    }
                }
            }
        }

        {
            let mut ctx = GenContext {
                funcs: &mut self.funcs,
                scope: Scope::new(&symbols, &self.modules, &self.definitions),
            };
            for func in &declared {
                generate_function(&mut ctx, *func)?;
            }
        }

        for id in local.values() {
            self.verify_instances(*id)?;
        }

        let id = ModuleId(self.modules.len());
        debug!(
            "module {} resolved: {} definitions, {} functions, {} exports",
            route,
            local.len(),
            declared.len(),
            exports.len()
        );

        self.modules.push(Module {
            route: route.clone(),
            definitions: local,
            exports,
            symbols,
        });

        Ok(id)
    }

    /// Every instance group of `id` must be covered by all structs and agree
    /// on one output type.
    fn verify_instances(&self, id: DefId) -> Result<(), Error> {
        let definition = &self.definitions[id.0];

        for (index, group) in definition.instances.iter().enumerate() {
            let members = definition.covered_members(index)?;

            let mut expected: Option<Type> = None;
            for member in members {
                let output = self.funcs.output(member).ok_or_else(|| {
                    Error::new(
                        ErrorImpl::FunctionNotRegistered {
                            function: group.name.clone(),
                        },
                        group.position.clone(),
                    )
                })?;

                match &expected {
                    None => expected = Some(output),
                    Some(expected) if !expected.is_equals(&output) => {
                        return Err(Error::new(
                            ErrorImpl::InstanceOutputMismatch {
                                function: group.name.clone(),
                                expected: expected.to_string(),
                                received: output.to_string(),
                            },
                            self.funcs.header(member).position.clone(),
                        ))
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(())
    }

    /// Export names of a built module.
    ///
    /// Free functions of the entry definition are exported as
    /// `<fn><overload>`, those of every other exported definition as
    /// `<Def>_<fn><overload>`. Operator functions are not exported.
    pub fn export_roots(&self, module: ModuleId) -> Result<Vec<(String, FuncId)>, Error> {
        let module = &self.modules[module.0];

        let entry = match &self.options.entry {
            Some(entry) => Some(module.definition(entry).ok_or_else(|| {
                Error::new(
                    ErrorImpl::SymbolNotFound {
                        symbol: entry.clone(),
                    },
                    Position(0, Rc::new(module.route.to_string())),
                )
            })?),
            None => module.definitions.values().next().copied(),
        };

        let mut roots = vec![];
        let mut push_definition = |id: DefId, prefix: Option<&str>| {
            for (name, overloads) in &self.definitions[id.0].functions {
                if is_operator(name) {
                    continue;
                }

                for (index, overload) in overloads.iter().enumerate() {
                    let export = match prefix {
                        Some(prefix) => format!("{}_{}{}", prefix, name, index),
                        None => format!("{}{}", name, index),
                    };
                    roots.push((export, overload.func));
                }
            }
        };

        if let Some(entry) = entry {
            push_definition(entry, None);
        }
        for id in &module.exports {
            if Some(*id) != entry {
                push_definition(*id, Some(self.definitions[id.0].name.as_str()));
            }
        }

        debug!("{} export roots", roots.len());
        Ok(roots)
    }

    /// Ends the session. Fails if a function was declared but never
    /// generated.
    pub fn into_program(self) -> Result<Program, Error> {
        Ok(Program {
            definitions: self.definitions,
            funcs: self.funcs.seal()?,
            modules: self.modules,
        })
    }
}
