use std::{collections::HashMap, fs, path::Path, rc::Rc};

use crate::{
    ast::ast::SourceModule,
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
    model::module::Route,
    parser::parser::parse,
    Position,
};

fn not_found(descriptor: &str, reason: &str, position: &Position) -> Error {
    Error::new(
        ErrorImpl::ModuleNotFound {
            descriptor: descriptor.to_string(),
            reason: reason.to_string(),
        },
        position.clone(),
    )
}

/// Locates and loads the modules a source file imports.
pub trait ModuleProvider {
    /// Resolves an import descriptor relative to the importing module.
    fn route(&self, requester: &Route, descriptor: &str, position: &Position)
        -> Result<Route, Error>;

    /// Source text of a resolved route.
    fn source(&self, route: &Route, position: &Position) -> Result<String, Error>;

    /// Raw syntax tree of a resolved route.
    fn module(&self, route: &Route, position: &Position) -> Result<SourceModule, Error> {
        let source = self.source(route, position)?;
        let tokens = tokenize(source, Some(route.to_string()))?;
        let (_, tree) = parse(tokens, Rc::new(route.to_string()));
        tree
    }
}

/// Loads modules from disk. Descriptors are paths relative to the
/// directory of the importing file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileProvider;

impl ModuleProvider for FileProvider {
    fn route(
        &self,
        requester: &Route,
        descriptor: &str,
        position: &Position,
    ) -> Result<Route, Error> {
        let Route::File(requester) = requester else {
            return Err(not_found(
                descriptor,
                "only file modules can import files",
                position,
            ));
        };

        let base = requester.parent().unwrap_or(Path::new("."));
        let candidate = base.join(descriptor);

        if !candidate.exists() {
            return Err(not_found(descriptor, "file does not exist", position));
        }
        if !candidate.is_file() {
            return Err(not_found(descriptor, "not a file", position));
        }

        let canonical = fs::canonicalize(&candidate)
            .map_err(|error| not_found(descriptor, &error.to_string(), position))?;

        Ok(Route::File(canonical))
    }

    fn source(&self, route: &Route, position: &Position) -> Result<String, Error> {
        match route {
            Route::File(path) => fs::read_to_string(path)
                .map_err(|error| not_found(&route.to_string(), &error.to_string(), position)),
            _ => Err(not_found(&route.to_string(), "not a file route", position)),
        }
    }
}

/// Serves modules from memory. Descriptors name the virtual modules
/// directly, whoever imports them.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    sources: HashMap<String, String>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        MemoryProvider::default()
    }

    pub fn with(mut self, name: &str, source: &str) -> Self {
        self.insert(name, source);
        self
    }

    pub fn insert(&mut self, name: &str, source: &str) {
        self.sources.insert(name.to_string(), source.to_string());
    }
}

impl ModuleProvider for MemoryProvider {
    fn route(
        &self,
        _requester: &Route,
        descriptor: &str,
        position: &Position,
    ) -> Result<Route, Error> {
        if self.sources.contains_key(descriptor) {
            Ok(Route::Virtual(descriptor.to_string()))
        } else {
            Err(not_found(descriptor, "no such virtual module", position))
        }
    }

    fn source(&self, route: &Route, position: &Position) -> Result<String, Error> {
        match route {
            Route::Virtual(name) => self
                .sources
                .get(name)
                .cloned()
                .ok_or_else(|| not_found(name, "no such virtual module", position)),
            _ => Err(not_found(&route.to_string(), "not a virtual route", position)),
        }
    }
}
