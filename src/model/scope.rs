use crate::{
    ast::types::{ArraySize, TypeExpr},
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::{
    definition::Definition,
    module::{Module, Symbol, SymbolTable},
    types::{Arity, DefId, Type, TypeKind, NATIVE_LOOKUP},
};

/// Read-only view of everything a module's types and names resolve against.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    pub symbols: &'a SymbolTable,
    pub modules: &'a [Module],
    pub definitions: &'a [Definition],
}

impl<'a> Scope<'a> {
    pub fn new(
        symbols: &'a SymbolTable,
        modules: &'a [Module],
        definitions: &'a [Definition],
    ) -> Self {
        Scope {
            symbols,
            modules,
            definitions,
        }
    }

    pub fn definition(&self, id: DefId) -> &'a Definition {
        &self.definitions[id.0]
    }

    /// Resolves a dotted route that must name a definition: `Def` or
    /// `module.Def`.
    pub fn resolve_definition(&self, route: &[String], position: &Position) -> Result<DefId, Error> {
        let not_found = |symbol: String| {
            Error::new(ErrorImpl::SymbolNotFound { symbol }, position.clone())
        };

        let head = route.first().ok_or_else(|| not_found(String::new()))?;

        match self.symbols.get(head) {
            Some(Symbol::Definition(id)) if route.len() == 1 => Ok(id),
            Some(Symbol::Definition(_)) => Err(Error::new(
                ErrorImpl::FunctionAsType {
                    route: route.join("."),
                },
                position.clone(),
            )),
            Some(Symbol::Module(module)) => {
                if route.len() == 1 {
                    return Err(Error::new(
                        ErrorImpl::ModuleAsType {
                            route: route.join("."),
                        },
                        position.clone(),
                    ));
                }

                let id = self.modules[module.0]
                    .definition(&route[1])
                    .ok_or_else(|| not_found(route[..2].join(".")))?;

                if route.len() > 2 {
                    return Err(Error::new(
                        ErrorImpl::FunctionAsType {
                            route: route.join("."),
                        },
                        position.clone(),
                    ));
                }

                Ok(id)
            }
            None => Err(not_found(head.clone())),
        }
    }

    /// Resolves a type as written in source to a `Type`.
    pub fn resolve_type(&self, type_expr: &TypeExpr) -> Result<Type, Error> {
        match type_expr {
            TypeExpr::Symbol { route, position } => {
                if let [name] = route.as_slice() {
                    if let Some(keyword) = NATIVE_LOOKUP.get(name.as_str()) {
                        return Ok(keyword.to_type());
                    }
                }

                let id = self.resolve_definition(route, position)?;
                Ok(self.definition(id).as_type())
            }
            TypeExpr::Tuple { fields, position } => {
                let mut resolved = Vec::with_capacity(fields.len());
                for field in fields {
                    let field = self.resolve_type(field)?;
                    if field.is_void() {
                        return Err(Error::new(
                            ErrorImpl::TypeMatchError {
                                expected: String::from("a tuple field"),
                                received: field.to_string(),
                            },
                            position.clone(),
                        ));
                    }
                    resolved.push(field);
                }

                Ok(Type::tuple(resolved))
            }
            TypeExpr::Array {
                underlying,
                size,
                position,
            } => {
                let underlying = self.resolve_type(underlying)?;
                let invalid = underlying.is_void()
                    || underlying.is_array()
                    || *size == ArraySize::Fixed(0);

                if invalid {
                    return Err(Error::new(
                        ErrorImpl::InvalidArray {
                            type_: underlying.to_string(),
                        },
                        position.clone(),
                    ));
                }

                let arity = match size {
                    ArraySize::Auto => Arity::Auto,
                    ArraySize::Fixed(size) => Arity::Fixed(*size),
                };

                Ok(underlying.with_array(arity))
            }
            TypeExpr::Extern { name, .. } => Ok(Type::new(TypeKind::Extern(name.clone()))),
            TypeExpr::Function { position, .. } => Err(Error::new(
                ErrorImpl::Unsupported {
                    feature: String::from("function values"),
                },
                position.clone(),
            )),
        }
    }
}
