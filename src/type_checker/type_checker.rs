use log::{debug, trace};

use crate::{
    ast::expressions::{Expr, ExprKind, Literal},
    errors::errors::{Error, ErrorImpl},
    model::{
        definition::{Definition, GroupRef},
        func::{Completion, Dependency, FuncArena, FuncBody, FuncHeader, FuncId},
        module::Symbol,
        scope::Scope,
        types::{format_types, Arity, DefId, Native, Type},
    },
    Position,
};

use super::{
    slots::SlotTable,
    typed_ast::{TypedExpr, TypedExprKind},
};

/// Shared state every function body is generated against.
pub struct GenContext<'a> {
    pub funcs: &'a mut FuncArena,
    pub scope: Scope<'a>,
}

/// Per-function generation state.
#[derive(Debug)]
pub struct Generator {
    pub header: FuncHeader,
    pub slots: SlotTable,
    pub dependencies: Vec<Dependency>,
}

/// What a call expression resolved to.
enum Callee {
    Direct(FuncId),
    Instanced(GroupRef),
}

/// One step of the callee search.
#[derive(Debug, Clone, Copy)]
enum Search {
    /// Free functions only
    Free(DefId),
    /// Instance groups, then free functions
    Members(DefId),
}

impl Generator {
    pub fn new(header: FuncHeader) -> Self {
        Generator {
            header,
            slots: SlotTable::new(),
            dependencies: vec![],
        }
    }

    fn depend(&mut self, dependency: Dependency) {
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency);
        }
    }

    fn is_bound(&self, name: &str) -> bool {
        self.lookup_name(name).is_some()
    }

    /// Resolves a bare name: locals first, then parameters, then the
    /// receiver fields named by the struct prefix.
    fn lookup_name(&self, name: &str) -> Option<(TypedExprKind, Type)> {
        if let Some((slot, ty)) = self.slots.lookup(name) {
            return Some((TypedExprKind::Local(slot), ty.clone()));
        }

        let offset = self.header.param_offset();
        if let Some(index) = self.header.param_names.iter().position(|param| param == name) {
            return Some((
                TypedExprKind::Param(offset + index as u32),
                self.header.inputs[index].clone(),
            ));
        }

        let prefix = self.header.prefix.as_ref()?;
        let index = prefix
            .names
            .iter()
            .position(|field| field.as_deref() == Some(name))?;

        let receiver = TypedExpr::new(
            TypedExprKind::Param(0),
            prefix.receiver.clone(),
            self.header.position.clone(),
        );

        Some((
            TypedExprKind::Field {
                base: Box::new(receiver),
                index,
                fields: prefix.fields.clone(),
                header: 4,
            },
            prefix.fields[index].clone(),
        ))
    }
}

/// Generates the body of a pending function. Functions that are already
/// generated or in progress are left alone.
pub fn generate_function(ctx: &mut GenContext, id: FuncId) -> Result<(), Error> {
    let Some(source) = ctx.funcs.take_pending(id) else {
        return Ok(());
    };

    let header = ctx.funcs.header(id).clone();
    debug!("generating function `{}`", header.name);

    let mut generator = Generator::new(header);
    let body = generate_expr(&mut generator, ctx, &source.body)?;

    let output = match &generator.header.declared_output {
        Some(declared) => {
            if !declared.is_equals(&body.ty) {
                return Err(Error::new(
                    ErrorImpl::TypeMatchError {
                        expected: declared.to_string(),
                        received: body.ty.to_string(),
                    },
                    body.position.clone(),
                ));
            }
            declared.clone()
        }
        None => body.ty.clone(),
    };

    trace!(
        "function `{}` -> {} with {} locals",
        generator.header.name,
        output,
        generator.slots.len()
    );

    ctx.funcs.complete(
        id,
        Completion {
            output,
            locals: generator.slots.into_types(),
            body: FuncBody::Expr(body),
            dependencies: generator.dependencies,
        },
    );

    Ok(())
}

/// Output type of `id`, generating its body first if needed.
pub fn ensure_output(ctx: &mut GenContext, id: FuncId, position: &Position) -> Result<Type, Error> {
    generate_function(ctx, id)?;

    ctx.funcs.output(id).ok_or_else(|| {
        Error::new(
            ErrorImpl::RecursiveInference {
                function: ctx.funcs.header(id).name.clone(),
            },
            position.clone(),
        )
    })
}

fn group_output(ctx: &mut GenContext, group: GroupRef, position: &Position) -> Result<Type, Error> {
    let scope = ctx.scope;
    let first = scope.definition(group.def).instances[group.index]
        .members
        .iter()
        .flatten()
        .next()
        .copied();

    match first {
        Some(member) => ensure_output(ctx, member, position),
        None => Err(Error::new(
            ErrorImpl::SignatureNotCovered {
                function: scope.definition(group.def).instances[group.index].name.clone(),
                struct_index: 0,
            },
            position.clone(),
        )),
    }
}

pub fn generate_expr(
    generator: &mut Generator,
    ctx: &mut GenContext,
    expr: &Expr,
) -> Result<TypedExpr, Error> {
    let position = expr.span.start.clone();

    match &expr.kind {
        ExprKind::Void => Ok(TypedExpr::void(position)),
        ExprKind::Literal(literal) => {
            let native = match literal {
                Literal::I32(_) => Native::I32,
                Literal::I64(_) => Native::I64,
                Literal::F32(_) => Native::F32,
                Literal::F64(_) => Native::F64,
                Literal::String(_) => Native::String,
                Literal::Bool(_) => Native::Bool,
            };

            Ok(TypedExpr::new(
                TypedExprKind::Literal(literal.clone()),
                Type::native(native),
                position,
            ))
        }
        ExprKind::Symbol(name) => match generator.lookup_name(name) {
            Some((kind, ty)) => Ok(TypedExpr::new(kind, ty, position)),
            None => Err(Error::new(
                ErrorImpl::SymbolNotFound {
                    symbol: name.clone(),
                },
                position,
            )),
        },
        ExprKind::Assignment { assignee, value } => {
            if generator.is_bound(assignee) {
                return Err(Error::new(
                    ErrorImpl::AlreadyAssigned {
                        variable: assignee.clone(),
                    },
                    position,
                ));
            }

            let value = generate_expr(generator, ctx, value)?;
            if value.ty.is_void() {
                return Err(Error::new(
                    ErrorImpl::VoidAssignment {
                        variable: assignee.clone(),
                    },
                    position,
                ));
            }

            let slot = generator.slots.allocate(assignee, &value.ty);

            Ok(TypedExpr::new(
                TypedExprKind::Assign {
                    slot,
                    value: Box::new(value),
                },
                Type::void(),
                position,
            ))
        }
        ExprKind::If {
            condition,
            then,
            otherwise,
        } => {
            let condition = generate_expr(generator, ctx, condition)?;
            if !condition.ty.is_native(Native::Bool) {
                return Err(Error::new(
                    ErrorImpl::ConditionNotBool {
                        received: condition.ty.to_string(),
                    },
                    condition.position.clone(),
                ));
            }

            let then = generate_scoped(generator, ctx, then)?;
            let otherwise = match otherwise {
                Some(otherwise) => Some(generate_scoped(generator, ctx, otherwise)?),
                None => None,
            };

            let ty = match &otherwise {
                Some(otherwise) if !then.ty.is_equals(&otherwise.ty) => {
                    return Err(Error::new(
                        ErrorImpl::BranchMismatch {
                            then: then.ty.to_string(),
                            otherwise: otherwise.ty.to_string(),
                        },
                        position,
                    ))
                }
                Some(_) => then.ty.clone(),
                None if !then.ty.is_void() => {
                    return Err(Error::new(
                        ErrorImpl::BranchMismatch {
                            then: then.ty.to_string(),
                            otherwise: String::from("void"),
                        },
                        position,
                    ))
                }
                None => Type::void(),
            };

            Ok(TypedExpr::new(
                TypedExprKind::If {
                    condition: Box::new(condition),
                    then: Box::new(then),
                    otherwise: otherwise.map(Box::new),
                },
                ty,
                position,
            ))
        }
        ExprKind::Group(expressions) => {
            if expressions.is_empty() {
                return Err(Error::new(ErrorImpl::EmptyGroup, position));
            }

            let snapshot = generator.slots.open_scope();
            let mut typed = Vec::with_capacity(expressions.len());
            for expression in expressions {
                typed.push(generate_expr(generator, ctx, expression)?);
            }
            generator.slots.close_scope(snapshot);

            let ty = typed
                .last()
                .map(|last| last.ty.clone())
                .unwrap_or_else(Type::void);

            Ok(TypedExpr::new(TypedExprKind::Group(typed), ty, position))
        }
        ExprKind::Tuple(elements) => {
            if elements.is_empty() {
                return Err(Error::new(
                    ErrorImpl::EmptyLiteral {
                        kind: String::from("tuple"),
                    },
                    position,
                ));
            }

            let elements = generate_values(generator, ctx, elements)?;
            let ty = Type::tuple(elements.iter().map(|element| element.ty.clone()).collect());

            Ok(TypedExpr::new(TypedExprKind::Tuple(elements), ty, position))
        }
        ExprKind::List(elements) => {
            if elements.is_empty() {
                return Err(Error::new(
                    ErrorImpl::EmptyLiteral {
                        kind: String::from("list"),
                    },
                    position,
                ));
            }

            let elements = generate_values(generator, ctx, elements)?;
            let element_type = elements[0].ty.clone();

            if element_type.is_array() {
                return Err(Error::new(
                    ErrorImpl::InvalidArray {
                        type_: element_type.to_string(),
                    },
                    position,
                ));
            }

            if let Some(mismatch) = elements
                .iter()
                .find(|element| !element.ty.is_equals(&element_type))
            {
                return Err(Error::new(
                    ErrorImpl::ListElementMismatch {
                        expected: element_type.to_string(),
                        received: mismatch.ty.to_string(),
                    },
                    mismatch.position.clone(),
                ));
            }

            let ty = element_type.with_array(Arity::Fixed(elements.len() as u32));
            Ok(TypedExpr::new(TypedExprKind::List(elements), ty, position))
        }
        ExprKind::Binary {
            operator,
            left,
            right,
        } => {
            let arguments = vec![
                generate_value(generator, ctx, left)?,
                generate_value(generator, ctx, right)?,
            ];
            generate_call(generator, ctx, None, operator, arguments, position)
        }
        ExprKind::Prefix { operator, operand } => {
            let arguments = vec![generate_value(generator, ctx, operand)?];
            generate_call(generator, ctx, None, operator, arguments, position)
        }
        ExprKind::Call { callee, arguments } => {
            generate_call_expr(generator, ctx, callee, arguments, position)
        }
        ExprKind::Member { .. } => Err(unsupported("attribute access", position)),
        ExprKind::Index { .. } => Err(unsupported("indexing", position)),
        ExprKind::StructInit { .. } => Err(unsupported("struct literals", position)),
    }
}

fn unsupported(feature: &str, position: Position) -> Error {
    Error::new(
        ErrorImpl::Unsupported {
            feature: feature.to_string(),
        },
        position,
    )
}

/// Generates `expr` inside its own slot scope.
fn generate_scoped(
    generator: &mut Generator,
    ctx: &mut GenContext,
    expr: &Expr,
) -> Result<TypedExpr, Error> {
    let snapshot = generator.slots.open_scope();
    let typed = generate_expr(generator, ctx, expr);
    generator.slots.close_scope(snapshot);
    typed
}

/// Generates an expression that must produce a value.
fn generate_value(
    generator: &mut Generator,
    ctx: &mut GenContext,
    expr: &Expr,
) -> Result<TypedExpr, Error> {
    let typed = generate_expr(generator, ctx, expr)?;
    if typed.ty.is_void() {
        return Err(Error::new(
            ErrorImpl::TypeMatchError {
                expected: String::from("a value"),
                received: typed.ty.to_string(),
            },
            typed.position.clone(),
        ));
    }
    Ok(typed)
}

fn generate_values(
    generator: &mut Generator,
    ctx: &mut GenContext,
    exprs: &[Expr],
) -> Result<Vec<TypedExpr>, Error> {
    exprs
        .iter()
        .map(|expr| generate_value(generator, ctx, expr))
        .collect()
}

fn generate_call_expr(
    generator: &mut Generator,
    ctx: &mut GenContext,
    callee: &Expr,
    arguments: &[Expr],
    position: Position,
) -> Result<TypedExpr, Error> {
    let scope = ctx.scope;

    match &callee.kind {
        ExprKind::Symbol(name) if name == "at" && arguments.len() == 2 => {
            generate_access(generator, ctx, &arguments[0], &arguments[1], position)
        }
        ExprKind::Symbol(name) if generator.is_bound(name) => {
            Err(unsupported("function values", position))
        }
        ExprKind::Symbol(name) => {
            let arguments = generate_values(generator, ctx, arguments)?;

            if let Some(Symbol::Definition(id)) = scope.symbols.get(name) {
                return generate_build(scope.definition(id), arguments, position);
            }

            generate_call(generator, ctx, None, name, arguments, position)
        }
        ExprKind::Member { .. } => {
            let Some(route) = callee.as_route() else {
                return Err(unsupported("attribute access", position));
            };

            if generator.is_bound(&route[0]) {
                return Err(unsupported("attribute access", position));
            }

            if let Ok(id) = scope.resolve_definition(&route, &position) {
                let arguments = generate_values(generator, ctx, arguments)?;
                return generate_build(scope.definition(id), arguments, position);
            }

            let (owner, name) = route.split_at(route.len() - 1);
            let targets = match (owner, scope.symbols.get(&owner[0])) {
                ([_], Some(Symbol::Module(module))) => scope.modules[module.0]
                    .definitions
                    .values()
                    .copied()
                    .collect(),
                _ => vec![scope.resolve_definition(owner, &position)?],
            };

            let arguments = generate_values(generator, ctx, arguments)?;
            generate_call(generator, ctx, Some(targets), &name[0], arguments, position)
        }
        ExprKind::Call { .. } => Err(unsupported("returned function calls", position)),
        _ => Err(unsupported("calling an expression", position)),
    }
}

/// Picks the first free-function overload of `name` in `definition` that
/// accepts `arguments`.
fn select_overload(definition: &Definition, name: &str, arguments: &[Type]) -> Option<FuncId> {
    definition
        .functions
        .get(name)?
        .iter()
        .find(|overload| {
            overload.inputs.len() == arguments.len()
                && overload
                    .inputs
                    .iter()
                    .zip(arguments)
                    .all(|(input, argument)| input.accepts(argument))
        })
        .map(|overload| overload.func)
}

/// Picks the instance group of `name` whose receiver is `arguments[0]`.
fn select_group(definition: &Definition, name: &str, arguments: &[Type]) -> Option<GroupRef> {
    let (receiver, rest) = arguments.split_first()?;
    if receiver.as_def()?.id != definition.id {
        return None;
    }

    definition
        .instance_groups(name, rest.len())
        .find(|(_, group)| {
            group
                .inputs
                .iter()
                .zip(rest)
                .all(|(input, argument)| input.accepts(argument))
        })
        .map(|(group, _)| group)
}

fn has_function(definition: &Definition, name: &str) -> bool {
    definition.functions.contains_key(name)
        || definition.instances.iter().any(|group| group.name == name)
}

/// Resolves `name(arguments)`.
///
/// # Arguments
///
/// * `targets` - Definitions to search, `None` for the default search order
/// * `name` - Function name, an operator for lowered operations
/// * `arguments` - Generated arguments
///
/// # Returns
///
/// A direct call of the first matching overload, or an instanced call when
/// the first argument's definition has a matching instance group.
fn generate_call(
    generator: &mut Generator,
    ctx: &mut GenContext,
    targets: Option<Vec<DefId>>,
    name: &str,
    arguments: Vec<TypedExpr>,
    position: Position,
) -> Result<TypedExpr, Error> {
    let scope = ctx.scope;
    let types: Vec<Type> = arguments.iter().map(|argument| argument.ty.clone()).collect();

    let search: Vec<Search> = match targets {
        Some(targets) => targets.into_iter().map(Search::Members).collect(),
        None => {
            let mut search = vec![Search::Free(generator.header.owner)];
            if let Some(receiver) = types.first().and_then(|ty| ty.as_def()) {
                search.push(Search::Members(receiver.id));
            }
            search.extend(scope.symbols.definitions().map(Search::Free));
            search
        }
    };

    let mut callee = None;
    let mut seen = false;
    for step in search {
        let (id, groups) = match step {
            Search::Free(id) => (id, false),
            Search::Members(id) => (id, true),
        };
        let definition = scope.definition(id);
        seen |= has_function(definition, name);

        if groups {
            if let Some(group) = select_group(definition, name, &types) {
                callee = Some(Callee::Instanced(group));
                break;
            }
        }
        if let Some(func) = select_overload(definition, name, &types) {
            callee = Some(Callee::Direct(func));
            break;
        }
    }

    match callee {
        Some(Callee::Direct(func)) => {
            let output = ensure_output(ctx, func, &position)?;
            generator.depend(Dependency::Func(func));

            Ok(TypedExpr::new(
                TypedExprKind::Call { func, arguments },
                output,
                position,
            ))
        }
        Some(Callee::Instanced(group)) => {
            let output = group_output(ctx, group, &position)?;
            generator.depend(Dependency::Group(group));

            let mut arguments = arguments.into_iter();
            let Some(receiver) = arguments.next() else {
                return Err(Error::new(
                    ErrorImpl::UnhandledExpression {
                        kind: String::from("instanced call without receiver"),
                    },
                    position,
                ));
            };

            Ok(TypedExpr::new(
                TypedExprKind::InstancedCall {
                    group,
                    receiver: Box::new(receiver),
                    arguments: arguments.collect(),
                },
                output,
                position,
            ))
        }
        None if seen => Err(Error::new(
            ErrorImpl::NoMatchingOverload {
                function: name.to_string(),
                arguments: format_types(&types),
            },
            position,
        )),
        None => Err(Error::new(
            ErrorImpl::SymbolNotFound {
                symbol: name.to_string(),
            },
            position,
        )),
    }
}

/// `T(args)`: a value of the struct of `T` whose fields equal the argument
/// types.
fn generate_build(
    definition: &Definition,
    fields: Vec<TypedExpr>,
    position: Position,
) -> Result<TypedExpr, Error> {
    let struct_index = definition.structs.iter().position(|candidate| {
        candidate.fields.len() == fields.len()
            && candidate
                .fields
                .iter()
                .zip(&fields)
                .all(|(field, value)| field.is_equals(&value.ty))
    });

    let Some(struct_index) = struct_index else {
        let types: Vec<Type> = fields.iter().map(|field| field.ty.clone()).collect();
        return Err(Error::new(
            ErrorImpl::NoMatchingOverload {
                function: definition.name.clone(),
                arguments: format_types(&types),
            },
            position,
        ));
    };

    Ok(TypedExpr::new(
        TypedExprKind::Build {
            struct_index,
            fields,
        },
        definition.as_type(),
        position,
    ))
}

fn constant_index(index: &Expr, length: usize) -> Result<usize, Error> {
    let position = index.span.start.clone();

    match &index.kind {
        ExprKind::Literal(Literal::I32(value)) => {
            if *value < 0 || *value as usize >= length {
                return Err(Error::new(
                    ErrorImpl::IndexOutOfBounds {
                        index: (*value).max(0) as usize,
                        length,
                    },
                    position,
                ));
            }
            Ok(*value as usize)
        }
        _ => Err(Error::new(ErrorImpl::IndexNotConstant, position)),
    }
}

/// `at(base, index)`: element access on arrays, constant field access on
/// tuples and on definitions with a single struct.
fn generate_access(
    generator: &mut Generator,
    ctx: &mut GenContext,
    base: &Expr,
    index: &Expr,
    position: Position,
) -> Result<TypedExpr, Error> {
    let base = generate_value(generator, ctx, base)?;

    if base.ty.is_array() {
        let index = generate_value(generator, ctx, index)?;
        if !index.ty.is_native(Native::I32) {
            return Err(Error::new(
                ErrorImpl::TypeMatchError {
                    expected: String::from("i32"),
                    received: index.ty.to_string(),
                },
                index.position.clone(),
            ));
        }

        let element = base.ty.element();
        let width = element.width();
        return Ok(TypedExpr::new(
            TypedExprKind::Index {
                base: Box::new(base),
                index: Box::new(index),
                width,
            },
            element,
            position,
        ));
    }

    let (fields, header) = if let Some(fields) = base.ty.as_tuple() {
        (fields.to_vec(), 0)
    } else if let Some(def) = base.ty.as_def() {
        match ctx.scope.definition(def.id).structs.as_slice() {
            [only] => (only.fields.clone(), 4),
            _ => {
                return Err(Error::new(
                    ErrorImpl::NotIndexable {
                        type_: base.ty.to_string(),
                    },
                    position,
                ))
            }
        }
    } else {
        return Err(Error::new(
            ErrorImpl::NotIndexable {
                type_: base.ty.to_string(),
            },
            position,
        ));
    };

    let field = constant_index(index, fields.len())?;
    let ty = fields[field].clone();

    Ok(TypedExpr::new(
        TypedExprKind::Field {
            base: Box::new(base),
            index: field,
            fields,
            header,
        },
        ty,
        position,
    ))
}
