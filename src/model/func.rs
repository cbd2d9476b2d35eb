use crate::{
    ast::statements::FnDeclStmt,
    errors::errors::{Error, ErrorImpl},
    type_checker::typed_ast::TypedExpr,
    Position,
};

use super::{
    definition::GroupRef,
    types::{DefId, Type},
};

/// Handle of a function in the session's function arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub usize);

/// The receiver description of an instance function.
#[derive(Debug, Clone)]
pub struct StructPrefix {
    /// Type of the implicit receiver parameter
    pub receiver: Type,
    /// Index of the struct of the owning definition
    pub index: usize,
    pub fields: Vec<Type>,
    pub names: Vec<Option<String>>,
}

/// Everything known about a function before its body is generated.
#[derive(Debug, Clone)]
pub struct FuncHeader {
    pub name: String,
    pub owner: DefId,
    pub inputs: Vec<Type>,
    pub param_names: Vec<String>,
    pub prefix: Option<StructPrefix>,
    pub declared_output: Option<Type>,
    pub position: Position,
}

impl FuncHeader {
    /// Parameter types as seen by a caller, the receiver first for
    /// instance functions.
    pub fn parameters(&self) -> Vec<Type> {
        let mut parameters = Vec::with_capacity(self.inputs.len() + 1);
        if let Some(prefix) = &self.prefix {
            parameters.push(prefix.receiver.clone());
        }
        parameters.extend(self.inputs.iter().cloned());
        parameters
    }

    /// Index of the first declared parameter.
    pub fn param_offset(&self) -> u32 {
        if self.prefix.is_some() {
            1
        } else {
            0
        }
    }
}

#[derive(Debug, Clone)]
pub enum FuncBody {
    Expr(TypedExpr),
    /// Fixed instruction sequence looked up in the injector
    Builtin(String),
    /// Host function bound at instantiation
    Import { module: String, name: String },
}

/// Something a function body calls, either directly or through a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependency {
    Func(FuncId),
    Group(GroupRef),
}

/// The derived half of a function, filled in once its body is generated.
#[derive(Debug, Clone)]
pub struct Completion {
    pub output: Type,
    pub locals: Vec<Type>,
    pub body: FuncBody,
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone)]
enum FuncState {
    Pending(Box<FnDeclStmt>),
    InProgress,
    Ready(Completion),
}

/// A fully generated function.
#[derive(Debug, Clone)]
pub struct Func {
    pub header: FuncHeader,
    pub output: Type,
    pub locals: Vec<Type>,
    pub body: FuncBody,
    pub dependencies: Vec<Dependency>,
}

impl Func {
    pub fn is_expr(&self) -> bool {
        matches!(self.body, FuncBody::Expr(_))
    }
}

/// Two-phase function storage. Headers are registered when a definition is
/// declared, bodies are generated later and possibly out of order.
#[derive(Debug, Default)]
pub struct FuncArena {
    entries: Vec<(FuncHeader, FuncState)>,
}

impl FuncArena {
    pub fn new() -> Self {
        FuncArena::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers a function whose body still has to be generated.
    pub fn declare(&mut self, header: FuncHeader, source: FnDeclStmt) -> FuncId {
        self.entries
            .push((header, FuncState::Pending(Box::new(source))));
        FuncId(self.entries.len() - 1)
    }

    /// Registers a function that needs no generation (builtins, imports).
    pub fn insert_ready(&mut self, header: FuncHeader, completion: Completion) -> FuncId {
        self.entries.push((header, FuncState::Ready(completion)));
        FuncId(self.entries.len() - 1)
    }

    pub fn header(&self, id: FuncId) -> &FuncHeader {
        &self.entries[id.0].0
    }

    pub fn is_ready(&self, id: FuncId) -> bool {
        matches!(self.entries[id.0].1, FuncState::Ready(_))
    }

    /// Moves a pending function to the in-progress state and hands out its
    /// source. Returns `None` when the function is not pending.
    pub fn take_pending(&mut self, id: FuncId) -> Option<FnDeclStmt> {
        let state = &mut self.entries[id.0].1;
        if !matches!(state, FuncState::Pending(_)) {
            return None;
        }

        match std::mem::replace(state, FuncState::InProgress) {
            FuncState::Pending(source) => Some(*source),
            _ => None,
        }
    }

    pub fn complete(&mut self, id: FuncId, completion: Completion) {
        self.entries[id.0].1 = FuncState::Ready(completion);
    }

    /// The output type if known: the generated one, otherwise the declared
    /// one.
    pub fn output(&self, id: FuncId) -> Option<Type> {
        let (header, state) = &self.entries[id.0];
        match state {
            FuncState::Ready(completion) => Some(completion.output.clone()),
            _ => header.declared_output.clone(),
        }
    }

    pub fn completion(&self, id: FuncId) -> Option<&Completion> {
        match &self.entries[id.0].1 {
            FuncState::Ready(completion) => Some(completion),
            _ => None,
        }
    }

    /// Consumes the arena. Fails if any function was never completed.
    pub fn seal(self) -> Result<Vec<Func>, Error> {
        self.entries
            .into_iter()
            .map(|(header, state)| match state {
                FuncState::Ready(completion) => Ok(Func {
                    header,
                    output: completion.output,
                    locals: completion.locals,
                    body: completion.body,
                    dependencies: completion.dependencies,
                }),
                _ => Err(Error::new(
                    ErrorImpl::FunctionNotRegistered {
                        function: header.name.clone(),
                    },
                    header.position.clone(),
                )),
            })
            .collect()
    }
}
