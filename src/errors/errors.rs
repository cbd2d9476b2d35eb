use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

/// The phase of compilation an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    Type,
    Resolution,
    Dependency,
    Emission,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::Unsupported { .. } => "Unsupported",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::BranchMismatch { .. } => "BranchMismatch",
            ErrorImpl::ConditionNotBool { .. } => "ConditionNotBool",
            ErrorImpl::NoMatchingOverload { .. } => "NoMatchingOverload",
            ErrorImpl::ListElementMismatch { .. } => "ListElementMismatch",
            ErrorImpl::EmptyGroup => "EmptyGroup",
            ErrorImpl::EmptyLiteral { .. } => "EmptyLiteral",
            ErrorImpl::VoidAssignment { .. } => "VoidAssignment",
            ErrorImpl::IndexNotConstant => "IndexNotConstant",
            ErrorImpl::IndexOutOfBounds { .. } => "IndexOutOfBounds",
            ErrorImpl::NotIndexable { .. } => "NotIndexable",
            ErrorImpl::SymbolNotFound { .. } => "SymbolNotFound",
            ErrorImpl::AlreadyAssigned { .. } => "AlreadyAssigned",
            ErrorImpl::StructMismatch { .. } => "StructMismatch",
            ErrorImpl::StructAmbiguity { .. } => "StructAmbiguity",
            ErrorImpl::RepeatedStruct { .. } => "RepeatedStruct",
            ErrorImpl::RepeatedOverload { .. } => "RepeatedOverload",
            ErrorImpl::RepeatedSignature { .. } => "RepeatedSignature",
            ErrorImpl::RepeatedDefinition { .. } => "RepeatedDefinition",
            ErrorImpl::SignatureNotCovered { .. } => "SignatureNotCovered",
            ErrorImpl::InstanceOutputMismatch { .. } => "InstanceOutputMismatch",
            ErrorImpl::ModuleAsType { .. } => "ModuleAsType",
            ErrorImpl::FunctionAsType { .. } => "FunctionAsType",
            ErrorImpl::InvalidArray { .. } => "InvalidArray",
            ErrorImpl::RecursiveInference { .. } => "RecursiveInference",
            ErrorImpl::CircularDependency { .. } => "CircularDependency",
            ErrorImpl::ModuleNotFound { .. } => "ModuleNotFound",
            ErrorImpl::FunctionNotRegistered { .. } => "FunctionNotRegistered",
            ErrorImpl::NotPureExport { .. } => "NotPureExport",
            ErrorImpl::NotPureTableEntry { .. } => "NotPureTableEntry",
            ErrorImpl::UnknownBuiltin { .. } => "UnknownBuiltin",
            ErrorImpl::UnhandledExpression { .. } => "UnhandledExpression",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. }
            | ErrorImpl::UnexpectedToken { .. }
            | ErrorImpl::UnexpectedTokenDetailed { .. }
            | ErrorImpl::NumberParseError { .. }
            | ErrorImpl::Unsupported { .. } => ErrorCategory::Syntax,
            ErrorImpl::TypeMatchError { .. }
            | ErrorImpl::BranchMismatch { .. }
            | ErrorImpl::ConditionNotBool { .. }
            | ErrorImpl::NoMatchingOverload { .. }
            | ErrorImpl::ListElementMismatch { .. }
            | ErrorImpl::EmptyGroup
            | ErrorImpl::EmptyLiteral { .. }
            | ErrorImpl::VoidAssignment { .. }
            | ErrorImpl::IndexNotConstant
            | ErrorImpl::IndexOutOfBounds { .. }
            | ErrorImpl::NotIndexable { .. } => ErrorCategory::Type,
            ErrorImpl::SymbolNotFound { .. }
            | ErrorImpl::AlreadyAssigned { .. }
            | ErrorImpl::StructMismatch { .. }
            | ErrorImpl::StructAmbiguity { .. }
            | ErrorImpl::RepeatedStruct { .. }
            | ErrorImpl::RepeatedOverload { .. }
            | ErrorImpl::RepeatedSignature { .. }
            | ErrorImpl::RepeatedDefinition { .. }
            | ErrorImpl::SignatureNotCovered { .. }
            | ErrorImpl::InstanceOutputMismatch { .. }
            | ErrorImpl::ModuleAsType { .. }
            | ErrorImpl::FunctionAsType { .. }
            | ErrorImpl::InvalidArray { .. }
            | ErrorImpl::RecursiveInference { .. } => ErrorCategory::Resolution,
            ErrorImpl::CircularDependency { .. } | ErrorImpl::ModuleNotFound { .. } => {
                ErrorCategory::Dependency
            }
            ErrorImpl::FunctionNotRegistered { .. }
            | ErrorImpl::NotPureExport { .. }
            | ErrorImpl::NotPureTableEntry { .. }
            | ErrorImpl::UnknownBuiltin { .. }
            | ErrorImpl::UnhandledExpression { .. } => ErrorCategory::Emission,
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::Unsupported { feature } => {
                ErrorTip::Suggestion(format!("{} is not supported by the language", feature))
            }
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::BranchMismatch { then, otherwise } => ErrorTip::Suggestion(format!(
                "Both branches must have the same type, found `{}` and `{}`",
                then, otherwise
            )),
            ErrorImpl::ConditionNotBool { received } => {
                ErrorTip::Suggestion(format!("Condition must be `bool`, received `{}`", received))
            }
            ErrorImpl::NoMatchingOverload { function, arguments } => {
                ErrorTip::Suggestion(format!(
                    "No overload of `{}` accepts arguments ({})",
                    function, arguments
                ))
            }
            ErrorImpl::ListElementMismatch { expected, received } => {
                ErrorTip::Suggestion(format!(
                    "List elements must share one type, expected `{}`, received `{}`",
                    expected, received
                ))
            }
            ErrorImpl::EmptyGroup => {
                ErrorTip::Suggestion(String::from("Use `.` for an expression without a value"))
            }
            ErrorImpl::EmptyLiteral { kind } => {
                ErrorTip::Suggestion(format!("A {} needs at least one element", kind))
            }
            ErrorImpl::VoidAssignment { variable } => ErrorTip::Suggestion(format!(
                "Variable `{}` cannot hold a `void` value",
                variable
            )),
            ErrorImpl::IndexNotConstant => ErrorTip::Suggestion(String::from(
                "Fields of tuples and structs are accessed with an integer literal",
            )),
            ErrorImpl::IndexOutOfBounds { index, length } => ErrorTip::Suggestion(format!(
                "Index {} is out of bounds for {} fields",
                index, length
            )),
            ErrorImpl::NotIndexable { type_ } => {
                ErrorTip::Suggestion(format!("Values of type `{}` have no fields", type_))
            }
            ErrorImpl::SymbolNotFound { symbol } => {
                ErrorTip::Suggestion(format!("Symbol `{}` not found", symbol))
            }
            ErrorImpl::AlreadyAssigned { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` is already assigned", variable))
            }
            ErrorImpl::StructMismatch { definition } => ErrorTip::Suggestion(format!(
                "No struct of `{}` matches the instance prefix",
                definition
            )),
            ErrorImpl::StructAmbiguity { definition, candidates } => {
                ErrorTip::Suggestion(format!(
                    "{} structs of `{}` match the instance prefix, add field types",
                    candidates, definition
                ))
            }
            ErrorImpl::RepeatedStruct { definition } => ErrorTip::Suggestion(format!(
                "Definition `{}` already has a struct with these fields",
                definition
            )),
            ErrorImpl::RepeatedOverload { function } => ErrorTip::Suggestion(format!(
                "Function `{}` already has an overload with these inputs",
                function
            )),
            ErrorImpl::RepeatedSignature {
                function,
                struct_index,
            } => ErrorTip::Suggestion(format!(
                "Struct {} already implements this signature of `{}`",
                struct_index, function
            )),
            ErrorImpl::RepeatedDefinition { definition } => {
                ErrorTip::Suggestion(format!("Definition `{}` already declared", definition))
            }
            ErrorImpl::SignatureNotCovered {
                function,
                struct_index,
            } => ErrorTip::Suggestion(format!(
                "Struct {} does not implement this signature of `{}`",
                struct_index, function
            )),
            ErrorImpl::InstanceOutputMismatch {
                function,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "Every implementation of `{}` must return `{}`, found `{}`",
                function, expected, received
            )),
            ErrorImpl::ModuleAsType { route } => {
                ErrorTip::Suggestion(format!("`{}` names a module, not a type", route))
            }
            ErrorImpl::FunctionAsType { route } => {
                ErrorTip::Suggestion(format!("`{}` names a function, not a type", route))
            }
            ErrorImpl::InvalidArray { type_ } => {
                ErrorTip::Suggestion(format!("`{}` cannot be used as an array", type_))
            }
            ErrorImpl::RecursiveInference { function } => ErrorTip::Suggestion(format!(
                "Recursive function `{}` needs a declared output type",
                function
            )),
            ErrorImpl::CircularDependency { route } => {
                ErrorTip::Suggestion(format!("Module `{}` imports itself", route))
            }
            ErrorImpl::ModuleNotFound { descriptor, reason } => {
                ErrorTip::Suggestion(format!("Cannot import `{}`: {}", descriptor, reason))
            }
            ErrorImpl::FunctionNotRegistered { .. }
            | ErrorImpl::NotPureExport { .. }
            | ErrorImpl::NotPureTableEntry { .. }
            | ErrorImpl::UnknownBuiltin { .. }
            | ErrorImpl::UnhandledExpression { .. } => ErrorTip::Suggestion(String::from(
                "This is an internal compiler error",
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.position.1, self.position.0, self.internal_error
        )
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("unsupported feature: {feature}")]
    Unsupported { feature: String },

    #[error("types do not match: expected {expected:?}, received {received:?}")]
    TypeMatchError { expected: String, received: String },
    #[error("if branches do not match: {then:?} and {otherwise:?}")]
    BranchMismatch { then: String, otherwise: String },
    #[error("condition is not a bool: {received:?}")]
    ConditionNotBool { received: String },
    #[error("no overload of {function:?} matches ({arguments})")]
    NoMatchingOverload { function: String, arguments: String },
    #[error("list elements do not match: expected {expected:?}, received {received:?}")]
    ListElementMismatch { expected: String, received: String },
    #[error("empty group")]
    EmptyGroup,
    #[error("empty {kind}")]
    EmptyLiteral { kind: String },
    #[error("cannot assign a void value to {variable:?}")]
    VoidAssignment { variable: String },
    #[error("index is not a constant")]
    IndexNotConstant,
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: usize, length: usize },
    #[error("type {type_:?} is not indexable")]
    NotIndexable { type_: String },

    #[error("symbol {symbol:?} not found")]
    SymbolNotFound { symbol: String },
    #[error("variable {variable:?} already assigned")]
    AlreadyAssigned { variable: String },
    #[error("struct mismatch in {definition:?}")]
    StructMismatch { definition: String },
    #[error("struct ambiguity in {definition:?} ({candidates} candidates)")]
    StructAmbiguity {
        definition: String,
        candidates: usize,
    },
    #[error("repeated struct in {definition:?}")]
    RepeatedStruct { definition: String },
    #[error("repeated overload of {function:?}")]
    RepeatedOverload { function: String },
    #[error("repeated function signature of {function:?} for struct {struct_index}")]
    RepeatedSignature {
        function: String,
        struct_index: usize,
    },
    #[error("definition {definition:?} already declared")]
    RepeatedDefinition { definition: String },
    #[error("signature of {function:?} not covered by every struct (missing struct {struct_index})")]
    SignatureNotCovered {
        function: String,
        struct_index: usize,
    },
    #[error("instance outputs of {function:?} do not match: expected {expected:?}, received {received:?}")]
    InstanceOutputMismatch {
        function: String,
        expected: String,
        received: String,
    },
    #[error("module {route:?} used as a type")]
    ModuleAsType { route: String },
    #[error("function {route:?} used as a type")]
    FunctionAsType { route: String },
    #[error("invalid array of {type_:?}")]
    InvalidArray { type_: String },
    #[error("cannot infer the output of recursive function {function:?}")]
    RecursiveInference { function: String },

    #[error("circular dependency on {route:?}")]
    CircularDependency { route: String },
    #[error("module {descriptor:?} not found: {reason}")]
    ModuleNotFound { descriptor: String, reason: String },

    #[error("function {function:?} used before it was registered")]
    FunctionNotRegistered { function: String },
    #[error("function {function:?} is not a pure call target and cannot be exported")]
    NotPureExport { function: String },
    #[error("function {function:?} is not a pure call target and cannot enter a call table")]
    NotPureTableEntry { function: String },
    #[error("unknown builtin {builtin:?}")]
    UnknownBuiltin { builtin: String },
    #[error("unhandled expression {kind}")]
    UnhandledExpression { kind: String },
}
