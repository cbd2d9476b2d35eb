//! Unit tests for error handling.
//!
//! This module contains tests for error types, categories and error reporting.

use crate::errors::errors::{Error, ErrorCategory, ErrorImpl, ErrorTip};
use crate::Position;
use std::rc::Rc;

fn at_line(line: u32) -> Position {
    Position(line, Rc::new("test.duck".to_string()))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        at_line(10),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.category(), ErrorCategory::Syntax);
}

#[test]
fn test_error_position() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "identifier".to_string(),
        },
        at_line(42),
    );

    assert_eq!(error.get_position().0, 42);
    assert_eq!(error.get_position().1.as_str(), "test.duck");
}

#[test]
fn test_error_display_is_line_tagged() {
    let error = Error::new(
        ErrorImpl::SymbolNotFound {
            symbol: "foo".to_string(),
        },
        at_line(7),
    );

    assert_eq!(error.to_string(), "test.duck:7: symbol \"foo\" not found");
}

#[test]
fn test_type_mismatch_error() {
    let error = Error::new(
        ErrorImpl::TypeMatchError {
            expected: "i32".to_string(),
            received: "string".to_string(),
        },
        at_line(0),
    );

    assert_eq!(error.get_error_name(), "TypeMatchError");
    assert_eq!(error.category(), ErrorCategory::Type);
}

#[test]
fn test_branch_mismatch_error() {
    let error = Error::new(
        ErrorImpl::BranchMismatch {
            then: "i32".to_string(),
            otherwise: "string".to_string(),
        },
        at_line(3),
    );

    assert_eq!(error.get_error_name(), "BranchMismatch");
    assert_eq!(error.category(), ErrorCategory::Type);
}

#[test]
fn test_resolution_errors() {
    let errors = [
        ErrorImpl::RepeatedStruct {
            definition: "T".to_string(),
        },
        ErrorImpl::SignatureNotCovered {
            function: "f".to_string(),
            struct_index: 1,
        },
        ErrorImpl::ModuleAsType {
            route: "io".to_string(),
        },
        ErrorImpl::StructAmbiguity {
            definition: "T".to_string(),
            candidates: 2,
        },
    ];

    for error_impl in errors {
        let error = Error::new(error_impl, at_line(1));
        assert_eq!(error.category(), ErrorCategory::Resolution);
    }
}

#[test]
fn test_dependency_errors() {
    let error = Error::new(
        ErrorImpl::CircularDependency {
            route: "a.duck".to_string(),
        },
        at_line(1),
    );
    assert_eq!(error.get_error_name(), "CircularDependency");
    assert_eq!(error.category(), ErrorCategory::Dependency);

    let error = Error::new(
        ErrorImpl::ModuleNotFound {
            descriptor: "missing.duck".to_string(),
            reason: "file does not exist".to_string(),
        },
        at_line(1),
    );
    assert_eq!(error.category(), ErrorCategory::Dependency);
}

#[test]
fn test_emission_errors() {
    let error = Error::new(
        ErrorImpl::NotPureExport {
            function: "echo".to_string(),
        },
        at_line(0),
    );

    assert_eq!(error.category(), ErrorCategory::Emission);
    match error.get_tip() {
        ErrorTip::Suggestion(tip) => assert!(tip.contains("internal")),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        at_line(0),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "}".to_string(),
        },
        at_line(0),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(_) => (),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_unsupported_feature_error() {
    let error = Error::new(
        ErrorImpl::Unsupported {
            feature: "attribute access".to_string(),
        },
        at_line(0),
    );

    assert_eq!(error.get_error_name(), "Unsupported");
    assert_eq!(
        error.get_tip().to_string(),
        "attribute access is not supported by the language"
    );
}
