//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Imports and exports
//! - Definitions, structs and functions
//! - Expressions and operator precedence
//! - Types
//! - Error cases

use std::rc::Rc;

use super::parser::parse;
use crate::{
    ast::{
        ast::{Item, SourceModule},
        expressions::{Expr, ExprKind, Literal},
        statements::{FnDeclStmt, ImportMode},
        types::{ArraySize, TypeExpr},
    },
    errors::errors::Error,
    lexer::lexer::tokenize,
};

fn parse_source(source: &str) -> Result<SourceModule, Error> {
    let tokens = tokenize(source.to_string(), Some("test.duck".to_string())).unwrap();
    let (_, result) = parse(tokens, Rc::new("test.duck".to_string()));
    result
}

fn only_function(source: &str) -> FnDeclStmt {
    let module = parse_source(source).unwrap();
    let def = module.definitions().next().unwrap();
    def.functions[0].clone()
}

fn body_of(expression: &str) -> Expr {
    only_function(&format!("def T f() {}; end", expression)).body
}

#[test]
fn test_parse_empty_module() {
    let module = parse_source("").unwrap();
    assert!(module.items.is_empty());
}

#[test]
fn test_parse_simple_definition() {
    let module = parse_source("def Test f(i32 a, i32 b) a + b; end").unwrap();
    let def = module.definitions().next().unwrap();

    assert_eq!(def.name, "Test");
    assert_eq!(def.functions.len(), 1);

    let function = &def.functions[0];
    assert_eq!(function.name, "f");
    assert!(!function.is_instance());
    assert_eq!(function.parameters.len(), 2);
    assert_eq!(function.parameters[1].name, "b");
    assert!(function.output.is_none());
    assert!(matches!(
        &function.body.kind,
        ExprKind::Binary { operator, .. } if operator == "+"
    ));
}

#[test]
fn test_parse_structs_and_instance_functions() {
    let source = "def T struct string; struct i32; [i32] f() .; [string s] f() .; end";
    let module = parse_source(source).unwrap();
    let def = module.definitions().next().unwrap();

    assert_eq!(def.structs.len(), 2);
    assert_eq!(def.structs[0].fields.len(), 1);
    assert_eq!(def.functions.len(), 2);

    let prefix = def.functions[1].prefix.as_ref().unwrap();
    assert_eq!(prefix.len(), 1);
    assert_eq!(prefix[0].name.as_deref(), Some("s"));
    assert!(matches!(def.functions[0].body.kind, ExprKind::Void));
}

#[test]
fn test_parse_placeholder_prefix() {
    let function = only_function("def T [?, i32 b, ? c] g() b; end");
    let prefix = function.prefix.unwrap();

    assert_eq!(prefix.len(), 3);
    assert!(prefix[0].field_type.is_none());
    assert!(prefix[0].name.is_none());
    assert!(prefix[1].field_type.is_some());
    assert_eq!(prefix[2].name.as_deref(), Some("c"));
}

#[test]
fn test_parse_empty_struct_and_prefix() {
    let module = parse_source("def Unit struct; [] describe() 1; end").unwrap();
    let def = module.definitions().next().unwrap();

    assert!(def.structs[0].fields.is_empty());
    assert!(def.functions[0].prefix.as_ref().unwrap().is_empty());
}

#[test]
fn test_parse_operator_function_name() {
    let function = only_function("def V struct i32; [i32 x] +(i32 y) x + y; end");
    assert_eq!(function.name, "+");
}

#[test]
fn test_parse_imports() {
    let source = r#"
        import math from "math.duck";
        import * from "shapes.duck";
        export * from "colors.duck";
        export Point, Line;
    "#;
    let module = parse_source(source).unwrap();
    let imports: Vec<_> = module.imports().collect();

    assert_eq!(imports.len(), 3);
    assert_eq!(imports[0].mode, ImportMode::Named("math".to_string()));
    assert_eq!(imports[0].descriptor, "math.duck");
    assert_eq!(imports[1].mode, ImportMode::Flatten);
    assert_eq!(imports[2].mode, ImportMode::ExportMerge);

    let exports: Vec<_> = module.exports().collect();
    assert_eq!(exports[0].names.len(), 2);
    assert_eq!(exports[0].names[1].0, "Line");
}

#[test]
fn test_parse_output_types() {
    let function = only_function("def T f(i32[] xs, (i32, string) pair) -> i32[4] [1, 2, 3, 4]; end");

    assert!(matches!(
        &function.parameters[0].param_type,
        TypeExpr::Array { size: ArraySize::Auto, .. }
    ));
    assert!(matches!(
        &function.parameters[1].param_type,
        TypeExpr::Tuple { fields, .. } if fields.len() == 2
    ));
    assert!(matches!(
        function.output,
        Some(TypeExpr::Array { size: ArraySize::Fixed(4), .. })
    ));
    assert!(matches!(&function.body.kind, ExprKind::List(elements) if elements.len() == 4));
}

#[test]
fn test_parse_void_output_before_void_body() {
    let function = only_function("def T f() -> void .; end");

    assert!(matches!(
        &function.output,
        Some(TypeExpr::Symbol { route, .. }) if route == &vec!["void".to_string()]
    ));
    assert!(matches!(function.body.kind, ExprKind::Void));
}

#[test]
fn test_parse_dotted_type() {
    let function = only_function("def T f(geometry.Point p) p; end");

    assert!(matches!(
        &function.parameters[0].param_type,
        TypeExpr::Symbol { route, .. } if route.len() == 2
    ));
}

#[test]
fn test_parse_literals() {
    assert!(matches!(body_of("42").kind, ExprKind::Literal(Literal::I32(42))));
    assert!(matches!(body_of("42l").kind, ExprKind::Literal(Literal::I64(42))));
    assert!(matches!(body_of("1.5").kind, ExprKind::Literal(Literal::F64(_))));
    assert!(matches!(body_of("1.5f").kind, ExprKind::Literal(Literal::F32(_))));
    assert!(matches!(body_of("true").kind, ExprKind::Literal(Literal::Bool(true))));
    assert!(matches!(
        body_of("\"hi\"").kind,
        ExprKind::Literal(Literal::String(ref value)) if value == "hi"
    ));
}

#[test]
fn test_parse_number_overflow() {
    let error = parse_source("def T f() 99999999999; end").unwrap_err();
    assert_eq!(error.get_error_name(), "NumberParseError");
}

#[test]
fn test_parse_precedence() {
    let body = body_of("1 + 2 * 3");

    let ExprKind::Binary { operator, right, .. } = body.kind else {
        panic!("expected binary expression");
    };
    assert_eq!(operator, "+");
    assert!(matches!(right.kind, ExprKind::Binary { ref operator, .. } if operator == "*"));
}

#[test]
fn test_parse_left_associativity() {
    let body = body_of("10 - 3 - 2");

    let ExprKind::Binary { left, .. } = body.kind else {
        panic!("expected binary expression");
    };
    assert!(matches!(left.kind, ExprKind::Binary { ref operator, .. } if operator == "-"));
}

#[test]
fn test_parse_prefix_binds_tighter() {
    let body = body_of("-a + b");

    let ExprKind::Binary { left, .. } = body.kind else {
        panic!("expected binary expression");
    };
    assert!(matches!(left.kind, ExprKind::Prefix { ref operator, .. } if operator == "-"));
}

#[test]
fn test_parse_group_tuple_and_parens() {
    assert!(matches!(body_of("(x = 1; x + 1)").kind, ExprKind::Group(ref items) if items.len() == 2));
    assert!(matches!(body_of("(1, \"a\")").kind, ExprKind::Tuple(ref items) if items.len() == 2));
    assert!(matches!(body_of("(1 + 2)").kind, ExprKind::Binary { .. }));
    assert!(matches!(body_of("()").kind, ExprKind::Group(ref items) if items.is_empty()));
}

#[test]
fn test_parse_if_expression() {
    let body = body_of("if a < b then a else b end");
    assert!(matches!(body.kind, ExprKind::If { otherwise: Some(_), .. }));

    let body = body_of("if a then echo(a) end");
    assert!(matches!(body.kind, ExprKind::If { otherwise: None, .. }));
}

#[test]
fn test_parse_calls_and_members() {
    let body = body_of("math.add(1, 2)");

    let ExprKind::Call { callee, arguments } = body.kind else {
        panic!("expected call");
    };
    assert_eq!(arguments.len(), 2);
    assert_eq!(
        callee.as_route(),
        Some(vec!["math".to_string(), "add".to_string()])
    );
}

#[test]
fn test_parse_unsupported_forms_still_parse() {
    assert!(matches!(body_of("xs[0]").kind, ExprKind::Index { .. }));
    assert!(matches!(body_of("p.x").kind, ExprKind::Member { .. }));
    assert!(matches!(body_of("new P { x: 1 }").kind, ExprKind::StructInit { .. }));
    assert!(matches!(body_of("f(1)(2)").kind, ExprKind::Call { .. }));
}

#[test]
fn test_parse_assignment_requires_name() {
    let error = parse_source("def T f() (1 = 2); end").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_parse_missing_end() {
    let error = parse_source("def T f() 1;").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_parse_missing_semicolon_is_line_tagged() {
    let error = parse_source("def T\n  f() 1\n  g() 2;\nend").unwrap_err();
    assert_eq!(error.get_position().0, 3);
}

#[test]
fn test_parse_rejects_stray_tokens() {
    let error = parse_source("f() 1;").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_parse_items_keep_order() {
    let module = parse_source("import * from \"a.duck\"; def A end def B end").unwrap();
    assert!(matches!(module.items[0], Item::Import(_)));
    assert!(matches!(module.items[2], Item::Def(ref def) if def.name == "B"));
}
