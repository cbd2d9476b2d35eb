//! Unit tests for the binary emitter.

use std::rc::Rc;

use wasmparser::{Parser, Payload, Validator};
use wasmtime::{Engine, Module};

use crate::{
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
    model::{
        func::{FuncBody, FuncId},
        module::Route,
        types::{Arity, Native, Type},
    },
    modules::{
        kernel::kernel_definitions,
        provider::MemoryProvider,
        resolver::{Program, Session},
    },
    options::CompileOptions,
    parser::parser::parse,
    type_checker::typed_ast::TypedExprKind,
};

use super::{
    compiler::emit,
    injector::inject,
    layout::{wire_type, Signature, WireType},
};

fn program(source: &str) -> (Program, Vec<(String, FuncId)>) {
    let tokens = tokenize(source.to_string(), Some("main".to_string())).unwrap();
    let (_, tree) = parse(tokens, Rc::new("main".to_string()));
    let tree = tree.unwrap();

    let mut session = Session::new(CompileOptions::default());
    let module = session
        .resolve_module(
            Route::Virtual("main".to_string()),
            &tree,
            &MemoryProvider::new(),
        )
        .unwrap();
    let roots = session.export_roots(module).unwrap();
    (session.into_program().unwrap(), roots)
}

fn compile(source: &str) -> Result<Vec<u8>, Error> {
    let (program, roots) = program(source);
    emit(&program, &roots, &CompileOptions::default())
}

#[derive(Debug, Default)]
struct Summary {
    exports: Vec<String>,
    imports: Vec<(String, String)>,
    tables: u32,
    elements: u32,
    bodies: u32,
}

fn summarize(binary: &[u8]) -> Summary {
    Validator::new().validate_all(binary).unwrap();

    let engine = Engine::default();
    let module = Module::new(&engine, binary).unwrap();
    let mut summary = Summary {
        exports: module.exports().map(|export| export.name().to_string()).collect(),
        imports: module
            .imports()
            .map(|import| (import.module().to_string(), import.name().to_string()))
            .collect(),
        ..Summary::default()
    };

    for payload in Parser::new(0).parse_all(binary) {
        match payload.unwrap() {
            Payload::TableSection(reader) => summary.tables = reader.count(),
            Payload::ElementSection(reader) => summary.elements = reader.count(),
            Payload::CodeSectionStart { count, .. } => summary.bodies = count,
            _ => {}
        }
    }
    summary
}

#[test]
fn test_every_kernel_builtin_is_injectable() {
    for definition in kernel_definitions("kernel") {
        for function in definition.functions {
            if let FuncBody::Builtin(name) = &function.body {
                assert!(inject(name).is_some(), "{}.{}", definition.name, name);
            }
        }
    }
}

#[test]
fn test_wire_types() {
    assert_eq!(wire_type(&Type::native(Native::I32)), Some(WireType::I32));
    assert_eq!(wire_type(&Type::native(Native::I64)), Some(WireType::I64));
    assert_eq!(wire_type(&Type::native(Native::F32)), Some(WireType::F32));
    assert_eq!(wire_type(&Type::native(Native::F64)), Some(WireType::F64));
    assert_eq!(wire_type(&Type::native(Native::Bool)), Some(WireType::I32));
    assert_eq!(wire_type(&Type::native(Native::String)), Some(WireType::I32));
    assert_eq!(
        wire_type(&Type::native(Native::F64).with_array(Arity::Fixed(2))),
        Some(WireType::I32)
    );
    assert_eq!(wire_type(&Type::void()), None);

    let signature = Signature::new(&[Type::native(Native::I64)], &Type::void());
    assert_eq!(signature.params, vec![WireType::I64]);
    assert!(signature.results.is_empty());
}

#[test]
fn test_simple_module() {
    let binary = compile("def Test f(i32 a, i32 b) a + b; end").unwrap();
    let summary = summarize(&binary);

    assert_eq!(summary.exports, vec!["f0"]);
    assert_eq!(
        summary.imports,
        vec![
            ("kernel".to_string(), "memory".to_string()),
            ("kernel".to_string(), "alloc".to_string()),
        ]
    );
    assert_eq!(summary.bodies, 1);
    assert_eq!(summary.tables, 0);
}

#[test]
fn test_unreachable_functions_are_not_emitted() {
    let binary = compile(
        "def Main f() 1; end
        def Helper g() 2; end",
    )
    .unwrap();

    // Helper is not exported and never called
    assert_eq!(summarize(&binary).bodies, 1);
}

#[test]
fn test_shared_callee_emitted_once() {
    let binary = compile("def Main f() g() + g(); h() g(); g() 1; end").unwrap();
    let summary = summarize(&binary);

    assert_eq!(summary.exports, vec!["f0", "h0", "g0"]);
    assert_eq!(summary.bodies, 3);
}

#[test]
fn test_composites_validate() {
    let binary = compile(
        "def Main
            text() \"hello, world\";
            list() at([1.5, 2.5, 3.5], 2);
            pair() at((1l, \"a\", true), 0);
            nested() ((1, 2), [3, 4]);
        end",
    )
    .unwrap();

    assert_eq!(summarize(&binary).bodies, 4);
}

#[test]
fn test_locals_and_branches_validate() {
    let binary = compile(
        "def Main
            f(i32 n) (a = n * 2; b = if a > 10 then a else 10 end; b - 1);
            g(i32 n) (if n == 0 then (x = 1l; .) else (y = 2l; .) end; n);
            h() (1; \"dropped\"; 2.5f);
        end",
    )
    .unwrap();

    assert_eq!(summarize(&binary).exports, vec!["f0", "g0", "h0"]);
}

#[test]
fn test_host_imports_are_deduplicated() {
    let binary = compile(
        "def Main
            f() (echo(1); echo(2); echo(\"x\"); .);
        end",
    )
    .unwrap();
    let summary = summarize(&binary);

    let hosts: Vec<&str> = summary
        .imports
        .iter()
        .map(|(_, name)| name.as_str())
        .collect();
    assert_eq!(hosts, vec!["memory", "alloc", "echo_i32", "echo_str"]);
}

#[test]
fn test_instance_groups_build_call_table() {
    let binary = compile(
        "def Main f() area(Shape(2)) + area(Shape(2, 3)); end
        def Shape
            struct i32;
            struct i32, i32;
            [i32 r] area() r * r * 3;
            [i32 w, i32 h] area() w * h;
        end",
    )
    .unwrap();
    let summary = summarize(&binary);

    assert_eq!(summary.tables, 1);
    assert_eq!(summary.elements, 1);
    assert_eq!(summary.bodies, 3);
}

#[test]
fn test_builtin_cannot_be_exported() {
    let (program, _) = program("def Main f() 1; end");
    let kernel = program
        .modules
        .iter()
        .find(|module| module.route == Route::Kernel)
        .unwrap();
    let arith = program.definition(kernel.definition("Arith").unwrap());
    let add = arith.functions["+"][0].func;

    let error = emit(
        &program,
        &[(String::from("add"), add)],
        &CompileOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(error.get_impl(), ErrorImpl::NotPureExport { .. }));
}

#[test]
fn test_unknown_builtin() {
    let (mut program, roots) = program("def Main f() 1 + 2; end");

    let FuncBody::Expr(body) = &program.func(roots[0].1).body else {
        panic!("expected an expression body");
    };
    let TypedExprKind::Call { func, .. } = body.kind else {
        panic!("expected a call");
    };
    program.funcs[func.0].body = FuncBody::Builtin(String::from("i32.bogus"));

    let error = emit(&program, &roots, &CompileOptions::default()).unwrap_err();
    assert_eq!(error.get_error_name(), "UnknownBuiltin");
}

#[test]
fn test_memory_options() {
    let (program, roots) = program("def Main f() 1; end");
    let options = CompileOptions {
        import_module: String::from("env"),
        memory_pages: 2,
        max_memory_pages: Some(16),
        ..CompileOptions::default()
    };

    let binary = emit(&program, &roots, &options).unwrap();
    let summary = summarize(&binary);
    assert_eq!(summary.imports[0], ("env".to_string(), "memory".to_string()));
    assert_eq!(summary.imports[1], ("env".to_string(), "alloc".to_string()));
}
