//! Integration tests for end-to-end compilation.
//!
//! These tests verify that the complete pipeline works from source text
//! through tokenization, parsing, module resolution, generation and
//! emission, then validate and run the emitted binaries against a small
//! host.

use std::{fs, path::PathBuf};

use duckc::{
    compile_file, compile_source,
    errors::errors::{Error, ErrorCategory},
    model::module::Route,
    modules::provider::MemoryProvider,
    options::CompileOptions,
};
use wasmparser::Validator;
use wasmtime::{Caller, Engine, Instance, Linker, Memory, MemoryType, Module, Store};

/// Host state: a bump allocator and everything echoed.
struct Host {
    heap: i32,
    output: Vec<String>,
}

struct Runtime {
    store: Store<Host>,
    instance: Instance,
}

fn read_string(memory: &Memory, caller: &Caller<'_, Host>, pointer: i32) -> String {
    let data = memory.data(caller);
    let start = pointer as usize;
    let len = u32::from_le_bytes([data[start], data[start + 1], data[start + 2], data[start + 3]]);
    let bytes = &data[start + 4..start + 4 + len as usize];
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn instantiate(binary: &[u8]) -> Runtime {
    Validator::new().validate_all(binary).unwrap();

    let engine = Engine::default();
    let module = Module::new(&engine, binary).unwrap();
    let mut store = Store::new(
        &engine,
        Host {
            heap: 8,
            output: vec![],
        },
    );
    let memory = Memory::new(&mut store, MemoryType::new(1, None)).unwrap();

    let mut linker = Linker::new(&engine);
    linker.define(&store, "kernel", "memory", memory).unwrap();
    linker
        .func_wrap(
            "kernel",
            "alloc",
            |mut caller: Caller<'_, Host>, size: i32| -> i32 {
                let pointer = caller.data().heap;
                caller.data_mut().heap += (size + 7) & !7;
                pointer
            },
        )
        .unwrap();
    linker
        .func_wrap("kernel", "free", |_: Caller<'_, Host>, _: i32| {})
        .unwrap();
    linker
        .func_wrap(
            "kernel",
            "decode",
            move |caller: Caller<'_, Host>, pointer: i32| -> i32 {
                read_string(&memory, &caller, pointer).parse().unwrap_or(0)
            },
        )
        .unwrap();
    linker
        .func_wrap(
            "kernel",
            "echo_str",
            move |mut caller: Caller<'_, Host>, pointer: i32| {
                let text = read_string(&memory, &caller, pointer);
                caller.data_mut().output.push(text);
            },
        )
        .unwrap();
    linker
        .func_wrap("kernel", "echo_i32", |mut caller: Caller<'_, Host>, value: i32| {
            caller.data_mut().output.push(value.to_string());
        })
        .unwrap();
    linker
        .func_wrap("kernel", "echo_i64", |mut caller: Caller<'_, Host>, value: i64| {
            caller.data_mut().output.push(value.to_string());
        })
        .unwrap();
    linker
        .func_wrap("kernel", "echo_f64", |mut caller: Caller<'_, Host>, value: f64| {
            caller.data_mut().output.push(value.to_string());
        })
        .unwrap();
    linker
        .func_wrap("kernel", "echo_bool", |mut caller: Caller<'_, Host>, value: i32| {
            caller.data_mut().output.push((value != 0).to_string());
        })
        .unwrap();

    let instance = linker.instantiate(&mut store, &module).unwrap();
    Runtime { store, instance }
}

fn compile_with(provider: &MemoryProvider, source: &str) -> Result<Vec<u8>, Error> {
    compile_source(
        Route::Virtual(String::from("main")),
        source,
        provider,
        &CompileOptions::default(),
    )
}

fn compile(source: &str) -> Result<Vec<u8>, Error> {
    compile_with(&MemoryProvider::new(), source)
}

fn run(source: &str) -> Runtime {
    instantiate(&compile(source).unwrap())
}

fn call_i32(runtime: &mut Runtime, name: &str, args: (i32,)) -> i32 {
    runtime
        .instance
        .get_typed_func::<(i32,), i32>(&mut runtime.store, name)
        .unwrap()
        .call(&mut runtime.store, args)
        .unwrap()
}

fn call_unit_i32(runtime: &mut Runtime, name: &str) -> i32 {
    runtime
        .instance
        .get_typed_func::<(), i32>(&mut runtime.store, name)
        .unwrap()
        .call(&mut runtime.store, ())
        .unwrap()
}

fn error_name(result: Result<Vec<u8>, Error>) -> String {
    match result {
        Ok(_) => String::from("<ok>"),
        Err(error) => error.get_error_name().to_string(),
    }
}

#[test]
fn test_sum() {
    let mut runtime = run("def Test f(i32 a, i32 b) a + b; end");

    let f0 = runtime
        .instance
        .get_typed_func::<(i32, i32), i32>(&mut runtime.store, "f0")
        .unwrap();
    assert_eq!(f0.call(&mut runtime.store, (2, 3)).unwrap(), 5);
    assert_eq!(f0.call(&mut runtime.store, (-7, 3)).unwrap(), -4);
}

#[test]
fn test_overloads_are_numbered() {
    let mut runtime = run("def Test
        f(i32 a) a * 2;
        f(i64 a) a * 3l;
    end");

    assert_eq!(call_i32(&mut runtime, "f0", (21,)), 42);

    let f1 = runtime
        .instance
        .get_typed_func::<(i64,), i64>(&mut runtime.store, "f1")
        .unwrap();
    assert_eq!(f1.call(&mut runtime.store, (5,)).unwrap(), 15);
}

#[test]
fn test_locals_and_branches() {
    let mut runtime = run("def Test
        f(i32 n) (a = n * 2; b = a + 1; b);
        clamp(i32 n) if n > 10 then 10 else if n < 0 then 0 else n end end;
    end");

    assert_eq!(call_i32(&mut runtime, "f0", (4,)), 9);
    assert_eq!(call_i32(&mut runtime, "clamp0", (42,)), 10);
    assert_eq!(call_i32(&mut runtime, "clamp0", (-3,)), 0);
    assert_eq!(call_i32(&mut runtime, "clamp0", (7,)), 7);
}

#[test]
fn test_recursion() {
    let mut runtime =
        run("def Test fact(i64 n) -> i64 if n <= 1l then 1l else n * fact(n - 1l) end; end");

    let fact = runtime
        .instance
        .get_typed_func::<(i64,), i64>(&mut runtime.store, "fact0")
        .unwrap();
    assert_eq!(fact.call(&mut runtime.store, (10,)).unwrap(), 3628800);
}

#[test]
fn test_floats_and_conversions() {
    let mut runtime = run("def Test
        half(f64 x) x / 2.0;
        widen(i32 x) to_f64(x) + 0.5;
        trunc(f32 x) to_i32(x);
    end");

    let half = runtime
        .instance
        .get_typed_func::<(f64,), f64>(&mut runtime.store, "half0")
        .unwrap();
    assert_eq!(half.call(&mut runtime.store, (5.0,)).unwrap(), 2.5);

    let widen = runtime
        .instance
        .get_typed_func::<(i32,), f64>(&mut runtime.store, "widen0")
        .unwrap();
    assert_eq!(widen.call(&mut runtime.store, (2,)).unwrap(), 2.5);

    let trunc = runtime
        .instance
        .get_typed_func::<(f32,), i32>(&mut runtime.store, "trunc0")
        .unwrap();
    assert_eq!(trunc.call(&mut runtime.store, (7.9,)).unwrap(), 7);
}

#[test]
fn test_composite_access() {
    let mut runtime = run("def Test
        list() at([10, 20, 30], 1);
        wide() at([1l, 2l, 3l], 2);
        tuple() at((1l, 7, true), 1);
        nested() at(at(((1, 2), (3, 4)), 1), 0);
    end");

    assert_eq!(call_unit_i32(&mut runtime, "list0"), 20);
    assert_eq!(call_unit_i32(&mut runtime, "tuple0"), 7);
    assert_eq!(call_unit_i32(&mut runtime, "nested0"), 3);

    let wide = runtime
        .instance
        .get_typed_func::<(), i64>(&mut runtime.store, "wide0")
        .unwrap();
    assert_eq!(wide.call(&mut runtime.store, ()).unwrap(), 3);
}

#[test]
fn test_instanced_dispatch() {
    let mut runtime = run("def Main
            f() area(Shape(2)) + area(Shape(2, 3));
            g(i32 k) area(if k > 0 then Shape(k) else Shape(k, 2) end);
        end
        def Shape
            struct i32;
            struct i32, i32;
            [i32 r] area() r * r * 3;
            [i32 w, i32 h] area() w * h;
        end");

    assert_eq!(call_unit_i32(&mut runtime, "f0"), 18);
    assert_eq!(call_i32(&mut runtime, "g0", (3,)), 27);
    assert_eq!(call_i32(&mut runtime, "g0", (-1,)), -2);
}

#[test]
fn test_instance_arguments() {
    let mut runtime = run("def Main f(i32 k) scale(Vec(k, 2), 10); end
        def Vec
            struct i32, i32;
            struct i32;
            [i32 x, i32 y] scale(i32 by) (x + y) * by;
            [i32 x] scale(i32 by) x * by;
        end");

    assert_eq!(call_i32(&mut runtime, "f0", (1,)), 30);
}

#[test]
fn test_strings_and_echo() {
    let mut runtime = run("def Main
        f() (echo(\"hello, world\"); echo(len(\"abcde\")); echo(3l); echo(true); .);
        g() decode(\"41\") + 1;
    end");

    runtime
        .instance
        .get_typed_func::<(), ()>(&mut runtime.store, "f0")
        .unwrap()
        .call(&mut runtime.store, ())
        .unwrap();
    assert_eq!(
        runtime.store.data().output,
        vec!["hello, world", "5", "3", "true"]
    );

    assert_eq!(call_unit_i32(&mut runtime, "g0"), 42);
}

#[test]
fn test_imported_modules() {
    let provider = MemoryProvider::new()
        .with("geometry", "def Shape double(i32 x) x * 2; end export Shape;")
        .with("base", "def Base one() 1; end export Base;")
        .with("mid", "export * from \"base\"; def Mid end");

    let binary = compile_with(
        &provider,
        "import geo from \"geometry\";
         import * from \"mid\";
         def Main f(i32 x) geo.double(x) + one(); end",
    )
    .unwrap();
    let mut runtime = instantiate(&binary);

    assert_eq!(call_i32(&mut runtime, "f0", (20,)), 41);
}

#[test]
fn test_build_through_named_import() {
    let provider = MemoryProvider::new().with(
        "shapes",
        "def Shape
            struct i32;
            struct i64, i32;
            [i32 r] area() r * 3;
            [i64 w, i32 h] area() h;
        end",
    );

    let binary = compile_with(
        &provider,
        "import L from \"shapes\";
         def Main f(i32 n) L.area(L.Shape(9l, n)) + L.area(L.Shape(n)); end",
    )
    .unwrap();
    let mut runtime = instantiate(&binary);

    assert_eq!(call_i32(&mut runtime, "f0", (4,)), 16);
}

#[test]
fn test_exported_definitions_are_prefixed() {
    let mut runtime = run("def Main f() 1; end
        def Util twice(i32 x) x * 2; end
        export Util;");

    assert_eq!(call_unit_i32(&mut runtime, "f0"), 1);
    assert_eq!(call_i32(&mut runtime, "Util_twice0", (4,)), 8);
}

#[test]
fn test_struct_coverage() {
    let covered = compile(
        "def Main f() describe(P(1)); end
        def P
            struct i32;
            struct i32, i32;
            [i32 a] describe() a;
            [i32 a, i32 b] describe() a + b;
        end",
    );
    assert!(covered.is_ok());

    let not_covered = compile(
        "def Main f() describe(P(1)); end
        def P
            struct i32;
            struct i32, i32;
            [i32 a] describe() a;
        end",
    );
    assert_eq!(error_name(not_covered), "SignatureNotCovered");
}

#[test]
fn test_void_instance_group_coverage() {
    assert!(compile("def T struct string; struct i32; [i32] f() .; [string] f() .; end").is_ok());
    assert_eq!(
        error_name(compile("def T struct string; struct i32; [i32] f() .; end")),
        "SignatureNotCovered"
    );
}

#[test]
fn test_array_length() {
    let mut runtime = run("def Test f() len([4, 5, 6]) + len([1.5, 2.5]); end");

    assert_eq!(call_unit_i32(&mut runtime, "f0"), 5);
}

#[test]
fn test_resolution_errors() {
    assert_eq!(
        error_name(compile("def P struct i32; struct i32; end")),
        "RepeatedStruct"
    );
    assert_eq!(
        error_name(compile("def T f() if true then 1 else \"x\" end; end")),
        "BranchMismatch"
    );
    assert_eq!(
        error_name(compile("def T f() missing(1); end")),
        "SymbolNotFound"
    );
}

#[test]
fn test_dependency_errors() {
    let error = compile("import * from \"nowhere\"; def Main end").unwrap_err();
    assert_eq!(error.get_error_name(), "ModuleNotFound");
    assert!(matches!(error.category(), ErrorCategory::Dependency));

    let provider = MemoryProvider::new()
        .with("a", "import * from \"b\"; def A end")
        .with("b", "import * from \"a\"; def B end");
    assert_eq!(
        error_name(compile_with(&provider, "import * from \"a\"; def Main end")),
        "CircularDependency"
    );
}

#[test]
fn test_syntax_errors_are_line_tagged() {
    let error = compile("def Main\n  f() 1;\n  g( 2;\nend").unwrap_err();

    assert!(matches!(error.category(), ErrorCategory::Syntax));
    assert_eq!(error.get_position().0, 3);
}

#[test]
fn test_compile_file_resolves_relative_imports() {
    let dir = std::env::temp_dir().join(format!("duckc_integration_{}", std::process::id()));
    fs::create_dir_all(dir.join("lib")).unwrap();
    fs::write(
        dir.join("lib").join("math.duck"),
        "def Math square(i32 x) x * x; end export Math;",
    )
    .unwrap();
    let main: PathBuf = dir.join("main.duck");
    fs::write(
        &main,
        "import m from \"lib/math.duck\"; def Main f(i32 x) m.square(x) + 1; end",
    )
    .unwrap();

    let binary = compile_file(&main, &CompileOptions::default()).unwrap();
    let mut runtime = instantiate(&binary);
    assert_eq!(call_i32(&mut runtime, "f0", (6,)), 37);

    let missing = compile_file(&dir.join("absent.duck"), &CompileOptions::default());
    assert_eq!(error_name(missing), "ModuleNotFound");

    fs::remove_dir_all(&dir).unwrap();
}
