//! Unit tests for the type and definition model.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    ast::types::{ArraySize, TypeExpr},
    errors::errors::ErrorImpl,
    model::{
        definition::Definition,
        func::{Completion, FuncArena, FuncBody, FuncHeader, FuncId},
        module::{Module, ModuleId, Route, Symbol, SymbolTable},
        scope::Scope,
        types::{Arity, DefId, Native, Type, TypeKind},
    },
    Position,
};

fn position() -> Position {
    Position(1, Rc::new("test.duck".to_string()))
}

fn i32_() -> Type {
    Type::native(Native::I32)
}

fn string_() -> Type {
    Type::native(Native::String)
}

fn definition(id: usize, name: &str) -> Definition {
    Definition::new(DefId(id), name, Route::Virtual("test".to_string()), position())
}

fn symbol(route: &[&str]) -> TypeExpr {
    TypeExpr::Symbol {
        route: route.iter().map(|segment| segment.to_string()).collect(),
        position: position(),
    }
}

fn sample_types() -> Vec<Type> {
    vec![
        i32_(),
        string_(),
        Type::native(Native::F64),
        Type::void(),
        Type::def(DefId(0), "A"),
        Type::def(DefId(1), "B"),
        Type::tuple(vec![i32_(), string_()]),
        Type::tuple(vec![string_(), i32_()]),
        i32_().with_array(Arity::Auto),
        i32_().with_array(Arity::Fixed(3)),
        Type::new(TypeKind::Extern("handle".to_string())),
    ]
}

#[test]
fn test_is_equals_reflexive() {
    for ty in sample_types() {
        assert!(ty.is_equals(&ty), "{} is not equal to itself", ty);
    }
}

#[test]
fn test_is_equals_symmetric() {
    let types = sample_types();
    for a in &types {
        for b in &types {
            assert_eq!(a.is_equals(b), b.is_equals(a), "{} and {}", a, b);
        }
    }
}

#[test]
fn test_definition_identity() {
    // Same name, different definitions
    let a = Type::def(DefId(0), "Point");
    let b = Type::def(DefId(1), "Point");

    assert!(!a.is_equals(&b));
    assert!(a.is_equals(&Type::def(DefId(0), "Renamed")));
}

#[test]
fn test_array_arity_must_match() {
    let auto = i32_().with_array(Arity::Auto);
    let fixed = i32_().with_array(Arity::Fixed(3));

    assert!(!auto.is_equals(&fixed));
    assert!(!i32_().is_equals(&fixed));
    assert!(auto.accepts(&fixed));
    assert!(!fixed.accepts(&auto));
}

#[test]
fn test_any_equals_everything() {
    for ty in sample_types() {
        assert!(Type::any().is_equals(&ty));
        assert!(Type::any().with_array(Arity::Auto).accepts(&ty.clone().with_array(Arity::Fixed(2))));
    }
}

#[test]
fn test_type_display() {
    assert_eq!(i32_().with_array(Arity::Fixed(4)).to_string(), "i32[4]");
    assert_eq!(Type::tuple(vec![i32_(), string_()]).to_string(), "(i32, string)");
    assert_eq!(string_().with_array(Arity::Auto).to_string(), "string[]");
}

#[test]
fn test_width() {
    assert_eq!(Type::native(Native::I64).width(), 8);
    assert_eq!(Type::native(Native::F64).width(), 8);
    assert_eq!(Type::native(Native::F32).width(), 4);
    assert_eq!(string_().width(), 4);
    assert_eq!(Type::native(Native::I64).with_array(Arity::Auto).width(), 4);
}

#[test]
fn test_repeated_struct() {
    let mut def = definition(0, "T");

    assert_eq!(def.add_struct(vec![i32_()], &position()).unwrap(), 0);
    assert_eq!(def.add_struct(vec![string_()], &position()).unwrap(), 1);

    let error = def.add_struct(vec![i32_()], &position()).unwrap_err();
    assert!(matches!(error.get_impl(), ErrorImpl::RepeatedStruct { .. }));
}

#[test]
fn test_infer_struct() {
    let mut def = definition(0, "T");
    def.add_struct(vec![i32_(), string_()], &position()).unwrap();
    def.add_struct(vec![i32_(), i32_()], &position()).unwrap();
    def.add_struct(vec![string_()], &position()).unwrap();

    assert_eq!(def.infer_struct(&[None], &position()).unwrap(), 2);
    assert_eq!(
        def.infer_struct(&[None, Some(string_())], &position()).unwrap(),
        0
    );

    let ambiguous = def.infer_struct(&[Some(i32_()), None], &position()).unwrap_err();
    assert!(matches!(
        ambiguous.get_impl(),
        ErrorImpl::StructAmbiguity { candidates: 2, .. }
    ));

    let mismatch = def.infer_struct(&[Some(i32_())], &position()).unwrap_err();
    assert!(matches!(mismatch.get_impl(), ErrorImpl::StructMismatch { .. }));
}

#[test]
fn test_repeated_overload() {
    let mut def = definition(0, "T");

    assert_eq!(def.add_function("f", vec![i32_()], FuncId(0), &position()).unwrap(), 0);
    assert_eq!(def.add_function("f", vec![string_()], FuncId(1), &position()).unwrap(), 1);

    let error = def
        .add_function("f", vec![i32_()], FuncId(2), &position())
        .unwrap_err();
    assert!(matches!(error.get_impl(), ErrorImpl::RepeatedOverload { .. }));
}

#[test]
fn test_instance_groups_and_coverage() {
    let mut def = definition(0, "T");
    def.add_struct(vec![string_()], &position()).unwrap();
    def.add_struct(vec![i32_()], &position()).unwrap();

    let first = def.add_instance("f", vec![], 1, FuncId(0), &position()).unwrap();
    let error = def.covered_members(first.index).unwrap_err();
    assert!(matches!(
        error.get_impl(),
        ErrorImpl::SignatureNotCovered { struct_index: 0, .. }
    ));

    let second = def.add_instance("f", vec![], 0, FuncId(1), &position()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        def.covered_members(first.index).unwrap(),
        vec![FuncId(1), FuncId(0)]
    );

    let repeated = def
        .add_instance("f", vec![], 0, FuncId(2), &position())
        .unwrap_err();
    assert!(matches!(repeated.get_impl(), ErrorImpl::RepeatedSignature { .. }));

    // A different signature opens a new group
    let other = def
        .add_instance("f", vec![i32_()], 0, FuncId(3), &position())
        .unwrap();
    assert_ne!(first, other);
    assert_eq!(def.instance_groups("f", 1).count(), 1);
}

#[test]
fn test_symbol_table_last_write_wins() {
    let mut symbols = SymbolTable::new();
    symbols.insert("A", Symbol::Definition(DefId(0)));
    symbols.insert("B", Symbol::Definition(DefId(1)));
    symbols.insert("m", Symbol::Module(ModuleId(0)));
    symbols.insert("A", Symbol::Definition(DefId(2)));

    assert_eq!(symbols.len(), 3);
    assert_eq!(symbols.get("A"), Some(Symbol::Definition(DefId(2))));
    assert_eq!(
        symbols.definitions().collect::<Vec<_>>(),
        vec![DefId(2), DefId(1)]
    );
}

#[test]
fn test_func_arena_two_phase() {
    let mut funcs = FuncArena::new();
    let header = FuncHeader {
        name: "f".to_string(),
        owner: DefId(0),
        inputs: vec![i32_()],
        param_names: vec!["a".to_string()],
        prefix: None,
        declared_output: None,
        position: position(),
    };

    let id = funcs.insert_ready(
        header,
        Completion {
            output: i32_(),
            locals: vec![],
            body: FuncBody::Builtin("nop".to_string()),
            dependencies: vec![],
        },
    );

    assert!(funcs.is_ready(id));
    assert!(funcs.take_pending(id).is_none());
    assert_eq!(funcs.output(id), Some(i32_()));

    let sealed = funcs.seal().unwrap();
    assert_eq!(sealed.len(), 1);
    assert!(!sealed[0].is_expr());
}

fn scope_fixture() -> (SymbolTable, Vec<Module>, Vec<Definition>) {
    let definitions = vec![definition(0, "Point"), definition(1, "Shape")];

    let mut module_defs = IndexMap::new();
    module_defs.insert("Shape".to_string(), DefId(1));
    let modules = vec![Module {
        route: Route::Virtual("geometry".to_string()),
        definitions: module_defs,
        exports: vec![],
        symbols: SymbolTable::new(),
    }];

    let mut symbols = SymbolTable::new();
    symbols.insert("Point", Symbol::Definition(DefId(0)));
    symbols.insert("geometry", Symbol::Module(ModuleId(0)));

    (symbols, modules, definitions)
}

#[test]
fn test_resolve_type_routes() {
    let (symbols, modules, definitions) = scope_fixture();
    let scope = Scope::new(&symbols, &modules, &definitions);

    assert_eq!(scope.resolve_type(&symbol(&["i32"])).unwrap(), i32_());
    assert_eq!(scope.resolve_type(&symbol(&["any"])).unwrap(), Type::any());
    assert!(scope
        .resolve_type(&symbol(&["Point"]))
        .unwrap()
        .is_equals(&Type::def(DefId(0), "Point")));
    assert!(scope
        .resolve_type(&symbol(&["geometry", "Shape"]))
        .unwrap()
        .is_equals(&Type::def(DefId(1), "Shape")));
}

#[test]
fn test_resolve_type_errors() {
    let (symbols, modules, definitions) = scope_fixture();
    let scope = Scope::new(&symbols, &modules, &definitions);

    let cases = [
        (symbol(&["Missing"]), "SymbolNotFound"),
        (symbol(&["geometry"]), "ModuleAsType"),
        (symbol(&["Point", "f"]), "FunctionAsType"),
        (symbol(&["geometry", "Shape", "area"]), "FunctionAsType"),
        (symbol(&["geometry", "Missing"]), "SymbolNotFound"),
        (
            TypeExpr::Array {
                underlying: Box::new(symbol(&["void"])),
                size: ArraySize::Auto,
                position: position(),
            },
            "InvalidArray",
        ),
        (
            TypeExpr::Array {
                underlying: Box::new(TypeExpr::Array {
                    underlying: Box::new(symbol(&["i32"])),
                    size: ArraySize::Auto,
                    position: position(),
                }),
                size: ArraySize::Fixed(2),
                position: position(),
            },
            "InvalidArray",
        ),
        (
            TypeExpr::Tuple {
                fields: vec![symbol(&["i32"]), symbol(&["void"])],
                position: position(),
            },
            "TypeMatchError",
        ),
        (
            TypeExpr::Function {
                parameters: vec![],
                output: None,
                position: position(),
            },
            "Unsupported",
        ),
    ];

    for (type_expr, expected) in cases {
        let error = scope.resolve_type(&type_expr).unwrap_err();
        assert_eq!(error.get_error_name(), expected, "resolving {}", type_expr);
    }
}
