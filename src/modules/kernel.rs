//! The kernel module.
//!
//! The kernel supplies the native operators and host primitives every
//! module sees. It has no source: each function is bound either to a
//! builtin instruction sequence of the injector or to a host import.

use crate::model::{
    func::FuncBody,
    types::{Arity, Native, Type},
};

/// One kernel function before registration.
#[derive(Debug, Clone)]
pub struct KernelFn {
    pub name: String,
    pub inputs: Vec<Type>,
    pub output: Type,
    pub body: FuncBody,
}

/// One kernel definition and its free functions.
#[derive(Debug, Clone)]
pub struct KernelDef {
    pub name: &'static str,
    pub functions: Vec<KernelFn>,
}

const NUMERICS: [Native; 4] = [Native::I32, Native::I64, Native::F32, Native::F64];

fn is_integer(native: Native) -> bool {
    matches!(native, Native::I32 | Native::I64)
}

fn builtin(name: &str, inputs: Vec<Type>, output: Type, instruction: String) -> KernelFn {
    KernelFn {
        name: name.to_string(),
        inputs,
        output,
        body: FuncBody::Builtin(instruction),
    }
}

fn import(module: &str, name: &str, inputs: Vec<Type>, output: Type, host: &str) -> KernelFn {
    KernelFn {
        name: name.to_string(),
        inputs,
        output,
        body: FuncBody::Import {
            module: module.to_string(),
            name: host.to_string(),
        },
    }
}

fn arith() -> KernelDef {
    let mut functions = vec![];

    for native in NUMERICS {
        let ty = Type::native(native);
        let prefix = native.name();
        let signed = if is_integer(native) { "_s" } else { "" };

        for (operator, instruction) in [("+", "add"), ("-", "sub"), ("*", "mul")] {
            functions.push(builtin(
                operator,
                vec![ty.clone(), ty.clone()],
                ty.clone(),
                format!("{}.{}", prefix, instruction),
            ));
        }

        functions.push(builtin(
            "/",
            vec![ty.clone(), ty.clone()],
            ty.clone(),
            format!("{}.div{}", prefix, signed),
        ));

        if is_integer(native) {
            functions.push(builtin(
                "%",
                vec![ty.clone(), ty.clone()],
                ty.clone(),
                format!("{}.rem_s", prefix),
            ));
        }

        functions.push(builtin(
            "-",
            vec![ty.clone()],
            ty.clone(),
            format!("{}.neg", prefix),
        ));
    }

    KernelDef {
        name: "Arith",
        functions,
    }
}

fn compare() -> KernelDef {
    let mut functions = vec![];
    let bool_ = Type::native(Native::Bool);

    for native in NUMERICS {
        let ty = Type::native(native);
        let prefix = native.name();
        let signed = if is_integer(native) { "_s" } else { "" };

        for (operator, instruction, ordered) in [
            ("==", "eq", false),
            ("!=", "ne", false),
            ("<", "lt", true),
            ("<=", "le", true),
            (">", "gt", true),
            (">=", "ge", true),
        ] {
            let suffix = if ordered { signed } else { "" };
            functions.push(builtin(
                operator,
                vec![ty.clone(), ty.clone()],
                bool_.clone(),
                format!("{}.{}{}", prefix, instruction, suffix),
            ));
        }
    }

    functions.push(builtin(
        "==",
        vec![bool_.clone(), bool_.clone()],
        bool_.clone(),
        String::from("bool.eq"),
    ));
    functions.push(builtin(
        "!=",
        vec![bool_.clone(), bool_.clone()],
        bool_.clone(),
        String::from("bool.ne"),
    ));

    KernelDef {
        name: "Compare",
        functions,
    }
}

fn logic() -> KernelDef {
    let bool_ = Type::native(Native::Bool);

    KernelDef {
        name: "Logic",
        functions: vec![
            builtin(
                "&&",
                vec![bool_.clone(), bool_.clone()],
                bool_.clone(),
                String::from("bool.and"),
            ),
            builtin(
                "||",
                vec![bool_.clone(), bool_.clone()],
                bool_.clone(),
                String::from("bool.or"),
            ),
            builtin("!", vec![bool_.clone()], bool_, String::from("bool.not")),
        ],
    }
}

fn convert() -> KernelDef {
    let mut functions = vec![];

    for target in NUMERICS {
        for source in NUMERICS {
            let instruction = if source == target {
                String::from("nop")
            } else {
                format!("{}.to_{}", source.name(), target.name())
            };

            functions.push(builtin(
                &format!("to_{}", target.name()),
                vec![Type::native(source)],
                Type::native(target),
                instruction,
            ));
        }
    }

    KernelDef {
        name: "Convert",
        functions,
    }
}

fn memory(module: &str) -> KernelDef {
    let i32_ = Type::native(Native::I32);

    KernelDef {
        name: "Memory",
        functions: vec![
            import(module, "alloc", vec![i32_.clone()], i32_.clone(), "alloc"),
            import(module, "free", vec![i32_], Type::void(), "free"),
        ],
    }
}

fn text(module: &str) -> KernelDef {
    let i32_ = Type::native(Native::I32);
    let string_ = Type::native(Native::String);

    KernelDef {
        name: "Text",
        functions: vec![
            builtin("len", vec![string_.clone()], i32_.clone(), String::from("len")),
            import(module, "decode", vec![string_], i32_, "decode"),
        ],
    }
}

fn array(module: &str) -> KernelDef {
    let i32_ = Type::native(Native::I32);
    let any_array = Type::any().with_array(Arity::Auto);

    KernelDef {
        name: "Array",
        functions: vec![
            builtin("len", vec![any_array.clone()], i32_.clone(), String::from("len")),
            import(module, "ref", vec![any_array, i32_.clone()], i32_, "ref"),
        ],
    }
}

fn io(module: &str) -> KernelDef {
    let functions = [
        (Native::String, "echo_str"),
        (Native::I32, "echo_i32"),
        (Native::I64, "echo_i64"),
        (Native::F32, "echo_f32"),
        (Native::F64, "echo_f64"),
        (Native::Bool, "echo_bool"),
    ]
    .into_iter()
    .map(|(native, host)| import(module, "echo", vec![Type::native(native)], Type::void(), host))
    .collect();

    KernelDef {
        name: "Io",
        functions,
    }
}

/// Every kernel definition, with imports bound under `module`.
pub fn kernel_definitions(module: &str) -> Vec<KernelDef> {
    vec![
        arith(),
        compare(),
        logic(),
        convert(),
        memory(module),
        text(module),
        array(module),
        io(module),
    ]
}
