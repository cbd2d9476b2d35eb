use std::{env, fs, path::PathBuf, process, rc::Rc, time::Instant};

use duckc::{
    compiler::compiler::emit,
    display_error,
    errors::errors::Error,
    lexer::lexer::tokenize,
    model::module::Route,
    modules::{provider::FileProvider, resolver::Session},
    options::CompileOptions,
    parser::parser::parse,
};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <file> [out.wasm]", args[0]);
        process::exit(2);
    }

    let file_path = match fs::canonicalize(&args[1]) {
        Ok(path) => path,
        Err(error) => {
            eprintln!("Failed to open {}: {}", args[1], error);
            process::exit(1);
        }
    };
    let out_path = match args.get(2) {
        Some(out) => PathBuf::from(out),
        None => file_path.with_extension("wasm"),
    };

    let file_contents = match fs::read_to_string(&file_path) {
        Ok(contents) => contents,
        Err(error) => {
            eprintln!("Failed to read {}: {}", file_path.display(), error);
            process::exit(1);
        }
    };

    match compile(file_path, &file_contents) {
        Ok(binary) => {
            if let Err(error) = fs::write(&out_path, binary) {
                eprintln!("Failed to write {}: {}", out_path.display(), error);
                process::exit(1);
            }
            println!("Wrote {}", out_path.display());
        }
        Err(error) => {
            display_error(&error, &file_contents);
            process::exit(1);
        }
    }
}

fn compile(file_path: PathBuf, file_contents: &str) -> Result<Vec<u8>, Error> {
    let start = Instant::now();
    let route = Route::File(file_path);
    let options = CompileOptions::default();

    let tokens = tokenize(file_contents.to_string(), Some(route.to_string()))?;
    println!("Tokenized in {:?}", start.elapsed());

    let parse_start = Instant::now();
    let (_, tree) = parse(tokens, Rc::new(route.to_string()));
    let tree = tree?;
    println!("Parsed in {:?}", parse_start.elapsed());

    let resolve_start = Instant::now();
    let mut session = Session::new(options.clone());
    let module = session.resolve_module(route, &tree, &FileProvider)?;
    let roots = session.export_roots(module)?;
    let program = session.into_program()?;
    println!("Resolved in {:?}", resolve_start.elapsed());

    let emit_start = Instant::now();
    let binary = emit(&program, &roots, &options)?;
    println!("Emitted in {:?}", emit_start.elapsed());
    println!("Total time: {:?}", start.elapsed());

    Ok(binary)
}
