#![allow(clippy::module_inception)]

use std::{fs, path::Path, rc::Rc};

use crate::{
    compiler::compiler::emit,
    errors::errors::{Error, ErrorImpl, ErrorTip},
    lexer::lexer::tokenize,
    model::module::Route,
    modules::{
        provider::{FileProvider, ModuleProvider},
        resolver::Session,
    },
    options::CompileOptions,
    parser::parser::parse,
};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod model;
pub mod modules;
pub mod options;
pub mod parser;
pub mod type_checker;

extern crate regex;

/// A line-tagged source position: `Position(line, file)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Compiles the module at `route`, fetching it and its imports through
/// `provider`, and returns the emitted binary.
///
/// # Arguments
///
/// * `route` - Route of the root module
/// * `source` - Source text of the root module
/// * `provider` - Resolves and loads imported modules
/// * `options` - Compilation options
///
/// # Returns
///
/// The binary module, or the first fatal error. No partial binary is
/// ever returned.
pub fn compile_source(
    route: Route,
    source: &str,
    provider: &dyn ModuleProvider,
    options: &CompileOptions,
) -> Result<Vec<u8>, Error> {
    let file = Rc::new(route.to_string());
    let tokens = tokenize(source.to_string(), Some(route.to_string()))?;
    let (_, tree) = parse(tokens, Rc::clone(&file));
    let tree = tree?;

    let mut session = Session::new(options.clone());
    let module = session.resolve_module(route, &tree, provider)?;
    let roots = session.export_roots(module)?;
    let program = session.into_program()?;

    emit(&program, &roots, options)
}

/// Compiles a source file from disk, resolving imports relative to it.
pub fn compile_file(path: &Path, options: &CompileOptions) -> Result<Vec<u8>, Error> {
    let read_error = |reason: String| {
        Error::new(
            ErrorImpl::ModuleNotFound {
                descriptor: path.to_string_lossy().to_string(),
                reason,
            },
            Position(0, Rc::new(path.to_string_lossy().to_string())),
        )
    };

    let canonical = fs::canonicalize(path).map_err(|error| read_error(error.to_string()))?;
    let source = fs::read_to_string(&canonical).map_err(|error| read_error(error.to_string()))?;

    compile_source(Route::File(canonical), &source, &FileProvider, options)
}

/// Returns the text of the 1-based `line` of `source`.
pub fn get_line(source: &str, line: u32) -> Option<&str> {
    source.lines().nth((line as usize).checked_sub(1)?)
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_get_line() {
        let source = "def Test\n  f() 1;\nend\n";

        assert_eq!(super::get_line(source, 1), Some("def Test"));
        assert_eq!(super::get_line(source, 2), Some("  f() 1;"));
        assert_eq!(super::get_line(source, 0), None);
        assert_eq!(super::get_line(source, 9), None);
    }
}

pub fn display_error(error: &Error, source: &str) {
    /*
        error: message
        -> final.duck
           |
        20 | f() a + "b";
           |
    */

    let position = error.get_position();
    let line_string = position.0.to_string();
    let padding = line_string.len() + 2;

    if let ErrorTip::None = error.get_tip() {
        println!("Error: {}", error.get_error_name());
    } else {
        println!("Error: {} ({})", error.get_error_name(), error.get_tip());
    }
    println!("-> {}", position.1);
    println!("{:>padding$}", "|");

    if let Some(line_text) = get_line(source, position.0) {
        println!("{} | {}", line_string, line_text.trim());
    }

    println!("{:>padding$}", "|");
}
