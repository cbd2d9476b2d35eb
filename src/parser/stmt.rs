use crate::{
    ast::{
        ast::Item,
        statements::{
            DefStmt, ExportStmt, FnDeclStmt, ImportMode, ImportStmt, Parameter, PrefixField,
            StructDeclStmt,
        },
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
    Span,
};

use super::{parser::Parser, types::parse_type};

pub fn parse_stmt(parser: &mut Parser) -> Result<Item, Error> {
    let kind = parser.current_token_kind();
    match parser.get_stmt_lookup().get(&kind).copied() {
        Some(stmt_fn) => stmt_fn(parser),
        None => Err(parser.unexpected("expected `def`, `import` or `export`")),
    }
}

/// `from "descriptor";`
fn parse_import_source(parser: &mut Parser) -> Result<String, Error> {
    parser.expect_detailed(TokenKind::From, "expected `from` in import")?;
    let descriptor = parser
        .expect_detailed(TokenKind::String, "expected a module path string")?
        .value;
    parser.expect(TokenKind::Semicolon)?;
    Ok(descriptor)
}

pub fn parse_import_stmt(parser: &mut Parser) -> Result<Item, Error> {
    let start = parser.advance().span.start.clone();

    let mode = match parser.current_token_kind() {
        TokenKind::Star => {
            parser.advance();
            ImportMode::Flatten
        }
        _ => ImportMode::Named(
            parser
                .expect_detailed(TokenKind::Identifier, "expected a module alias or `*`")?
                .value,
        ),
    };

    let descriptor = parse_import_source(parser)?;

    Ok(Item::Import(ImportStmt {
        mode,
        descriptor,
        span: Span {
            start,
            end: parser.previous_end(),
        },
    }))
}

/// `export A, B;` or the export-merge import `export * from "route";`
pub fn parse_export_stmt(parser: &mut Parser) -> Result<Item, Error> {
    let start = parser.advance().span.start.clone();

    if parser.current_token_kind() == TokenKind::Star {
        parser.advance();
        let descriptor = parse_import_source(parser)?;
        return Ok(Item::Import(ImportStmt {
            mode: ImportMode::ExportMerge,
            descriptor,
            span: Span {
                start,
                end: parser.previous_end(),
            },
        }));
    }

    let mut names = vec![];
    loop {
        let token =
            parser.expect_detailed(TokenKind::Identifier, "expected a definition name")?;
        names.push((token.value, token.span));

        if parser.current_token_kind() != TokenKind::Comma {
            break;
        }
        parser.advance();
    }

    parser.expect(TokenKind::Semicolon)?;

    Ok(Item::Export(ExportStmt {
        names,
        span: Span {
            start,
            end: parser.previous_end(),
        },
    }))
}

/// `def Name member* end`
pub fn parse_def_stmt(parser: &mut Parser) -> Result<Item, Error> {
    let start = parser.advance().span.start.clone();
    let name = parser
        .expect_detailed(TokenKind::Identifier, "expected a definition name")?
        .value;

    let mut structs = vec![];
    let mut functions = vec![];

    while parser.current_token_kind() != TokenKind::End {
        match parser.current_token_kind() {
            TokenKind::Struct => structs.push(parse_struct_decl_stmt(parser)?),
            TokenKind::EOF => return Err(parser.unexpected("expected `end` to close the definition")),
            _ => functions.push(parse_fn_decl_stmt(parser)?),
        }
    }

    parser.expect(TokenKind::End)?;

    Ok(Item::Def(DefStmt {
        name,
        structs,
        functions,
        span: Span {
            start,
            end: parser.previous_end(),
        },
    }))
}

pub fn parse_struct_decl_stmt(parser: &mut Parser) -> Result<StructDeclStmt, Error> {
    let start = parser.advance().span.start.clone();

    let mut fields = vec![];
    while parser.current_token_kind() != TokenKind::Semicolon {
        fields.push(parse_type(parser, BindingPower::Default)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::Semicolon {
            return Err(parser.unexpected("expected `,` or `;` in struct"));
        }
    }

    parser.expect(TokenKind::Semicolon)?;

    Ok(StructDeclStmt {
        fields,
        span: Span {
            start,
            end: parser.previous_end(),
        },
    })
}

/// `[i32 x, ? y]`
fn parse_struct_prefix(parser: &mut Parser) -> Result<Vec<PrefixField>, Error> {
    parser.expect(TokenKind::OpenBracket)?;

    let mut prefix = vec![];
    while parser.current_token_kind() != TokenKind::CloseBracket {
        let field_type = if parser.current_token_kind() == TokenKind::Question {
            parser.advance();
            None
        } else {
            Some(parse_type(parser, BindingPower::Default)?)
        };

        let name = if parser.current_token_kind() == TokenKind::Identifier {
            Some(parser.advance().value.clone())
        } else {
            None
        };

        prefix.push(PrefixField { field_type, name });

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseBracket {
            return Err(parser.unexpected("expected `,` or `]` in struct prefix"));
        }
    }

    parser.expect(TokenKind::CloseBracket)?;
    Ok(prefix)
}

/// `[prefix] name(type a, type b) [-> type] body;`
pub fn parse_fn_decl_stmt(parser: &mut Parser) -> Result<FnDeclStmt, Error> {
    let start = parser.get_position();

    let prefix = if parser.current_token_kind() == TokenKind::OpenBracket {
        Some(parse_struct_prefix(parser)?)
    } else {
        None
    };

    let name_kind = parser.current_token_kind();
    if name_kind != TokenKind::Identifier && !name_kind.is_operator() {
        return Err(parser.unexpected("expected a function name"));
    }
    let name = parser.advance().value.clone();

    parser.expect_detailed(TokenKind::OpenParen, "expected `(` after the function name")?;

    let mut parameters = vec![];
    while parser.current_token_kind() != TokenKind::CloseParen {
        let param_type = parse_type(parser, BindingPower::Default)?;
        let param_name = parser
            .expect_detailed(TokenKind::Identifier, "expected a parameter name")?
            .value;
        parameters.push(Parameter {
            name: param_name,
            param_type,
        });

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.unexpected("expected `,` or `)` in parameters"));
        }
    }
    parser.expect(TokenKind::CloseParen)?;

    let output = if parser.current_token_kind() == TokenKind::Arrow {
        parser.advance();
        Some(parse_type(parser, BindingPower::Default)?)
    } else {
        None
    };

    let body = parse_expr(parser, BindingPower::Default)?;
    parser.expect_detailed(TokenKind::Semicolon, "expected `;` after the function body")?;

    Ok(FnDeclStmt {
        name,
        prefix,
        parameters,
        output,
        body,
        span: Span {
            start,
            end: parser.previous_end(),
        },
    })
}
