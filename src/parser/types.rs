//! Type parsing implementation.
//!
//! This module handles parsing of type annotations and type expressions.
//! It supports:
//!
//! - Dotted symbol routes (`i32`, `Point`, `geometry.Point`)
//! - Array types (`i32[]`, `i32[4]`)
//! - Tuple types (`(i32, string)`)
//! - External types (`extern Handle`)
//! - Function types (`fn(i32) -> i32`), which are rejected during resolution
//!
//! Similar to expression parsing, it uses NUD/LED handlers with
//! binding powers for parsing complex type expressions.

use std::collections::HashMap;

use crate::{
    ast::types::{ArraySize, TypeExpr},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{lookups::BindingPower, parser::Parser};

/// Type alias for type null denotation handler functions.
pub type TypeNUDHandler = fn(&mut Parser) -> Result<TypeExpr, Error>;

/// Type alias for type left denotation handler functions.
pub type TypeLEDHandler = fn(&mut Parser, TypeExpr, BindingPower) -> Result<TypeExpr, Error>;

/// Type alias for type NUD lookup table.
pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;

/// Type alias for type LED lookup table.
pub type TypeLEDLookup = HashMap<TokenKind, TypeLEDHandler>;

/// Type alias for type binding power lookup table.
pub type TypeBPLookup = HashMap<TokenKind, BindingPower>;

/// Initializes the type parsing lookup tables.
///
/// Registers NUD and LED handlers for parsing type expressions.
///
/// # Arguments
///
/// * `parser` - Mutable reference to the parser to initialize
pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Identifier, parse_symbol_type);
    parser.type_nud(TokenKind::OpenParen, parse_tuple_type);
    parser.type_nud(TokenKind::Extern, parse_extern_type);
    parser.type_nud(TokenKind::Fn, parse_function_type);
    parser.type_led(TokenKind::OpenBracket, BindingPower::Call, parse_array_type);
}

pub fn parse_symbol_type(parser: &mut Parser) -> Result<TypeExpr, Error> {
    let token = parser.expect(TokenKind::Identifier)?;
    let mut route = vec![token.value];

    // A `.` not followed by a name starts a void expression, not a route
    while parser.current_token_kind() == TokenKind::Dot
        && parser.peek_kind(1) == TokenKind::Identifier
    {
        parser.advance();
        route.push(parser.advance().value.clone());
    }

    Ok(TypeExpr::Symbol {
        route,
        position: token.span.start,
    })
}

pub fn parse_tuple_type(parser: &mut Parser) -> Result<TypeExpr, Error> {
    let position = parser.advance().span.start.clone();
    let mut fields = vec![parse_type(parser, BindingPower::Default)?];

    while parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        fields.push(parse_type(parser, BindingPower::Default)?);
    }

    parser.expect_detailed(TokenKind::CloseParen, "expected `)` to close the tuple type")?;

    if fields.len() == 1 {
        return Ok(fields.remove(0));
    }

    Ok(TypeExpr::Tuple { fields, position })
}

pub fn parse_extern_type(parser: &mut Parser) -> Result<TypeExpr, Error> {
    let position = parser.advance().span.start.clone();
    let name = parser
        .expect_detailed(TokenKind::Identifier, "expected a name after `extern`")?
        .value;

    Ok(TypeExpr::Extern { name, position })
}

pub fn parse_function_type(parser: &mut Parser) -> Result<TypeExpr, Error> {
    let position = parser.advance().span.start.clone();
    parser.expect(TokenKind::OpenParen)?;

    let mut parameters = vec![];
    while parser.current_token_kind() != TokenKind::CloseParen {
        parameters.push(parse_type(parser, BindingPower::Default)?);
        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        }
    }
    parser.expect(TokenKind::CloseParen)?;

    let output = if parser.current_token_kind() == TokenKind::Arrow {
        parser.advance();
        Some(Box::new(parse_type(parser, BindingPower::Default)?))
    } else {
        None
    };

    Ok(TypeExpr::Function {
        parameters,
        output,
        position,
    })
}

pub fn parse_array_type(
    parser: &mut Parser,
    left: TypeExpr,
    _bp: BindingPower,
) -> Result<TypeExpr, Error> {
    let position = parser.expect(TokenKind::OpenBracket)?.span.start;

    let size = if parser.current_token_kind() == TokenKind::Number {
        let token = parser.advance().clone();
        match token.value.parse::<u32>() {
            Ok(size) if size > 0 => ArraySize::Fixed(size),
            _ => {
                return Err(Error::new(
                    ErrorImpl::NumberParseError { token: token.value },
                    token.span.start,
                ))
            }
        }
    } else {
        ArraySize::Auto
    };

    parser.expect(TokenKind::CloseBracket)?;

    Ok(TypeExpr::Array {
        underlying: Box::new(left),
        size,
        position,
    })
}

/// Whether the tokens ahead form an array suffix (`[]` or `[n]`) rather
/// than the start of a list expression.
fn array_suffix_follows(parser: &Parser) -> bool {
    parser.current_token_kind() == TokenKind::OpenBracket
        && (parser.peek_kind(1) == TokenKind::CloseBracket
            || (parser.peek_kind(1) == TokenKind::Number
                && parser.peek_kind(2) == TokenKind::CloseBracket))
}

pub fn parse_type(parser: &mut Parser, bp: BindingPower) -> Result<TypeExpr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let Some(nud_fn) = parser.get_type_nud_lookup().get(&token_kind).copied() else {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected a type"),
            },
            parser.get_position(),
        ));
    };

    let mut left = nud_fn(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let token_bp = *parser
            .get_type_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);

        if token_bp <= bp || (token_kind == TokenKind::OpenBracket && !array_suffix_follows(parser))
        {
            break;
        }

        let Some(led_fn) = parser.get_type_led_lookup().get(&token_kind).copied() else {
            break;
        };

        left = led_fn(parser, left, token_bp)?;
    }

    Ok(left)
}
