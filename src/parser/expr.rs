use crate::{
    ast::expressions::{Expr, ExprKind, Literal},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let Some(nud_fn) = parser.get_nud_lookup().get(&token_kind).copied() else {
        return Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: parser.current_token().value.clone(),
            },
            parser.get_position(),
        ));
    };

    let mut left = nud_fn(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let token_bp = *parser
            .get_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);

        if token_bp <= bp {
            break;
        }

        let Some(led_fn) = parser.get_led_lookup().get(&token_kind).copied() else {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: parser.current_token().value.clone(),
                },
                left.get_span().start.clone(),
            ));
        };

        left = led_fn(parser, left, token_bp)?;
    }

    Ok(left)
}

fn parse_number(value: &str) -> Option<Literal> {
    if let Some(digits) = value.strip_suffix('l') {
        return digits.parse().ok().map(Literal::I64);
    }
    if let Some(digits) = value.strip_suffix('f') {
        return digits.parse().ok().map(Literal::F32);
    }
    if value.contains('.') {
        return value.parse().ok().map(Literal::F64);
    }
    value.parse().ok().map(Literal::I32)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.current_token().clone();

    let kind = match token.kind {
        TokenKind::Number => match parse_number(&token.value) {
            Some(literal) => ExprKind::Literal(literal),
            None => {
                return Err(Error::new(
                    ErrorImpl::NumberParseError { token: token.value },
                    token.span.start,
                ))
            }
        },
        TokenKind::Identifier => ExprKind::Symbol(token.value.clone()),
        TokenKind::String => ExprKind::Literal(Literal::String(token.value.clone())),
        TokenKind::True => ExprKind::Literal(Literal::Bool(true)),
        TokenKind::False => ExprKind::Literal(Literal::Bool(false)),
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken { token: token.value },
                token.span.start,
            ))
        }
    };

    parser.advance();
    Ok(Expr::new(kind, token.span))
}

pub fn parse_void_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let span = parser.advance().span.clone();
    Ok(Expr::new(ExprKind::Void, span))
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();

    let right = parse_expr(parser, bp)?;

    let span = Span {
        start: left.span.start.clone(),
        end: right.span.end.clone(),
    };

    Ok(Expr::new(
        ExprKind::Binary {
            operator: operator_token.value,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    ))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let operand = parse_expr(parser, BindingPower::Unary)?;

    let span = Span {
        start: operator_token.span.start,
        end: operand.span.end.clone(),
    };

    Ok(Expr::new(
        ExprKind::Prefix {
            operator: operator_token.value,
            operand: Box::new(operand),
        },
        span,
    ))
}

pub fn parse_assignment_expr(
    parser: &mut Parser,
    left: Expr,
    bp: BindingPower,
) -> Result<Expr, Error> {
    let ExprKind::Symbol(assignee) = left.kind else {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: String::from("="),
                message: String::from("only plain names can be assigned"),
            },
            left.span.start,
        ));
    };

    parser.advance();
    let value = parse_expr(parser, bp)?;

    let span = Span {
        start: left.span.start,
        end: value.span.end.clone(),
    };

    Ok(Expr::new(
        ExprKind::Assignment {
            assignee,
            value: Box::new(value),
        },
        span,
    ))
}

/// Parses `(e)`, the group `(e1; e2)` and the tuple `(e1, e2)`.
pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.advance().span.start.clone();

    if parser.current_token_kind() == TokenKind::CloseParen {
        parser.advance();
        return Ok(Expr::new(
            ExprKind::Group(vec![]),
            Span {
                start,
                end: parser.previous_end(),
            },
        ));
    }

    let first = parse_expr(parser, BindingPower::Default)?;

    let kind = match parser.current_token_kind() {
        TokenKind::Semicolon => {
            let mut expressions = vec![first];
            while parser.current_token_kind() == TokenKind::Semicolon {
                parser.advance();
                // Trailing semicolon before `)`
                if parser.current_token_kind() == TokenKind::CloseParen {
                    break;
                }
                expressions.push(parse_expr(parser, BindingPower::Default)?);
            }
            ExprKind::Group(expressions)
        }
        TokenKind::Comma => {
            let mut fields = vec![first];
            while parser.current_token_kind() == TokenKind::Comma {
                parser.advance();
                if parser.current_token_kind() == TokenKind::CloseParen {
                    break;
                }
                fields.push(parse_expr(parser, BindingPower::Default)?);
            }
            ExprKind::Tuple(fields)
        }
        _ => {
            parser.expect_detailed(TokenKind::CloseParen, "expected `)` after expression")?;
            return Ok(first);
        }
    };

    parser.expect_detailed(TokenKind::CloseParen, "expected `)` to close the group")?;

    Ok(Expr::new(
        kind,
        Span {
            start,
            end: parser.previous_end(),
        },
    ))
}

pub fn parse_list_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.advance().span.start.clone();
    let elements = parse_arguments(parser, TokenKind::CloseBracket)?;

    Ok(Expr::new(
        ExprKind::List(elements),
        Span {
            start,
            end: parser.previous_end(),
        },
    ))
}

/// `if condition then value [else value] end`
pub fn parse_if_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect_detailed(TokenKind::Then, "expected `then` after the condition")?;
    let then = parse_expr(parser, BindingPower::Default)?;

    let otherwise = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        Some(Box::new(parse_expr(parser, BindingPower::Default)?))
    } else {
        None
    };

    parser.expect_detailed(TokenKind::End, "expected `end` to close the if")?;

    Ok(Expr::new(
        ExprKind::If {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise,
        },
        Span {
            start,
            end: parser.previous_end(),
        },
    ))
}

/// Parses comma separated expressions up to and including `close`.
fn parse_arguments(parser: &mut Parser, close: TokenKind) -> Result<Vec<Expr>, Error> {
    let mut arguments = vec![];

    while parser.current_token_kind() != close {
        arguments.push(parse_expr(parser, BindingPower::Default)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != close {
            return Err(parser.unexpected("expected `,` between elements"));
        }
    }

    parser.expect(close)?;
    Ok(arguments)
}

pub fn parse_call_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();

    let arguments = parse_arguments(parser, TokenKind::CloseParen)?;

    let span = Span {
        start: left.span.start.clone(),
        end: parser.previous_end(),
    };

    Ok(Expr::new(
        ExprKind::Call {
            callee: Box::new(left),
            arguments,
        },
        span,
    ))
}

pub fn parse_index_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();
    let index = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;

    let span = Span {
        start: left.span.start.clone(),
        end: parser.previous_end(),
    };

    Ok(Expr::new(
        ExprKind::Index {
            object: Box::new(left),
            index: Box::new(index),
        },
        span,
    ))
}

pub fn parse_member_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();
    let property = parser
        .expect_detailed(TokenKind::Identifier, "expected a name after `.`")?
        .value;

    let span = Span {
        start: left.span.start.clone(),
        end: parser.previous_end(),
    };

    Ok(Expr::new(
        ExprKind::Member {
            object: Box::new(left),
            property,
        },
        span,
    ))
}

pub fn parse_struct_init_expr(parser: &mut Parser) -> Result<Expr, Error> {
    // new Test { field1: 1, field2: 2 }
    let start = parser.advance().span.start.clone();

    let name = parser.expect(TokenKind::Identifier)?.value;

    parser.expect(TokenKind::OpenCurly)?;

    let mut fields = vec![];

    while parser.current_token_kind() != TokenKind::CloseCurly {
        let field_name = parser.expect(TokenKind::Identifier)?.value;
        parser.expect(TokenKind::Colon)?;
        let field_value = parse_expr(parser, BindingPower::Default)?;

        fields.push((field_name, field_value));

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        }
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Expr::new(
        ExprKind::StructInit { name, fields },
        Span {
            start,
            end: parser.previous_end(),
        },
    ))
}
