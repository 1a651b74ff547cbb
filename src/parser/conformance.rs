//! Conformance grammar.

use smol_str::SmolStr;

use super::{ParseResult, TokenKind, TokenStream, parse_hex, reference_from_token};
use crate::model::{
    Choice, ChoiceLimit, ComparisonExpression, ComparisonOperator, ComparisonValue, Conformance,
    ConformanceItem, EqualityExpression, Expression, IdentifierExpression, LogicalExpression,
    LogicalOperator, ReferenceExpression, Resolution,
};

/// Parse conformance cell text. Text outside the grammar becomes a single
/// generic item carrying the trimmed input.
pub fn parse_conformance(text: &str) -> Conformance {
    let text = text.trim();
    if text.is_empty() {
        return Conformance::default();
    }
    let mut stream = TokenStream::new(text);
    match conformance_set(&mut stream) {
        Ok(conformance) => conformance,
        Err(error) => {
            tracing::trace!(text, %error, "conformance kept as generic text");
            Conformance::generic(text)
        }
    }
}

fn conformance_set(p: &mut TokenStream<'_>) -> ParseResult<Conformance> {
    let mut items = vec![item(p)?];
    while p.eat(TokenKind::Comma) {
        items.push(item(p)?);
    }
    if !p.at_end() {
        return Err(p.error("expected `,` or end of conformance"));
    }
    Ok(Conformance(items))
}

/// True when the token after the current one ends an item.
fn keyword_stands_alone(p: &TokenStream<'_>) -> bool {
    p.peek_nth(1).is_none_or(|t| t.kind == TokenKind::Comma)
}

fn item(p: &mut TokenStream<'_>) -> ParseResult<ConformanceItem> {
    let simple = [
        ("M", ConformanceItem::Mandatory { condition: None }),
        ("X", ConformanceItem::Disallowed),
        ("P", ConformanceItem::Provisional),
        ("D", ConformanceItem::Deprecated),
        ("desc", ConformanceItem::Described),
    ];
    for (keyword, item) in simple {
        if p.at_keyword(keyword) && keyword_stands_alone(p) {
            p.bump();
            return Ok(item);
        }
    }

    if p.at_keyword("O")
        && p.peek_nth(1)
            .is_none_or(|t| matches!(t.kind, TokenKind::Comma | TokenKind::Dot))
    {
        p.bump();
        let choice = choice(p)?;
        return Ok(ConformanceItem::Optional {
            condition: None,
            choice,
        });
    }

    if p.eat(TokenKind::LBracket) {
        let condition = expression(p)?;
        p.expect(TokenKind::RBracket)?;
        let choice = choice(p)?;
        return Ok(ConformanceItem::Optional {
            condition: Some(condition),
            choice,
        });
    }

    Ok(ConformanceItem::Mandatory {
        condition: Some(expression(p)?),
    })
}

/// `.a`, `.a+`, `.a2`, `.a2+`, `.a2-`
fn choice(p: &mut TokenStream<'_>) -> ParseResult<Option<Choice>> {
    if !p.eat(TokenKind::Dot) {
        return Ok(None);
    }
    let name = p.expect(TokenKind::Ident)?;
    let split = name
        .text
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(name.text.len());
    let (set, digits) = name.text.split_at(split);
    if set.is_empty() {
        return Err(p.error("choice set must start with a letter"));
    }
    let count = if digits.is_empty() {
        1
    } else {
        digits
            .parse::<u32>()
            .map_err(|_| p.error("invalid choice count"))?
    };
    let limit = if p.eat(TokenKind::Plus) {
        ChoiceLimit::AtLeast(count)
    } else if p.eat(TokenKind::Minus) {
        ChoiceLimit::AtMost(count)
    } else {
        ChoiceLimit::Exactly(count)
    };
    Ok(Some(Choice {
        set: SmolStr::from(set),
        limit,
    }))
}

// ============================================================================
// CONDITIONS
// ============================================================================

fn expression(p: &mut TokenStream<'_>) -> ParseResult<Expression> {
    logical(p, LogicalOperator::Xor)
}

fn at_operator(p: &TokenStream<'_>, op: LogicalOperator) -> bool {
    match op {
        LogicalOperator::Xor => p.at(TokenKind::Caret),
        LogicalOperator::Or => p.at(TokenKind::Pipe) || p.at_keyword("OR"),
        LogicalOperator::And => p.at(TokenKind::Amp) || p.at_keyword("AND"),
    }
}

/// One precedence level; operands of the same operator are collected into a
/// single logical node.
fn logical(p: &mut TokenStream<'_>, op: LogicalOperator) -> ParseResult<Expression> {
    let next = |p: &mut TokenStream<'_>| match op {
        LogicalOperator::Xor => logical(p, LogicalOperator::Or),
        LogicalOperator::Or => logical(p, LogicalOperator::And),
        LogicalOperator::And => comparison(p),
    };

    let first = next(p)?;
    if !at_operator(p, op) {
        return Ok(first);
    }
    let mut operands = vec![first];
    while at_operator(p, op) {
        p.bump();
        operands.push(next(p)?);
    }
    Ok(Expression::Logical(LogicalExpression {
        op,
        not: false,
        operands,
    }))
}

fn comparison(p: &mut TokenStream<'_>) -> ParseResult<Expression> {
    let left = unary(p)?;
    let kind = match p.peek() {
        Some(t) => t.kind,
        None => return Ok(left),
    };
    let op = match kind {
        TokenKind::EqEq | TokenKind::BangEq => None,
        TokenKind::Lt => Some(ComparisonOperator::LessThan),
        TokenKind::LtEq => Some(ComparisonOperator::LessThanOrEqual),
        TokenKind::Gt => Some(ComparisonOperator::GreaterThan),
        TokenKind::GtEq => Some(ComparisonOperator::GreaterThanOrEqual),
        _ => return Ok(left),
    };
    let left = into_value(left).ok_or_else(|| p.error("comparison needs a named operand"))?;
    p.bump();
    let right = value(p)?;
    Ok(match op {
        None => Expression::Equality(EqualityExpression {
            not_equal: kind == TokenKind::BangEq,
            left,
            right,
        }),
        Some(op) => Expression::Comparison(ComparisonExpression { op, left, right }),
    })
}

fn into_value(expr: Expression) -> Option<ComparisonValue> {
    match expr {
        Expression::Identifier(e) if !e.not => Some(ComparisonValue::Identifier {
            id: e.id,
            field: e.field,
            resolution: e.resolution,
        }),
        Expression::Reference(e) if !e.not => Some(ComparisonValue::Reference {
            reference: e.reference,
            field: e.field,
            resolution: e.resolution,
        }),
        _ => None,
    }
}

fn unary(p: &mut TokenStream<'_>) -> ParseResult<Expression> {
    if p.eat(TokenKind::Bang) {
        return Ok(unary(p)?.negate());
    }
    if p.eat(TokenKind::LParen) {
        let inner = expression(p)?;
        p.expect(TokenKind::RParen)?;
        return Ok(inner);
    }
    if p.at(TokenKind::Reference) {
        let token = p.expect(TokenKind::Reference)?;
        let field = p.field_path()?;
        return Ok(Expression::Reference(ReferenceExpression {
            reference: reference_from_token(token.text),
            field,
            not: false,
            resolution: Resolution::Unresolved,
        }));
    }
    if p.at(TokenKind::Ident) && !p.at_keyword("AND") && !p.at_keyword("OR") {
        let token = p.expect(TokenKind::Ident)?;
        let field = p.field_path()?;
        return Ok(Expression::Identifier(IdentifierExpression {
            id: SmolStr::from(token.text),
            field,
            not: false,
            resolution: Resolution::Unresolved,
        }));
    }
    Err(p.error("expected condition"))
}

fn value(p: &mut TokenStream<'_>) -> ParseResult<ComparisonValue> {
    let negative = p.eat(TokenKind::Minus);
    let Some(token) = p.bump() else {
        return Err(p.error("expected value"));
    };
    let value = match token.kind {
        TokenKind::Integer => {
            let v: i64 = token
                .text
                .parse()
                .map_err(|_| p.error("integer out of range"))?;
            return Ok(ComparisonValue::Int(if negative { -v } else { v }));
        }
        _ if negative => return Err(p.error("expected integer after `-`")),
        TokenKind::Hex => {
            let (value, width) = parse_hex(token.text).ok_or_else(|| p.error("invalid hex"))?;
            ComparisonValue::Hex { value, width }
        }
        TokenKind::Ident if token.text == "true" => ComparisonValue::Bool(true),
        TokenKind::Ident if token.text == "false" => ComparisonValue::Bool(false),
        TokenKind::Ident if token.text == "null" => ComparisonValue::Null,
        TokenKind::Ident => ComparisonValue::Identifier {
            id: SmolStr::from(token.text),
            field: p.field_path()?,
            resolution: Resolution::Unresolved,
        },
        TokenKind::Reference => ComparisonValue::Reference {
            reference: reference_from_token(token.text),
            field: p.field_path()?,
            resolution: Resolution::Unresolved,
        },
        _ => return Err(p.error("expected value")),
    };
    Ok(value)
}
