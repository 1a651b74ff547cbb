//! Constraint grammar.

use smol_str::SmolStr;

use super::{ParseResult, TokenKind, TokenStream, parse_hex, reference_from_token};
use crate::model::{Constraint, Limit, MathOperator, Resolution};

/// Parse constraint cell text. Text outside the grammar becomes
/// [`Constraint::Generic`] carrying the trimmed input.
pub fn parse_constraint(text: &str) -> Constraint {
    let text = text.trim();
    let mut stream = TokenStream::new(text);
    let parsed = constraint(&mut stream).and_then(|c| {
        if stream.at_end() {
            Ok(c)
        } else {
            Err(stream.error("expected `,` or end of constraint"))
        }
    });
    match parsed {
        Ok(constraint) => constraint,
        Err(error) => {
            tracing::trace!(text, %error, "constraint kept as generic text");
            Constraint::Generic(text.to_string())
        }
    }
}

fn constraint(p: &mut TokenStream<'_>) -> ParseResult<Constraint> {
    let mut items = vec![item(p)?];
    while p.eat(TokenKind::Comma) {
        items.push(item(p)?);
    }
    Ok(if items.len() == 1 {
        items.remove(0)
    } else {
        Constraint::Set(items)
    })
}

fn item(p: &mut TokenStream<'_>) -> ParseResult<Constraint> {
    let head = if p.at(TokenKind::LBracket) {
        Constraint::All
    } else if p.at_keyword("all") {
        p.bump();
        Constraint::All
    } else if p.at_keyword("desc") {
        p.bump();
        Constraint::Described
    } else {
        bounded(p)?
    };

    if p.eat(TokenKind::LBracket) {
        let entry = constraint(p)?;
        p.expect(TokenKind::RBracket)?;
        return Ok(Constraint::List {
            constraint: Box::new(head),
            entry: Box::new(entry),
        });
    }
    Ok(head)
}

fn at_min_max_call(p: &TokenStream<'_>) -> bool {
    p.peek_nth(1).is_some_and(|t| t.kind == TokenKind::LParen)
}

fn bounded(p: &mut TokenStream<'_>) -> ParseResult<Constraint> {
    if p.at_keyword("min") && !at_min_max_call(p) {
        p.bump();
        return Ok(Constraint::Min(limit(p)?));
    }
    if p.at_keyword("max") && !at_min_max_call(p) {
        p.bump();
        return Ok(Constraint::Max(limit(p)?));
    }
    let min = limit(p)?;
    if p.at_keyword("to") || p.at(TokenKind::DotDot) {
        p.bump();
        let max = limit(p)?;
        return Ok(Constraint::Range { min, max });
    }
    Ok(Constraint::Exact(min))
}

// ============================================================================
// LIMITS
// ============================================================================

fn limit(p: &mut TokenStream<'_>) -> ParseResult<Limit> {
    let mut left = term(p)?;
    loop {
        let op = if p.at(TokenKind::Plus) {
            MathOperator::Add
        } else if p.at(TokenKind::Minus) {
            MathOperator::Subtract
        } else {
            return Ok(left);
        };
        p.bump();
        let right = term(p)?;
        left = Limit::Math {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
}

fn term(p: &mut TokenStream<'_>) -> ParseResult<Limit> {
    let mut left = sized_atom(p)?;
    loop {
        let op = if p.at(TokenKind::Star) {
            MathOperator::Multiply
        } else if p.at(TokenKind::Slash) {
            MathOperator::Divide
        } else {
            return Ok(left);
        };
        p.bump();
        let right = sized_atom(p)?;
        left = Limit::Math {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
}

/// An atom with an optional `{codepoints}` suffix.
fn sized_atom(p: &mut TokenStream<'_>) -> ParseResult<Limit> {
    let bytes = atom(p)?;
    if p.eat(TokenKind::LBrace) {
        let codepoints = atom(p)?;
        p.expect(TokenKind::RBrace)?;
        return Ok(Limit::Character {
            bytes: Box::new(bytes),
            codepoints: Box::new(codepoints),
        });
    }
    Ok(bytes)
}

fn atom(p: &mut TokenStream<'_>) -> ParseResult<Limit> {
    if p.eat(TokenKind::Minus) {
        return match atom(p)? {
            Limit::Int(v) => Ok(Limit::Int(-v)),
            Limit::Percent { hundredths } => Ok(Limit::Percent {
                hundredths: -hundredths,
            }),
            Limit::Temperature { hundredths } => Ok(Limit::Temperature {
                hundredths: -hundredths,
            }),
            _ => Err(p.error("`-` applies only to numbers")),
        };
    }
    if p.eat(TokenKind::LParen) {
        let inner = limit(p)?;
        p.expect(TokenKind::RParen)?;
        return Ok(inner);
    }

    let Some(token) = p.bump() else {
        return Err(p.error("expected limit"));
    };
    match token.kind {
        TokenKind::Integer => number(p, token.text),
        TokenKind::Hex => {
            let (value, width) = parse_hex(token.text).ok_or_else(|| p.error("invalid hex"))?;
            Ok(Limit::Hex { value, width })
        }
        TokenKind::Reference => Ok(Limit::Reference {
            reference: reference_from_token(token.text),
            field: p.field_path()?,
            resolution: Resolution::Unresolved,
        }),
        TokenKind::Ident => match token.text {
            "true" => Ok(Limit::Bool(true)),
            "false" => Ok(Limit::Bool(false)),
            "null" => Ok(Limit::Null),
            "min" | "max" if p.at(TokenKind::LParen) => {
                p.bump();
                let mut limits = vec![limit(p)?];
                while p.eat(TokenKind::Comma) {
                    limits.push(limit(p)?);
                }
                p.expect(TokenKind::RParen)?;
                Ok(if token.text == "min" {
                    Limit::MinOf(limits)
                } else {
                    Limit::MaxOf(limits)
                })
            }
            "to" | "all" | "desc" | "min" | "max" => Err(p.error("keyword used as limit")),
            id => Ok(Limit::Identifier {
                id: SmolStr::from(id),
                field: p.field_path()?,
                resolution: Resolution::Unresolved,
            }),
        },
        _ => Err(p.error("expected limit")),
    }
}

/// Integer, possibly with a fraction and a `%` or `°C` unit.
fn number(p: &mut TokenStream<'_>, whole: &str) -> ParseResult<Limit> {
    let whole: i64 = whole.parse().map_err(|_| p.error("integer out of range"))?;

    let fraction = if p.at(TokenKind::Dot)
        && p.peek_nth(1).is_some_and(|t| t.kind == TokenKind::Integer)
    {
        p.bump();
        let digits = p.expect(TokenKind::Integer)?.text;
        let hundredths = match digits.len() {
            1 => digits.parse::<i64>().map(|d| d * 10),
            2 => digits.parse::<i64>(),
            _ => return Err(p.error("at most two decimal places")),
        };
        Some(hundredths.map_err(|_| p.error("invalid fraction"))?)
    } else {
        None
    };
    let unit = if p.eat(TokenKind::Percent) {
        Some(TokenKind::Percent)
    } else if p.eat(TokenKind::Celsius) {
        Some(TokenKind::Celsius)
    } else {
        None
    };
    if let Some(unit) = unit {
        let hundredths = whole
            .checked_mul(100)
            .and_then(|h| h.checked_add(fraction.unwrap_or(0)))
            .ok_or_else(|| p.error("number out of range"))?;
        return Ok(match unit {
            TokenKind::Percent => Limit::Percent { hundredths },
            _ => Limit::Temperature { hundredths },
        });
    }
    match fraction {
        None => Ok(Limit::Int(whole)),
        Some(_) => Err(p.error("decimal number needs a unit")),
    }
}
