//! The Expression Evaluator. The newer (`vcpas`) dialect gets a small
//! Pratt-parsed arithmetic grammar (`grammar.pest`) with identifiers,
//! the four arithmetic operators, bit operators, parentheses, unary
//! minus/not, and the fixed intrinsic set `{sin, cos}`. The older
//! (`vcp-as`) dialect has no operators at all: an operand is a bare
//! identifier or an integer literal, evaluated without building a
//! parse tree.

use pest::Parser;
use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

use crate::dialect::Dialect;
use crate::errors::AssemblerError;
use crate::tables::{LabelTable, SymbolTable};

#[derive(Parser)]
#[grammar = "grammar.pest"]
struct ExprParser;

struct EvalCtx<'a> {
    labels: &'a LabelTable,
    symbols: &'a SymbolTable,
    line: usize,
}

/// Evaluates an operand expression to an integer, per the active
/// dialect's expression language. Label lookups see the label table's
/// pass-1 snapshot (zero for a not-yet-defined forward reference);
/// symbol lookups take precedence over label lookups of the same name,
/// matching the original tool's merge order.
pub fn evaluate(
    expr_str: &str,
    dialect: Dialect,
    labels: &LabelTable,
    symbols: &SymbolTable,
    line: usize,
) -> Result<i64, AssemblerError> {
    match dialect {
        Dialect::VcpAs => evaluate_bare(expr_str, labels, symbols, line),
        Dialect::Vcpas => evaluate_expression(expr_str, labels, symbols, line),
    }
}

/// The older dialect: a bare identifier (label or symbol) or an
/// integer literal. No operators, not even unary minus, mirroring
/// `vcp-as.py`'s `eval_expr`.
fn evaluate_bare(
    expr_str: &str,
    labels: &LabelTable,
    symbols: &SymbolTable,
    line: usize,
) -> Result<i64, AssemblerError> {
    let trimmed = expr_str.trim();
    if trimmed.is_empty() {
        return Err(AssemblerError::Expression {
            line,
            reason: "empty operand".to_string(),
        });
    }
    if let Some(value) = symbols.get(trimmed) {
        return Ok(*value);
    }
    if let Some(value) = labels.get(trimmed) {
        return Ok(*value);
    }
    match parse_int_literal(trimmed) {
        Some(value) => Ok(value),
        None if looks_like_identifier(trimmed) => Err(AssemblerError::UndefinedSymbol {
            line,
            name: trimmed.to_string(),
        }),
        None => Err(AssemblerError::Expression {
            line,
            reason: format!("malformed integer literal: {trimmed}"),
        }),
    }
}

fn evaluate_expression(
    expr_str: &str,
    labels: &LabelTable,
    symbols: &SymbolTable,
    line: usize,
) -> Result<i64, AssemblerError> {
    let mut parsed = ExprParser::parse(Rule::calculation, expr_str).map_err(|source| {
        AssemblerError::ExpressionSyntax {
            line,
            source: Box::new(source),
        }
    })?;

    let calculation = parsed.next().unwrap();
    let expr_pair = calculation.into_inner().next().unwrap();

    let ctx = EvalCtx { labels, symbols, line };
    let value = eval_expr_pair(expr_pair, &ctx)?;
    Ok(value.trunc() as i64)
}

fn pratt_parser() -> PrattParser<Rule> {
    PrattParser::new()
        .op(Op::infix(Rule::bor, Assoc::Left))
        .op(Op::infix(Rule::bxor, Assoc::Left))
        .op(Op::infix(Rule::band, Assoc::Left))
        .op(Op::infix(Rule::shl, Assoc::Left) | Op::infix(Rule::shr, Assoc::Left))
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left)
            | Op::infix(Rule::div, Assoc::Left)
            | Op::infix(Rule::rem, Assoc::Left))
        .op(Op::prefix(Rule::neg) | Op::prefix(Rule::bnot))
}

fn eval_expr_pair(pair: Pair<Rule>, ctx: &EvalCtx) -> Result<f64, AssemblerError> {
    pratt_parser()
        .map_primary(|primary| eval_primary(primary, ctx))
        .map_prefix(|op, rhs| {
            let rhs = rhs?;
            match op.as_rule() {
                Rule::neg => Ok(-rhs),
                Rule::bnot => Ok(!(rhs.trunc() as i64) as f64),
                other => unreachable!("unexpected prefix rule: {other:?}"),
            }
        })
        .map_infix(|lhs, op, rhs| {
            let lhs = lhs?;
            let rhs = rhs?;
            eval_infix(op.as_rule(), lhs, rhs, ctx.line)
        })
        .parse(pair.into_inner())
}

fn eval_infix(rule: Rule, lhs: f64, rhs: f64, line: usize) -> Result<f64, AssemblerError> {
    match rule {
        Rule::add => Ok(lhs + rhs),
        Rule::sub => Ok(lhs - rhs),
        Rule::mul => Ok(lhs * rhs),
        Rule::div => {
            if rhs == 0.0 {
                Err(AssemblerError::Expression {
                    line,
                    reason: "division by zero".to_string(),
                })
            } else {
                Ok(lhs / rhs)
            }
        }
        Rule::rem => {
            if rhs == 0.0 {
                Err(AssemblerError::Expression {
                    line,
                    reason: "division by zero".to_string(),
                })
            } else {
                Ok(lhs % rhs)
            }
        }
        Rule::shl => Ok((int(lhs) << (int(rhs) & 63)) as f64),
        Rule::shr => Ok((int(lhs) >> (int(rhs) & 63)) as f64),
        Rule::band => Ok((int(lhs) & int(rhs)) as f64),
        Rule::bor => Ok((int(lhs) | int(rhs)) as f64),
        Rule::bxor => Ok((int(lhs) ^ int(rhs)) as f64),
        other => unreachable!("unexpected infix rule: {other:?}"),
    }
}

fn int(v: f64) -> i64 {
    v.trunc() as i64
}

fn eval_primary(pair: Pair<Rule>, ctx: &EvalCtx) -> Result<f64, AssemblerError> {
    match pair.as_rule() {
        Rule::expr => eval_expr_pair(pair, ctx),
        Rule::number => {
            let value = parse_int_literal(pair.as_str()).ok_or_else(|| AssemblerError::Expression {
                line: ctx.line,
                reason: format!("malformed integer literal: {}", pair.as_str()),
            })?;
            Ok(value as f64)
        }
        Rule::ident => {
            let name = pair.as_str();
            if let Some(value) = ctx.symbols.get(name) {
                Ok(*value as f64)
            } else if let Some(value) = ctx.labels.get(name) {
                Ok(*value as f64)
            } else {
                Err(AssemblerError::UndefinedSymbol {
                    line: ctx.line,
                    name: name.to_string(),
                })
            }
        }
        Rule::func_call => {
            let mut inner = pair.into_inner();
            let name = inner.next().unwrap().as_str().to_string();
            let arg_expr = inner.next().unwrap();
            let arg = eval_expr_pair(arg_expr, ctx)?;
            match name.as_str() {
                "sin" => Ok(arg.sin()),
                "cos" => Ok(arg.cos()),
                other => Err(AssemblerError::UndefinedSymbol {
                    line: ctx.line,
                    name: other.to_string(),
                }),
            }
        }
        other => unreachable!("unexpected primary rule: {other:?}"),
    }
}

fn looks_like_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Parses an integer literal in any of the four base prefixes, with an
/// optional leading sign, matching both dialects' literal syntax.
fn parse_int_literal(s: &str) -> Option<i64> {
    let (neg, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let value = if let Some(digits) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i64::from_str_radix(digits, 16).ok()?
    } else if let Some(digits) = rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")) {
        i64::from_str_radix(digits, 8).ok()?
    } else if let Some(digits) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        i64::from_str_radix(digits, 2).ok()?
    } else {
        if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        rest.parse::<i64>().ok()?
    };

    Some(if neg { -value } else { value })
}
