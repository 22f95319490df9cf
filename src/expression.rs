//! Typed time-bound expressions.
//!
//! Variable documents bound their time windows with numbers, `"Infinity"`,
//! names of variables resolved earlier in the same document, or simple
//! arithmetic over those (`"kickoff + 45 * 60"`). Expressions are parsed
//! with the grammar in `expression.pest` and evaluated by looking names up
//! in a [`Scope`]. Nothing is ever executed.
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use serde_json::Value;

use std::fmt;
use std::str::FromStr;

use crate::error::{AnglesError, Result};

#[derive(Parser)]
#[grammar = "expression.pest"]
pub struct ExpressionParser;

/// Where references are looked up during evaluation.
pub trait Scope {
    fn number(&self, name: &str) -> Result<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimeExpr {
    Literal(f64),
    Infinity,
    Reference(String),
    Negate(Box<TimeExpr>),
    Binary(Box<TimeExpr>, Op, Box<TimeExpr>),
}

fn parse_error(message: impl Into<String>) -> AnglesError {
    AnglesError::Parse { message: message.into(), line: None, col: None }
}

fn build(pair: Pair<Rule>) -> Result<TimeExpr> {
    match pair.as_rule() {
        Rule::sum | Rule::product => {
            let mut inner = pair.into_inner();
            let first = inner.next().ok_or_else(|| parse_error("empty expression"))?;
            let mut expr = build(first)?;
            while let Some(op) = inner.next() {
                let op = match op.as_str() {
                    "+" => Op::Add,
                    "-" => Op::Sub,
                    "*" => Op::Mul,
                    "/" => Op::Div,
                    other => return Err(parse_error(format!("unknown operator {other}"))),
                };
                let rhs = inner.next().ok_or_else(|| parse_error("missing operand"))?;
                expr = TimeExpr::Binary(Box::new(expr), op, Box::new(build(rhs)?));
            }
            Ok(expr)
        }
        Rule::number => pair
            .as_str()
            .parse::<f64>()
            .map(TimeExpr::Literal)
            .map_err(|e| parse_error(format!("{}: {e}", pair.as_str()))),
        Rule::infinity => Ok(TimeExpr::Infinity),
        Rule::negation => {
            let operand = pair
                .into_inner()
                .next()
                .ok_or_else(|| parse_error("missing operand"))?;
            Ok(TimeExpr::Negate(Box::new(build(operand)?)))
        }
        Rule::reference => Ok(TimeExpr::Reference(pair.as_str().to_owned())),
        other => Err(parse_error(format!("unexpected {other:?}"))),
    }
}

impl FromStr for TimeExpr {
    type Err = AnglesError;

    fn from_str(s: &str) -> Result<Self> {
        let expression = ExpressionParser::parse(Rule::expression, s)?
            .next()
            .ok_or_else(|| parse_error("empty expression"))?;
        let sum = expression
            .into_inner()
            .next()
            .ok_or_else(|| parse_error("empty expression"))?;
        build(sum)
    }
}

impl TimeExpr {
    /// Reads a bound from a document slot. Absent, `null`, `0`, `false` and
    /// `""` all fall back to `default`.
    pub fn from_slot(slot: Option<&Value>, default: TimeExpr) -> Result<Self> {
        match slot {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(default),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v == 0.0 => Ok(default),
                Some(v) => Ok(Self::Literal(v)),
                None => Err(parse_error(format!("unrepresentable number {n}"))),
            },
            Some(Value::String(s)) if s.trim().is_empty() => Ok(default),
            Some(Value::String(s)) => s.parse(),
            Some(other) => Err(parse_error(format!("time bound must be a number or expression, found {other}"))),
        }
    }

    pub fn evaluate<S: Scope + ?Sized>(&self, scope: &S) -> Result<f64> {
        Ok(match self {
            Self::Literal(v) => *v,
            Self::Infinity => f64::INFINITY,
            Self::Reference(name) => scope.number(name)?,
            Self::Negate(operand) => -operand.evaluate(scope)?,
            Self::Binary(lhs, op, rhs) => {
                let (l, r) = (lhs.evaluate(scope)?, rhs.evaluate(scope)?);
                match op {
                    Op::Add => l + r,
                    Op::Sub => l - r,
                    Op::Mul => l * r,
                    Op::Div => l / r,
                }
            }
        })
    }
}

impl fmt::Display for TimeExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "{v}"),
            Self::Infinity => write!(f, "Infinity"),
            Self::Reference(name) => write!(f, "{name}"),
            Self::Negate(operand) => write!(f, "-{operand}"),
            Self::Binary(lhs, op, rhs) => {
                let op = match op {
                    Op::Add => "+",
                    Op::Sub => "-",
                    Op::Mul => "*",
                    Op::Div => "/",
                };
                write!(f, "({lhs} {op} {rhs})")
            }
        }
    }
}
