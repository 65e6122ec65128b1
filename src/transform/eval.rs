//! Condition expression evaluators
//!
//! Two deliberately separate grammars, matching the two mapping rule paths:
//!
//! - [`SimpleEvaluator`]: exactly one of `=`, `<`, `>` per expression, used
//!   by positional mapping conditions.
//! - [`ExtendedEvaluator`]: `||` of `&&`-joined clauses with optional `!`
//!   negation and seven comparison operators, used by enhanced mappings.
//!
//! Evaluation is pure: no side effects, deterministic for a given record.
//! Structural parse failures surface as errors and the transformation engine
//! applies the degrade-to-false policy. Numeric coercion failures are
//! clause-local: the clause is false and sibling OR branches still evaluate.

use crate::error::{Error, Result};
use crate::types::{field_to_string, lookup_field, Record};
use once_cell::sync::Lazy;
use regex::Regex;

/// A strategy evaluating one boolean condition string against a record
pub trait ConditionEvaluator: Send + Sync {
    /// Evaluate `expr` against `record`
    fn evaluate(&self, expr: &str, record: &Record) -> Result<bool>;
}

// ============================================================================
// Simple Evaluator
// ============================================================================

/// Single-operator grammar: `FIELD = 'value'`, `AMT > 100`, `AGE < 65`
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleEvaluator;

impl SimpleEvaluator {
    /// Create a new simple evaluator
    pub fn new() -> Self {
        Self
    }
}

impl ConditionEvaluator for SimpleEvaluator {
    fn evaluate(&self, expr: &str, record: &Record) -> Result<bool> {
        let (field, op, literal) = split_single_operator(expr)?;
        let field_value = lookup_field(record, field).map(field_to_string);

        match op {
            '=' => Ok(field_value.as_deref() == Some(literal)),
            '<' | '>' => {
                let left = field_value
                    .as_deref()
                    .unwrap_or("")
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| {
                        Error::expression(format!("non-numeric field value for '{expr}'"))
                    })?;
                let right = literal.trim().parse::<f64>().map_err(|_| {
                    Error::expression(format!("non-numeric literal in '{expr}'"))
                })?;
                Ok(if op == '<' { left < right } else { left > right })
            }
            _ => unreachable!("split_single_operator only yields =, <, >"),
        }
    }
}

/// Split an expression around its single `=`/`<`/`>` operator
fn split_single_operator(expr: &str) -> Result<(&str, char, &str)> {
    let position = expr
        .find(['=', '<', '>'])
        .ok_or_else(|| Error::expression(format!("no operator in '{expr}'")))?;
    let op = expr.as_bytes()[position] as char;

    let field = expr[..position].trim();
    let literal = strip_quotes(expr[position + 1..].trim());

    if field.is_empty() {
        return Err(Error::expression(format!("missing field in '{expr}'")));
    }
    Ok((field, op, literal))
}

// ============================================================================
// Extended Evaluator
// ============================================================================

/// Extended boolean grammar: OR (`||`) of AND-joined (`&&`) clauses, each an
/// optionally negated `field op value` triple.
///
/// Operators: `=`, `==`, `!=`, `<`, `>`, `<=`, `>=`. String literals may be
/// bare, single-, or double-quoted. The bare literal `null` turns `=`/`!=`
/// into a presence test. A numeric operator over a value that does not parse
/// as a number makes that clause false without failing the expression.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendedEvaluator;

static CLAUSE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<field>[A-Za-z_][A-Za-z0-9_.\-]*)\s*(?P<op>==|!=|<=|>=|=|<|>)\s*(?P<value>.+?)\s*$")
        .expect("clause regex is valid")
});

impl ExtendedEvaluator {
    /// Create a new extended evaluator
    pub fn new() -> Self {
        Self
    }

    fn evaluate_clause(&self, clause: &str, record: &Record) -> Result<bool> {
        let clause = clause.trim();

        // A leading `!` negates the whole clause. `!=` inside the clause is
        // untouched because negation must precede the field name.
        let (negated, clause) = match clause.strip_prefix('!') {
            Some(rest) if !rest.trim_start().starts_with('=') => (true, rest.trim_start()),
            _ => (false, clause),
        };

        let captures = CLAUSE_REGEX
            .captures(clause)
            .ok_or_else(|| Error::expression(format!("unparseable clause '{clause}'")))?;

        let field = &captures["field"];
        let op = &captures["op"];
        let literal = strip_quotes(captures["value"].trim());

        let result = self.compare(record, field, op, literal)?;
        Ok(if negated { !result } else { result })
    }

    fn compare(&self, record: &Record, field: &str, op: &str, literal: &str) -> Result<bool> {
        let field_value = lookup_field(record, field);

        // `null` is a presence/absence test for equality operators.
        if literal == "null" {
            let is_null = matches!(field_value, None | Some(serde_json::Value::Null));
            return match op {
                "=" | "==" => Ok(is_null),
                "!=" => Ok(!is_null),
                _ => Err(Error::expression(format!(
                    "operator '{op}' not valid with null literal"
                ))),
            };
        }

        let actual = field_value.map(field_to_string);
        match op {
            "=" | "==" => Ok(actual.as_deref() == Some(literal)),
            "!=" => Ok(actual.as_deref() != Some(literal)),
            "<" | ">" | "<=" | ">=" => {
                // A numeric comparison over a non-numeric value is false for
                // this clause only; a sibling OR branch can still match.
                let Ok(left) = actual.as_deref().unwrap_or("").trim().parse::<f64>() else {
                    tracing::debug!(field, op, "non-numeric field value, clause is false");
                    return Ok(false);
                };
                let Ok(right) = literal.trim().parse::<f64>() else {
                    tracing::debug!(literal, op, "non-numeric literal, clause is false");
                    return Ok(false);
                };
                Ok(match op {
                    "<" => left < right,
                    ">" => left > right,
                    "<=" => left <= right,
                    _ => left >= right,
                })
            }
            _ => Err(Error::expression(format!("unknown operator '{op}'"))),
        }
    }
}

impl ConditionEvaluator for ExtendedEvaluator {
    fn evaluate(&self, expr: &str, record: &Record) -> Result<bool> {
        // OR of ANDs; short-circuit both levels.
        for or_branch in expr.split("||") {
            let mut all = true;
            for clause in or_branch.split("&&") {
                if !self.evaluate_clause(clause, record)? {
                    all = false;
                    break;
                }
            }
            if all {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Strip one matching pair of single or double quotes
fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' && last == b'\'') || (first == b'"' && last == b'"') {
            return &value[1..value.len() - 1];
        }
    }
    value
}
