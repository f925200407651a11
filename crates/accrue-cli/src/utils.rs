use std::{
    fmt::Display,
    sync::atomic::{AtomicBool, Ordering},
};

use accrue_db::Value;
use nu_ansi_term::Color;

use crate::error::{CliError, CliResult};

pub static COLOR: AtomicBool = AtomicBool::new(true);

pub fn set_color(enabled: bool) {
    COLOR.store(enabled, Ordering::Relaxed);
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if COLOR.load(Ordering::Relaxed) {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

/// Parses a command-line value: integer, then real, then `null`, else text.
pub fn parse_value(input: &str) -> Value {
    if let Ok(i) = input.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = input.parse::<f64>() {
        if f.is_finite() {
            return Value::Real(f);
        }
    }
    if input.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    Value::Text(input.to_string())
}

/// A parsed `--where` flag.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterArg {
    pub column: String,
    pub operator: String,
    pub value: Value,
}

const SYMBOL_OPERATORS: [&str; 8] = ["==", ">=", "<=", "!=", "<>", "=", ">", "<"];
const WORD_OPERATORS: [&str; 2] = [" not like ", " like "];

/// Parses `column<op>value` or `column like pattern`.
///
/// Whichever operator appears first splits the input, so values may contain
/// operators themselves.
pub fn parse_filter(input: &str) -> CliResult<FilterArg> {
    let invalid = || CliError::InvalidFilter(input.to_string());
    let symbol_at = input.find(|c| matches!(c, '<' | '>' | '=' | '!'));

    let lower = input.to_ascii_lowercase();
    for word in WORD_OPERATORS {
        let Some(idx) = lower.find(word) else {
            continue;
        };
        if symbol_at.is_some_and(|at| at < idx) {
            continue;
        }
        let column = input[..idx].trim();
        if column.is_empty() {
            return Err(invalid());
        }
        return Ok(FilterArg {
            column: column.to_string(),
            operator: word.trim().to_string(),
            value: Value::Text(input[idx + word.len()..].to_string()),
        });
    }

    let idx = symbol_at.ok_or_else(invalid)?;
    let rest = &input[idx..];
    let operator = SYMBOL_OPERATORS
        .into_iter()
        .find(|op| rest.starts_with(op))
        .ok_or_else(invalid)?;

    let column = input[..idx].trim();
    if column.is_empty() {
        return Err(invalid());
    }

    Ok(FilterArg {
        column: column.to_string(),
        operator: operator.to_string(),
        value: parse_value(rest[operator.len()..].trim()),
    })
}

/// Parses `column=value`.
pub fn parse_assignment(input: &str) -> CliResult<(String, Value)> {
    match input.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), parse_value(value)))
        }
        _ => Err(CliError::InvalidAssignment(input.to_string())),
    }
}

/// Parses `column=a,b,c`.
pub fn parse_set_membership(input: &str) -> CliResult<(String, Vec<Value>)> {
    match input.split_once('=') {
        Some((column, values)) if !column.trim().is_empty() => {
            let values = values
                .split(',')
                .filter(|v| !v.is_empty())
                .map(parse_value)
                .collect();
            Ok((column.trim().to_string(), values))
        }
        _ => Err(CliError::InvalidAssignment(input.to_string())),
    }
}

/// Parses `column` or `column:direction`.
pub fn parse_ordering(input: &str) -> (&str, &str) {
    input.split_once(':').unwrap_or((input, "asc"))
}
