//! Validation of caller-supplied SQL fragments.
//!
//! Column names, operators and sort directions arrive as strings from the
//! repository's fluent API. They are spliced into SQL text, so each one is
//! parsed into a closed type before it reaches a statement.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use rusqlite::types::Value;

use crate::{
    error::{DbError, Result},
    traits::Expression,
};

static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .expect("identifier pattern is valid")
});

/// A validated `column` or `table.column` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if IDENT_RE.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(DbError::InvalidIdentifier(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Column part of a possibly qualified identifier.
    pub fn column(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Expression for Ident {
    fn to_sql(&self, _params: &mut Vec<Value>) -> String {
        self.0.clone()
    }
}

/// Comparison operator of a `where` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
}

impl Operator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
        }
    }
}

impl FromStr for Operator {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();
        match normalized.as_str() {
            "=" | "==" => Ok(Self::Eq),
            "!=" | "<>" => Ok(Self::Ne),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Lte),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Gte),
            "like" => Ok(Self::Like),
            "not like" => Ok(Self::NotLike),
            _ => Err(DbError::InvalidOperator(s.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Sort direction of an `order by` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(DbError::InvalidDirection(s.to_string())),
        }
    }
}
