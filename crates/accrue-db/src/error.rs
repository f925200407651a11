//! Error types for accrue-db.

use miette::Diagnostic;
use thiserror::Error;

/// Database error type for accrue-db operations.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error(transparent)]
    #[diagnostic(
        code(accrue_db::sqlite),
        help("The statement was rejected by SQLite; check the schema and the supplied values")
    )]
    Sqlite(#[from] rusqlite::Error),

    #[error("Model configuration error: {0}")]
    #[diagnostic(
        code(accrue_db::configuration),
        help("Register the model in the container before building a repository for it")
    )]
    Configuration(String),

    #[error("No query results for model [{model}]{}", key_suffix(.key))]
    #[diagnostic(code(accrue_db::not_found))]
    NotFound {
        model: String,
        key: Option<String>,
    },

    #[error("Invalid identifier: `{0}`")]
    #[diagnostic(
        code(accrue_db::invalid_identifier),
        help("Identifiers must look like `column` or `table.column` (letters, digits, underscores)")
    )]
    InvalidIdentifier(String),

    #[error("Invalid operator: `{0}`")]
    #[diagnostic(
        code(accrue_db::invalid_operator),
        help("Supported operators: =, !=, <>, <, <=, >, >=, like, not like")
    )]
    InvalidOperator(String),

    #[error("Invalid sort direction: `{0}`")]
    #[diagnostic(code(accrue_db::invalid_direction), help("Use `asc` or `desc`"))]
    InvalidDirection(String),

    #[error("Invalid pagination: {0}")]
    #[diagnostic(code(accrue_db::invalid_pagination))]
    InvalidPagination(String),

    #[error("Call to undefined relationship [{relation}] on model [{model}]")]
    #[diagnostic(
        code(accrue_db::unknown_relation),
        help("Declare the relation on the model definition")
    )]
    UnknownRelation {
        model: String,
        relation: String,
    },

    #[error("Call to undefined scope [{scope}] on model [{model}]")]
    #[diagnostic(
        code(accrue_db::unknown_scope),
        help("Register the scope on the model definition")
    )]
    UnknownScope {
        model: String,
        scope: String,
    },

    #[error("Invalid arguments for scope [{scope}]: {reason}")]
    #[diagnostic(code(accrue_db::scope_arguments))]
    ScopeArguments {
        scope: String,
        reason: String,
    },

    #[error("Database connection lock poisoned")]
    #[diagnostic(
        code(accrue_db::poison),
        help("A previous operation panicked while holding the connection")
    )]
    Poisoned,
}

fn key_suffix(key: &Option<String>) -> String {
    key.as_ref().map(|k| format!(" {k}")).unwrap_or_default()
}

impl DbError {
    pub fn not_found(model: impl Into<String>) -> Self {
        Self::NotFound {
            model: model.into(),
            key: None,
        }
    }

    pub fn not_found_key(model: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            model: model.into(),
            key: Some(key.into()),
        }
    }

    /// Returns true for required single-row lookups that matched nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for accrue-db operations.
pub type Result<T> = std::result::Result<T, DbError>;
