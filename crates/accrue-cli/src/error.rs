//! Error types for the accrue binary.

use accrue_config::ConfigError;
use accrue_db::DbError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(code(accrue::json))]
    Json(#[from] serde_json::Error),

    #[error("Invalid filter `{0}`")]
    #[diagnostic(
        code(accrue::invalid_filter),
        help("Write filters as `column<op>value`, e.g. `age>=18`, or `column like pattern`")
    )]
    InvalidFilter(String),

    #[error("Invalid assignment `{0}`")]
    #[diagnostic(
        code(accrue::invalid_assignment),
        help("Write values as `column=value`; `--where-in` takes `column=a,b,c`")
    )]
    InvalidAssignment(String),

    #[error("No database to open")]
    #[diagnostic(
        code(accrue::no_database),
        help("Pass --db <path> or set `database` in the configuration file")
    )]
    NoDatabase,
}

pub type CliResult<T> = std::result::Result<T, CliError>;
