use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(accrue_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(accrue_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists")]
    #[diagnostic(
        code(accrue_config::already_exists),
        help("Remove the existing config file or use a different location")
    )]
    ConfigAlreadyExists,

    #[error("Invalid page size: {0}")]
    #[diagnostic(
        code(accrue_config::invalid_per_page),
        help("pagination.per_page must be at least 1")
    )]
    InvalidPerPage(u64),

    #[error("Invalid page parameter name: `{0}`")]
    #[diagnostic(
        code(accrue_config::invalid_page_name),
        help("Use a non-empty name made of letters, digits, `_` or `-`")
    )]
    InvalidPageName(String),

    #[error("Invalid log level: `{0}`")]
    #[diagnostic(
        code(accrue_config::invalid_log_level),
        help("Use one of: error, warn, info, debug, trace")
    )]
    InvalidLogLevel(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(accrue_config::io))]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
